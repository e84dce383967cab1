//! # Error モジュール
//!
//! ツール全体で共有するエラー型。ユーザー向けの 3 種類
//! （壊れた ui ファイル / 未知のクラス / 重複した widget 名）と、
//! イントロスペクション失敗・IO 失敗を区別する。
//! 想定外の失敗はそのまま伝播させ、リトライは行わない（全操作がローカルで決定的）。
use std::path::PathBuf;

pub type QtuiResult<T> = Result<T, QtuiError>;

#[derive(Debug)]
pub enum QtuiError {
    /// XML が well-formed でない、または期待するルート構造（<ui><widget>）が無い
    MalformedLayout(String),
    /// Qt パッケージのどのモジュールにも存在しないクラス名
    UnknownClass(String),
    /// ファイル内で同じ name を持つ要素が複数ある
    DuplicateName(String),
    /// Python インタプリタによる Qt パッケージのイントロスペクション失敗
    Introspection(String),
    /// qtui2pyi.toml が壊れている
    Config(String),
    /// ファイルの読み書き失敗
    Io(PathBuf, std::io::Error),
}

impl std::fmt::Display for QtuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QtuiError::MalformedLayout(msg) => write!(f, "Malformed ui file: {}", msg),
            QtuiError::UnknownClass(name) => write!(f, "Unknown class(es): {}", name),
            QtuiError::DuplicateName(name) => {
                write!(f, "Duplicate element name in file: {}", name)
            }
            QtuiError::Introspection(msg) => write!(f, "Qt introspection failed: {}", msg),
            QtuiError::Config(msg) => write!(f, "Invalid config: {}", msg),
            QtuiError::Io(path, e) => write!(f, "Cannot access '{}': {}", path.display(), e),
        }
    }
}

impl std::error::Error for QtuiError {}
