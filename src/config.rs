//! # Config モジュール
//!
//! `qtui2pyi.toml` の解析とデフォルト値の提供を行う。
//! 設定ファイルは任意で、無ければ全てデフォルト値になる。
//! CLI フラグは常に設定ファイルより優先される。
//!
//! ## 対応セクション
//! - `[defaults]`: 生成デフォルト（package, star_imports, python）
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QtuiError, QtuiResult};

/// qtui2pyi.toml のトップレベル構造
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

/// [defaults] セクション
#[derive(Debug, Clone, Deserialize)]
pub struct Defaults {
    /// Qt バインディングのパッケージ名（デフォルト: "PySide6"）
    #[serde(default = "default_package")]
    pub package: String,
    /// 選択的 import の代わりにスター import を使う（デフォルト: false）
    #[serde(default)]
    pub star_imports: bool,
    /// イントロスペクションに使う Python インタプリタ（デフォルト: "python3"）
    #[serde(default = "default_python")]
    pub python: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            package: default_package(),
            star_imports: false,
            python: default_python(),
        }
    }
}

fn default_package() -> String {
    "PySide6".to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

/// 指定パスの qtui2pyi.toml を読み込んでパースする
pub fn load(path: &Path) -> QtuiResult<Config> {
    let content =
        fs::read_to_string(path).map_err(|e| QtuiError::Io(path.to_path_buf(), e))?;
    let config: Config = toml::from_str(&content).map_err(|e| {
        QtuiError::Config(format!("parse error in '{}': {}", path.display(), e))
    })?;
    Ok(config)
}

/// 作業ディレクトリから上方向に qtui2pyi.toml を探索して読み込む。
/// 見つからなければデフォルト設定を返す。壊れた設定ファイルはエラー
pub fn find_and_load(start_dir: &Path) -> QtuiResult<Config> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let config_path = dir.join("qtui2pyi.toml");
        if config_path.exists() {
            return load(&config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    Ok(Config::default())
}
