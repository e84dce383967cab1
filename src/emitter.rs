//! # Emitter モジュール
//!
//! 解決済みの widget ツリーから pyi スタブのテキストを生成する。
//!
//! 出力の構成:
//! ```text
//! # PYI generated by qtui2pyi from 'Main.ui' [mtime:1693000000]
//! # Suitable for 'Main.py': Must contain the class Main(QMainWindow)
//! from PySide6.QtWidgets import QMainWindow, QPushButton
//!
//! class Main(QMainWindow):
//!     pushButton: QPushButton
//! ```
//!
//! ヘッダには壁時計は入れない: 入力とツールキットバージョンが同じなら
//! 出力はバイト単位で一致する（mtime はソースファイル側の値）。
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{QtuiError, QtuiResult};
use crate::parser::UiDocument;
use crate::resolver::TypeResolver;

/// pyi のインデント。変えたい人は変わっている
const INDENT: &str = "    ";

/// スタブ生成の入力パラメータ
pub struct StubOptions<'a> {
    /// 元になった ui ファイルのパス（ヘッダ用）
    pub source_path: &'a Path,
    /// ソースの mtime（UNIX 秒、ヘッダ用）
    pub source_mtime_secs: u64,
    /// 出力先ファイル。None なら stdout（パイプモード）
    pub output_file: Option<&'a Path>,
    /// 選択的 import の代わりにスター import を使う
    pub star_imports: bool,
}

/// スタブを生成して out に書き込む
pub fn emit_stub<W: Write>(
    doc: &UiDocument,
    resolver: &TypeResolver,
    opts: &StubOptions,
    out: &mut W,
) -> QtuiResult<()> {
    let stub = render_stub(doc, resolver, opts)?;
    out.write_all(stub.as_bytes()).map_err(|e| {
        let dest = opts
            .output_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("<stdout>"));
        QtuiError::Io(dest, e)
    })
}

/// スタブ全体を文字列として生成する
pub fn render_stub(
    doc: &UiDocument,
    resolver: &TypeResolver,
    opts: &StubOptions,
) -> QtuiResult<String> {
    // 名前付き要素を文書順で収集（重複チェック込み）
    let elements = named_elements(doc)?;

    let top_name = doc.top.name.as_str();
    let top_class = doc.top.class_name.as_str();

    let mut stub = String::new();

    // --- ヘッダ ---
    stub.push_str(&format!(
        "# PYI generated by qtui2pyi from '{}' [mtime:{}]\n",
        opts.source_path.display(),
        opts.source_mtime_secs
    ));
    match opts.output_file {
        Some(out_file) => {
            let stem = out_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            stub.push_str(&format!("# Suitable for '{}.py':", stem));
        }
        None => {
            stub.push_str("# Pipe mode: pyi file should have the same stem name as the py file.");
        }
    }
    stub.push_str(&format!(
        " Must contain the class {}({})\n",
        top_name, top_class
    ));

    // --- import セクション ---
    // トップ widget のクラスも import 対象に入る
    let classes: BTreeSet<String> = elements
        .iter()
        .map(|(_, class)| class.to_string())
        .chain(std::iter::once(top_class.to_string()))
        .collect();
    for line in resolver.import_lines(&classes, opts.star_imports)? {
        stub.push_str(&line);
        stub.push('\n');
    }

    // --- クラス本体 ---
    stub.push_str(&format!("\nclass {}({}):\n", top_name, top_class));
    let attributes: Vec<&(String, String)> = elements
        .iter()
        .filter(|(name, _)| name.as_str() != top_name)
        .collect();
    if attributes.is_empty() {
        stub.push_str(INDENT);
        stub.push_str("pass\n");
    } else {
        for (name, class) in attributes {
            stub.push_str(&format!("{}{}: {}\n", INDENT, name, class));
        }
    }

    Ok(stub)
}

/// 名前付きノードを (name, class) の文書順リストにする。
/// 名前無しはスタブから個別参照できないので除外する。
/// 同じ名前が 2 回現れたら DuplicateName（ファイル全体で 1 つの名前空間）
fn named_elements(doc: &UiDocument) -> QtuiResult<Vec<(String, String)>> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::new();
    for node in doc.all_nodes() {
        if node.name.is_empty() {
            continue;
        }
        if !seen.insert(node.name.as_str()) {
            return Err(QtuiError::DuplicateName(node.name.clone()));
        }
        out.push((node.name.clone(), node.class_name.clone()));
    }
    Ok(out)
}
