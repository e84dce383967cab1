//! # Resolver モジュール
//!
//! widget のクラス名（"QPushButton" 等）を、Qt バインディングの
//! どのサブモジュールが公開しているか（"PySide6.QtWidgets" 等）に解決する。
//!
//! ## 設計方針
//! - 解決はバージョン単位のクラスキャッシュ ([`crate::cache`]) 越しに行う
//! - キャッシュミス時のみ、Python インタプリタを起動して
//!   対象パッケージのサブモジュールをイントロスペクションする
//! - `dir()` の結果から `^Q[A-Z][^.]*$` にマッチする属性だけをクラス候補とみなす
//!
//! インタプリタは `QTUI2PYI_PYTHON` 環境変数 > qtui2pyi.toml の `python` >
//! `python3` の優先順で選択される（選択自体は呼び出し側の責務）。
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::process::Command as Cmd;

use crate::cache::{self, ClassCache, MODULES};
use crate::error::{QtuiError, QtuiResult};

/// 解決済みの 1 クラス。解決後は不変
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    /// インポート元モジュールパス（例: "PySide6.QtWidgets"）
    pub import_path: String,
    /// クラス名（例: "QPushButton"）
    pub class_name: String,
}

/// 1 つの Qt パッケージ（+ 検出済みバージョン）に対するリゾルバ
pub struct TypeResolver {
    package: String,
    version: String,
    cache: ClassCache,
}

impl TypeResolver {
    /// パッケージのバージョンを検出し、キャッシュを読み込む（無ければ構築する）。
    /// refresh_cache が true の場合は既存キャッシュを無視して作り直す。
    pub fn new(package: &str, python: &str, refresh_cache: bool) -> QtuiResult<Self> {
        let version = detect_qt_version(python, package)?;
        let cache_path = cache::cache_file(&cache::cache_dir(), package, &version);

        let class_cache = if refresh_cache {
            None
        } else {
            cache::load(&cache_path)
        };

        let class_cache = match class_cache {
            Some(c) => c,
            None => {
                let c = introspect_modules(python, package)?;
                cache::save(&cache_path, &c);
                c
            }
        };

        Ok(Self {
            package: package.to_string(),
            version,
            cache: class_cache,
        })
    }

    /// 構築済みキャッシュから直接リゾルバを作る（イントロスペクションなし）
    pub fn from_cache(package: &str, version: &str, cache: ClassCache) -> Self {
        Self {
            package: package.to_string(),
            version: version.to_string(),
            cache,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// クラス名を ClassRecord に解決する。どのサブモジュールにも無ければ UnknownClass
    pub fn resolve(&self, class_name: &str) -> QtuiResult<ClassRecord> {
        match self.cache.lookup(class_name) {
            Some(module) => Ok(ClassRecord {
                import_path: format!("{}.{}", self.package, module),
                class_name: class_name.to_string(),
            }),
            None => Err(QtuiError::UnknownClass(class_name.to_string())),
        }
    }

    /// import 行を生成する。
    /// 選択的モード: `from PySide6.QtWidgets import QLabel, QWidget`
    /// （サブモジュールごとにまとめ、クラス名はソート済み）。
    /// スターモード: `from PySide6.QtWidgets import *`（解決は行わない）。
    pub fn import_lines(
        &self,
        classes: &BTreeSet<String>,
        star_imports: bool,
    ) -> QtuiResult<Vec<String>> {
        let mut lines = Vec::new();

        if star_imports {
            for m in MODULES {
                lines.push(format!("from {}.{} import *", self.package, m));
            }
            return Ok(lines);
        }

        // クラスごとに解決し、インポート元モジュールでまとめる。
        // BTreeSet なのでモジュール内のクラス名はソート済み
        let mut by_module: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for class in classes {
            let record = self.resolve(class)?;
            by_module
                .entry(record.import_path)
                .or_default()
                .push(class.as_str());
        }

        for m in MODULES {
            let import_path = format!("{}.{}", self.package, m);
            if let Some(matched) = by_module.get(&import_path) {
                lines.push(format!("from {} import {}", import_path, matched.join(", ")));
            }
        }
        Ok(lines)
    }
}

// =============================================================================
// Python インタプリタによるイントロスペクション
// =============================================================================

/// Qt クラスとみなす属性名: Q + 大文字で始まり、ドットを含まない
const RE_RELEVANT_ATTRIBUTE: &str = r"^Q[A-Z][^.]*$";

/// `python -c <code>` を実行して標準出力を返す
fn run_python(python: &str, code: &str) -> QtuiResult<String> {
    let output = Cmd::new(python).arg("-c").arg(code).output().map_err(|e| {
        QtuiError::Introspection(format!("cannot run interpreter '{}': {}", python, e))
    })?;

    if !output.status.success() {
        return Err(QtuiError::Introspection(format!(
            "'{}' failed ({}): {}",
            python,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// 選択されたパッケージの Qt バージョンを検出する。
/// `__version__` → `QT_VERSION_STR` → "unknown" の順で試す
fn detect_qt_version(python: &str, package: &str) -> QtuiResult<String> {
    let code = format!(
        "import importlib\n\
         m = importlib.import_module('{}.QtCore')\n\
         print(getattr(m, '__version__', None) or getattr(m, 'QT_VERSION_STR', None) or 'unknown')",
        package
    );
    let version = run_python(python, &code)?;
    if version.is_empty() {
        return Err(QtuiError::Introspection(format!(
            "could not detect version of '{}'",
            package
        )));
    }
    Ok(version)
}

/// 全サブモジュールの dir() を JSON でダンプさせ、Qt クラス名だけを残す
fn introspect_modules(python: &str, package: &str) -> QtuiResult<ClassCache> {
    let code = format!(
        "import importlib, json\n\
         out = {{}}\n\
         for m in {:?}:\n\
         \x20   out[m] = dir(importlib.import_module('{}.' + m))\n\
         print(json.dumps(out))",
        MODULES, package
    );
    let stdout = run_python(python, &code)?;

    let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(&stdout).map_err(|e| {
        QtuiError::Introspection(format!("unexpected introspection output: {}", e))
    })?;

    let relevant = Regex::new(RE_RELEVANT_ATTRIBUTE).unwrap();
    let mut modules = BTreeMap::new();
    for (module, attrs) in raw {
        let mut classes: Vec<String> = attrs
            .into_iter()
            .filter(|a| relevant.is_match(a))
            .collect();
        classes.sort();
        modules.insert(module, classes);
    }
    Ok(ClassCache { modules })
}
