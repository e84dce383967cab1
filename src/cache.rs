//! # Cache モジュール
//!
//! Qt パッケージごとのクラスキャッシュ
//! (`~/.cache/qtui2pyi/<package>/<version>_QtCore_QtGui_QtWidgets.json`) の管理。
//! 全サブモジュールのイントロスペクションは高価なので、
//! パッケージ名とバージョンをキーに結果をディスクに永続化する。
//!
//! キャッシュはバージョン単位で無効化される: バージョンが変わると
//! ファイル名も変わるため、古いキャッシュは単に読まれなくなる。
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// スタブ生成に関係する Qt サブモジュール
pub const MODULES: [&str; 3] = ["QtCore", "QtGui", "QtWidgets"];

/// 1 つの (パッケージ, バージョン) に対するクラスキャッシュ
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassCache {
    /// サブモジュール名 → 公開クラス名のソート済みリスト
    pub modules: BTreeMap<String, Vec<String>>,
}

impl ClassCache {
    /// クラス名を MODULES の順で探し、見つかったサブモジュール名を返す
    pub fn lookup(&self, class_name: &str) -> Option<&str> {
        for m in MODULES {
            if let Some(classes) = self.modules.get(m) {
                if classes.iter().any(|c| c == class_name) {
                    return Some(m);
                }
            }
        }
        None
    }
}

/// ツール全体のキャッシュディレクトリ ($XDG_CACHE_HOME/qtui2pyi) を返す
pub fn cache_dir() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qtui2pyi")
}

/// 1 つの (パッケージ, バージョン) に対するキャッシュファイルのパスを返す。
/// バージョンと対象サブモジュール名がファイル名に入る
pub fn cache_file(base_dir: &Path, package: &str, version: &str) -> PathBuf {
    base_dir
        .join(package)
        .join(format!("{}_{}.json", version, MODULES.join("_")))
}

/// キャッシュファイルを読み込む。存在しない・壊れている場合は None を返す。
pub fn load(path: &Path) -> Option<ClassCache> {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
}

/// キャッシュファイルに書き込む。書き込み失敗は無視する（キャッシュは最適化であり必須ではない）。
pub fn save(path: &Path, cache: &ClassCache) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(json) = serde_json::to_string_pretty(cache) {
        let _ = fs::write(path, json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cache() -> ClassCache {
        let mut modules = BTreeMap::new();
        modules.insert(
            "QtCore".to_string(),
            vec!["QObject".to_string(), "QTimer".to_string()],
        );
        modules.insert("QtGui".to_string(), vec!["QAction".to_string()]);
        modules.insert(
            "QtWidgets".to_string(),
            vec!["QLabel".to_string(), "QWidget".to_string()],
        );
        ClassCache { modules }
    }

    #[test]
    fn test_lookup_module_order() {
        let cache = sample_cache();
        assert_eq!(cache.lookup("QObject"), Some("QtCore"));
        assert_eq!(cache.lookup("QAction"), Some("QtGui"));
        assert_eq!(cache.lookup("QLabel"), Some("QtWidgets"));
        assert_eq!(cache.lookup("QFancyWidget"), None);
    }

    #[test]
    fn test_cache_file_per_version() {
        let base = PathBuf::from("/tmp/qtui2pyi-test");
        let a = cache_file(&base, "PySide6", "6.7.2");
        let b = cache_file(&base, "PySide6", "6.8.0");
        assert_ne!(a, b);
        assert!(a.ends_with("PySide6/6.7.2_QtCore_QtGui_QtWidgets.json"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("qtui2pyi-cache-test-{}", std::process::id()))
            .join("PySide6")
            .join("6.7.2_QtCore_QtGui_QtWidgets.json");
        let cache = sample_cache();
        save(&path, &cache);
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.lookup("QTimer"), Some("QtCore"));
        assert_eq!(loaded.lookup("QWidget"), Some("QtWidgets"));
        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_load_missing_or_broken() {
        assert!(load(Path::new("/nonexistent/qtui2pyi.json")).is_none());
        let path = std::env::temp_dir().join(format!("qtui2pyi-broken-{}.json", std::process::id()));
        fs::write(&path, "{not json").unwrap();
        assert!(load(&path).is_none());
        let _ = fs::remove_file(&path);
    }
}
