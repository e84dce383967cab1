//! # Freshness モジュール
//!
//! 出力ファイルの再生成が必要かどうかの判定。
//! 判定は純粋に mtime の比較のみで、内容のハッシュは取らない。
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{QtuiError, QtuiResult};

/// 再生成が必要なら true。
/// 出力ファイルが存在しない、または mtime がソースより古い場合に再生成する。
pub fn needs_regenerate(source: &Path, dest: &Path) -> QtuiResult<bool> {
    let dest_meta = match fs::metadata(dest) {
        Ok(m) => m,
        // 出力が無い → 作成が必要
        Err(_) => return Ok(true),
    };

    let src_mtime = mtime(source)?;
    let dst_mtime = dest_meta
        .modified()
        .map_err(|e| QtuiError::Io(dest.to_path_buf(), e))?;
    Ok(dst_mtime < src_mtime)
}

/// ファイルの mtime を返す
pub fn mtime(path: &Path) -> QtuiResult<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| QtuiError::Io(path.to_path_buf(), e))
}

/// ファイルの mtime を UNIX 秒で返す（スタブヘッダ用）
pub fn mtime_secs(path: &Path) -> QtuiResult<u64> {
    let t = mtime(path)?;
    Ok(t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    /// テスト用の一時ファイルを指定 mtime で作る
    fn temp_file(name: &str, modified: SystemTime) -> std::path::PathBuf {
        let path =
            std::env::temp_dir().join(format!("qtui2pyi-fresh-{}-{}", std::process::id(), name));
        let f = File::create(&path).unwrap();
        f.set_modified(modified).unwrap();
        path
    }

    #[test]
    fn test_missing_dest_needs_regenerate() {
        let now = SystemTime::now();
        let src = temp_file("src-a.ui", now);
        let dest = std::env::temp_dir().join("qtui2pyi-fresh-does-not-exist.pyi");
        assert!(needs_regenerate(&src, &dest).unwrap());
        let _ = fs::remove_file(&src);
    }

    #[test]
    fn test_newer_dest_is_up_to_date() {
        let now = SystemTime::now();
        let src = temp_file("src-b.ui", now - Duration::from_secs(100));
        let dest = temp_file("dst-b.pyi", now);
        assert!(!needs_regenerate(&src, &dest).unwrap());
        let _ = fs::remove_file(&src);
        let _ = fs::remove_file(&dest);
    }

    #[test]
    fn test_older_dest_needs_regenerate() {
        let now = SystemTime::now();
        let src = temp_file("src-c.ui", now);
        let dest = temp_file("dst-c.pyi", now - Duration::from_secs(100));
        assert!(needs_regenerate(&src, &dest).unwrap());
        let _ = fs::remove_file(&src);
        let _ = fs::remove_file(&dest);
    }

    #[test]
    fn test_mtime_secs_of_missing_file() {
        let missing = Path::new("/nonexistent/qtui2pyi.ui");
        assert!(matches!(mtime_secs(missing), Err(QtuiError::Io(_, _))));
    }
}
