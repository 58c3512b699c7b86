//! Timestamped copies of the primary data file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::StoreResult;

/// File name for a backup taken at `now`: `db_backup_YYYYmmdd_HHMMSS` plus the
/// source extension, if any.
pub fn backup_file_name(src: &Path, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match src.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("db_backup_{stamp}.{ext}"),
        None => format!("db_backup_{stamp}"),
    }
}

/// Copy `src` into `backup_dir` (created when missing) and return the new
/// path. A missing source is an I/O error.
pub async fn backup_data_file(
    src: &Path,
    backup_dir: &Path,
    now: DateTime<Utc>,
) -> StoreResult<PathBuf> {
    tokio::fs::create_dir_all(backup_dir).await?;
    let dest = backup_dir.join(backup_file_name(src, now));
    let bytes = tokio::fs::copy(src, &dest).await?;
    debug!(dest = %dest.display(), bytes, "backup written");
    Ok(dest)
}
