//! Shared handler state.

use std::path::PathBuf;

use shopbooks_infra::BackOffice;

/// Everything a handler needs, shared behind an `Arc` extension.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub office: BackOffice,
    /// Destination for `POST /system/backup`.
    pub backup_dir: PathBuf,
}

impl AppServices {
    pub fn new(office: BackOffice, backup_dir: PathBuf) -> Self {
        Self { office, backup_dir }
    }
}
