//! File-backed storage and site adapters for the CLI and other local frontends.

mod directory_site_catalog;
mod json_file;
mod json_history_repo;
mod json_snapshot_repo;

pub use directory_site_catalog::DirectorySiteCatalog;
pub use json_history_repo::JsonHistoryRepository;
pub use json_snapshot_repo::JsonSnapshotRepository;
