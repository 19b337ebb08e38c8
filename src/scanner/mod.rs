pub mod discovery;

pub use discovery::{RepositoryScanner, ScanConfig, ScanResult, ScannedFile};
