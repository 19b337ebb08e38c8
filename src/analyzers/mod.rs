pub mod java;
pub mod traits;

pub use java::JavaAnalyzer;
pub use traits::LanguageAnalyzer;
