pub mod config;
pub mod error;
pub mod lexicon;
pub mod types;

pub use config::Config;
pub use error::EvidenceError;
pub use lexicon::SafetyLexicon;
pub use types::*;
