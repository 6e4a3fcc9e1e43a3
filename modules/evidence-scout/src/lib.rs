pub mod aggregator;
pub mod filter;
pub mod parser;
pub mod pipeline;
pub mod planner;
pub mod progress;
pub mod retrieval;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod util;
pub mod validator;

pub use pipeline::{EvidencePipeline, PipelineStats};
pub use progress::{ProgressSink, ProgressState, Stage};
