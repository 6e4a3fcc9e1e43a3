//! Progress notifications for the caller's five-step indicator.

use std::sync::atomic::{AtomicU8, Ordering};

/// Pipeline stages in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Preparing,
    QueryingSources,
    ProcessingResults,
    Validating,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Preparing,
        Stage::QueryingSources,
        Stage::ProcessingResults,
        Stage::Validating,
        Stage::Done,
    ];

    /// 1-based stage number.
    pub fn number(&self) -> u8 {
        match self {
            Stage::Preparing => 1,
            Stage::QueryingSources => 2,
            Stage::ProcessingResults => 3,
            Stage::Validating => 4,
            Stage::Done => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Preparing => "preparing",
            Stage::QueryingSources => "querying sources",
            Stage::ProcessingResults => "processing results",
            Stage::Validating => "validating",
            Stage::Done => "done",
        }
    }

    pub fn from_number(n: u8) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.number() == n)
    }
}

/// Receives stage notifications. Implemented for plain closures.
pub trait ProgressSink: Send + Sync {
    fn on_stage(&self, stage: Stage);
}

impl<F> ProgressSink for F
where
    F: Fn(Stage) + Send + Sync,
{
    fn on_stage(&self, stage: Stage) {
        self(stage)
    }
}

/// Sink that records the latest stage so a caller can poll it.
#[derive(Debug, Default)]
pub struct ProgressState {
    current: AtomicU8,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest reported stage, `None` before the first notification.
    pub fn current(&self) -> Option<Stage> {
        Stage::from_number(self.current.load(Ordering::Acquire))
    }
}

impl ProgressSink for ProgressState {
    fn on_stage(&self, stage: Stage) {
        self.current.fetch_max(stage.number(), Ordering::AcqRel);
    }
}

/// Wraps an optional sink and forwards each stage at most once, in strictly
/// increasing order. Out-of-order or repeated stages are swallowed.
pub(crate) struct ProgressReporter<'a> {
    sink: Option<&'a dyn ProgressSink>,
    last: u8,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: Option<&'a dyn ProgressSink>) -> Self {
        Self { sink, last: 0 }
    }

    pub fn advance(&mut self, stage: Stage) {
        if stage.number() <= self.last {
            return;
        }
        self.last = stage.number();
        tracing::debug!(stage = stage.number(), label = stage.label(), "Pipeline stage");
        if let Some(sink) = self.sink {
            sink.on_stage(stage);
        }
    }
}
