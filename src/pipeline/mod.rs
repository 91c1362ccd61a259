//! Batch orchestration: per-file transcription, timeline merging, ETA and
//! status reporting, driven by [`PipelineController`].

pub mod adapter;
pub mod controller;
pub mod eta;
pub mod merge;
pub mod reporter;

pub use adapter::{
    ChunkedAdapter, FileTranscript, TaskFailure, TaskResult, TaskStage, TranscriptionAdapter,
    WholeFileAdapter,
};
pub use controller::{
    BatchOutcome, BatchPhase, BatchReport, BatchSettings, CancelHandle, FileReport,
    PipelineController,
};
pub use eta::{EtaEstimator, ThroughputSample, format_hms};
pub use merge::{TimelineMerger, merge_windows};
pub use reporter::{
    CollectorSink, LogSink, ProgressEvent, ProgressSink, ProgressSnapshot,
    ReporterState, StatusReporter,
};
