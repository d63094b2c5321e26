//! Pipeline components: discovery, parse workers, streaming consumer, session wiring.
//!
//! Dir → discovery (sync) → feeder thread → work queue → N parse workers →
//! result queue → [`RecordStream`]. Per-file failures go to a side channel instead of
//! stopping the run.

pub mod context;
pub mod discovery;
pub mod error_handler;
pub mod orchestrator;
pub mod stream;
pub mod worker;

pub use context::{
    ActiveWorkerGuard, CancelHandle, CancelSignal, PipelineChannels, PipelineTuning,
    create_pipeline_channels,
};
pub use discovery::{ListOutcome, discover_sources, run_feed_loop, spawn_feed_thread};
pub use error_handler::report_file_errors;
pub use orchestrator::{SessionThreads, collect_records, run_pipeline, shutdown_pipeline_handles};
pub use stream::RecordStream;
pub use worker::{WorkerShared, parse_file, spawn_parse_workers};
