// src/sampler/mod.rs
pub mod coordinator;
pub mod range;
pub mod worker;

pub use coordinator::{RunSummary, SampleCoordinator};
pub use range::RangeSampler;
pub use worker::{sample_target, LogWorker, SampleOutcome, WorkerConfig};
