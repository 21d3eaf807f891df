// src/lib.rs
// Library interface for ct-sampler
pub mod cert_parser;
pub mod classify;
pub mod cli;
pub mod config;
pub mod ct_log;
pub mod leaf;
pub mod progress;
pub mod run_log;
pub mod sampler;
pub mod sink;
pub mod stats;
