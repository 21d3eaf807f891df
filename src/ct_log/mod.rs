// src/ct_log/mod.rs
pub mod client;
pub mod log_list;
pub mod types;

pub use client::CtLogClient;
pub use log_list::LogListFetcher;
pub use types::{GetEntriesResponse, LogInfo, LogListV3, RawEntry, SignedTreeHead};
