//! Forked worker processes for greendots.
//!
//! This crate provides:
//! - `Channel`: a close-on-exec pipe with scoped writer and reader ends
//! - `Worker`: forks a child that writes its result into the channel, and
//!   collects that result in the parent once the child has exited
//!
//! Unix only: workers are created with `fork(2)`.

#[cfg(not(unix))]
compile_error!("greendots-core requires a Unix platform with fork(2)");

pub mod channel;
pub mod config;
pub mod error;
pub mod worker;

pub use channel::{Channel, ChannelReader, ChannelWriter};
pub use config::WorkerConfig;
pub use error::{Error, Result};
pub use worker::Worker;
