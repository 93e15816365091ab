//! Playready - keeps a video library playable on a fixed-capability client.
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod naming;
pub mod notifications;
pub mod policy;
pub mod probe;
pub mod scanner;
pub mod scheduler;
pub mod transcode;
