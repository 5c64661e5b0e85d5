//! Live price cache and price-target alert engine.
//!
//! Feed tasks keep a [`state::TickerRegistry`] current; the
//! [`engine::Evaluator`] sweeps stored alerts against it on a fixed period
//! and notifies owners when a target is reached.

pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod notify;
pub mod report;
pub mod service;
pub mod state;
pub mod store;
pub mod types;
