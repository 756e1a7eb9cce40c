//! Event orchestration.

mod controller;

pub use controller::{BatchSummary, Controller};
