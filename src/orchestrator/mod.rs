//! Execution-request orchestration.
//!
//! This module owns the submit lifecycle: single-flight gating, runtime
//! readiness, argument normalization, the one engine call, and outcome
//! classification. Presentation layers drive it through commands and consume
//! its events.

mod controller;
mod invoker;

pub(crate) use controller::{run_controller, SessionEvent, UiCommand};
pub(crate) use invoker::execute_once;
