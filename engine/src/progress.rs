//! Status reporting trait.
//!
//! This module defines the StatusSink trait, which allows decoupling the
//! backup engine from any specific UI technology (CLI, GUI, etc.).
//!
//! The engine appends to the sink at each major step of a backup; it never
//! reads from it.

use crate::model::StatusEvent;

/// Trait for receiving status entries from the backup engine.
///
/// Implement this trait to receive timestamped progress and failure notices.
/// The CLI provides a simple implementation for stdout/stderr output. Future
/// UI implementations (GUI, web, etc.) can also implement this trait.
///
/// `emit` is called synchronously from the engine's thread.
pub trait StatusSink: Send {
    /// Called once per progress or failure notice, in emission order.
    fn emit(&self, event: StatusEvent);
}

/// A sink that discards every event, for callers without a display surface.
pub struct NullSink;

impl StatusSink for NullSink {
    fn emit(&self, _event: StatusEvent) {}
}
