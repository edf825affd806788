//! Structured observability hooks for graph saves.
//!
//! This module provides:
//! - Per-object tracing spans via the `SaveSpan` RAII guard
//! - Emission functions for save lifecycle events: start, cycle reuse,
//!   skipped field, commit
//!
//! Events are emitted at `debug!`/`info!` level; filter with `RUST_LOG`.

use tracing::{debug, info, Span};

/// Tracing span covering the save of one object.
///
/// Unlike an entered guard, the span can be attached to the async block
/// that performs the save (`.instrument(span.span())`).
pub struct SaveSpan {
    span: Span,
}

impl SaveSpan {
    pub fn new(class_name: &str, depth: usize) -> Self {
        Self {
            span: tracing::info_span!("recordgraph.save", class = %class_name, depth = depth),
        }
    }

    pub fn span(&self) -> Span {
        self.span.clone()
    }
}

/// Emit event: save of one object started.
pub fn emit_save_started(class_name: &str, depth: usize) {
    debug!(event = "save.started", class = %class_name, depth = depth);
}

/// Emit event: a nested object already being saved was reused instead of
/// recursing into it.
pub fn emit_cycle_reused(class_name: &str, field: &str) {
    debug!(event = "save.cycle_reused", class = %class_name, field = %field);
}

/// Emit event: a field value the store cannot hold was left out.
pub fn emit_field_skipped(class_name: &str, field: &str, value_type: &str) {
    debug!(
        event = "save.field_skipped",
        class = %class_name,
        field = %field,
        value_type = %value_type,
    );
}

/// Emit event: record committed.
pub fn emit_save_committed(class_name: &str, object_id: &str, created: bool) {
    info!(
        event = "save.committed",
        class = %class_name,
        object_id = %object_id,
        created = created,
    );
}
