//! Core business logic - framework-agnostic calculation operations.
//!
//! The pure pieces (`months`, `formula`, `summary`) have no I/O. `workflow` and
//! `editor` orchestrate them and talk to persistence only through
//! [`CalculationStore`](crate::store::CalculationStore).

/// Principals and the role guard
pub mod access;
/// Parameter validation, store payload builders and list/view/delete/duplicate
pub mod calculations;
/// Edit-after-save flow
pub mod editor;
/// Monthly result formula
pub mod formula;
/// Date range to month expansion
pub mod months;
/// Totals and averages
pub mod summary;
/// Three-state create flow
pub mod workflow;
