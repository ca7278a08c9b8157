//! Task domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own the admission boundary for user-supplied due times.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Due times inside the core are always valid UTC epoch milliseconds.

pub mod due;
pub mod task;
