//! Due-date reminders.
//!
//! # Responsibility
//! - Decide which threshold reminders are due on each polling tick.
//! - Guarantee each `(task, window)` reminder fires at most once while the
//!   task stays inside the near horizon.
//!
//! # Invariants
//! - The dedup ledger is owned by one engine and mutated only by its tick
//!   and explicit invalidations; it is never global.
//! - The notification tick is independent of any display refresh.

pub mod config;
pub mod engine;
pub mod ledger;
pub mod notify;
pub mod poller;
pub mod threshold;
