//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI/embedding layers decoupled from storage details.

pub mod task_service;
