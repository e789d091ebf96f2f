//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate task mutations over a storage slot.
//! - Keep presentation layers decoupled from storage details.

pub mod task_store;
