//! Core domain types for the millwright platform.
//!
//! This crate provides the strongly-typed identifiers shared by the
//! workflow core and its collaborators. Heavier domain logic lives in
//! the crates that own it.

pub mod id;

pub use id::{ParseIdError, WorkflowId, WorkflowRunId};
