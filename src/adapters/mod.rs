//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure. Each sub-module groups adapters by concern.
//!
//! Adapter categories:
//! - `parameters`: Market-manager parameter sources
//! - `submission`: Market-creation backends

pub mod parameters;
pub mod submission;
