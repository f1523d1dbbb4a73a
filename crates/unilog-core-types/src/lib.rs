//! Core types shared across unilog facilities
//!
//! This crate provides foundational types used by both error handling
//! and the logging pipeline:
//!
//! - **Correlation types**: RequestId, TraceId, UserId, CorrelationContext
//! - **Sensitive data**: Sensitive<T> marker for explicit redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{CorrelationContext, RequestId, TraceId, UserId};
pub use sensitive::Sensitive;
