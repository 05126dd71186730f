//! Request DTOs
//!
//! Data structures for REST request bodies.

use serde::Serialize;

/// Create or edit message request
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    pub content: String,
}
