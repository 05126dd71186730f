//! # Domain Layer
//!
//! Session and guild state owned by the gateway client, plus the value
//! types they are built from.
//!
//! ## Structure
//!
//! - **entities**: Session and guild state
//! - **value_objects**: Immutable value types (Snowflake)
//!
//! Nothing here performs I/O; the gateway module drives these types.

pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
