//! Infrastructure Layer
//!
//! Implementations of external collaborators: the socket transport and
//! Prometheus metrics.

pub mod metrics;
pub mod transport;
