//! # Domain Entities
//!
//! State the client keeps about its gateway session.
//!
//! - **Session**: resume identifiers, last sequence, readiness
//! - **GuildState**: availability of one guild, with its raw payload

mod guild;
mod session;

pub use guild::GuildState;
pub use session::Session;
