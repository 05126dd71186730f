//! Gateway client tests. Every test runs with paused time, so heartbeat
//! intervals and retry pauses elapse instantly once the client is idle.

mod heartbeat_tests;
mod readiness_tests;
mod reconnect_tests;
