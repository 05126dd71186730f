//! Heartbeat controller
//!
//! Drives the periodic heartbeat and the acknowledgement watchdog. A beat
//! sent while nothing is outstanding arms a deadline one interval out; an
//! acknowledgement clears it. Only the deadline passing marks the
//! connection as dead. Ticks always beat.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};

use super::messages::{self, GatewaySend};

/// What the controller wants the connection loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatSignal {
    /// Send the next periodic heartbeat.
    Beat,
    /// No acknowledgement arrived in time.
    AckOverdue,
}

#[derive(Debug, Default)]
pub struct HeartbeatController {
    interval: Option<Duration>,
    ticker: Option<Interval>,
    deadline: Option<Pin<Box<Sleep>>>,
    last_sent_at: Option<Instant>,
}

impl HeartbeatController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn ack_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Start periodic heartbeats. The first tick fires one interval from
    /// now; callers send the initial heartbeat themselves.
    ///
    /// Re-arming replaces any previous schedule.
    pub fn arm(&mut self, interval: Duration) {
        self.disarm();
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        self.interval = Some(interval);
    }

    /// Stop the schedule and forget any outstanding acknowledgement.
    pub fn disarm(&mut self) {
        self.interval = None;
        self.ticker = None;
        self.deadline = None;
        self.last_sent_at = None;
    }

    /// Build a heartbeat command and start waiting for its acknowledgement.
    ///
    /// An outstanding deadline is kept as is, so repeated beats cannot push
    /// it back.
    pub fn beat(&mut self, sequence: Option<u64>) -> GatewaySend<Option<u64>> {
        let now = Instant::now();
        self.last_sent_at = Some(now);
        if let (Some(interval), None) = (self.interval, &self.deadline) {
            self.deadline = Some(Box::pin(time::sleep_until(now + interval)));
        }
        messages::heartbeat(sequence)
    }

    /// Clear the watchdog. Returns the round-trip time since the last beat,
    /// or `None` if nothing has been sent.
    pub fn acknowledge(&mut self) -> Option<Duration> {
        self.deadline = None;
        self.last_sent_at.map(|sent| sent.elapsed())
    }

    /// Wait for the next heartbeat signal. Pending forever while disarmed.
    pub async fn wait(&mut self) -> HeartbeatSignal {
        let Self {
            ticker, deadline, ..
        } = self;

        tokio::select! {
            biased;
            _ = expire(deadline) => {
                *deadline = None;
                HeartbeatSignal::AckOverdue
            }
            _ = tick(ticker) => HeartbeatSignal::Beat,
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}

async fn expire(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}
