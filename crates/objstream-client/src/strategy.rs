//! Read Strategy and Range Planning
//!
//! The planner decides how much to ask the server for on each new stream:
//!
//! - **Sequential** (and `Auto` before the latch): unbounded — one long
//!   stream, chunked by the server, carried across successive reads.
//! - **Random**: bounded to `max(want, max(inplace_seek_limit,
//!   min_range_request_size))`, so a burst of small reads still gets one
//!   decently sized range instead of many tiny ones.
//! - With a footer cached, any plan is clamped to end at the footer start;
//!   the tail is always served from memory, never from the wire.
//!
//! `Auto` latches to `Random` on the first seek that cannot be absorbed in
//! place. The latch is one-way: workloads that start with a sequential scan
//! and then reveal random access do not flap back.

use crate::config::{Fadvise, ReadOptions};
use tracing::debug;

/// Owns the access-pattern state and the range arithmetic.
#[derive(Debug)]
pub struct ReadPlanner {
    strategy: Fadvise,
    inplace_seek_limit: u64,
    min_range_request_size: u64,
}

impl ReadPlanner {
    pub fn new(options: &ReadOptions) -> Self {
        Self {
            strategy: options.fadvise,
            inplace_seek_limit: options.inplace_seek_limit,
            min_range_request_size: options.min_range_request_size,
        }
    }

    pub fn strategy(&self) -> Fadvise {
        self.strategy
    }

    /// Whether a seek of `distance` bytes can be absorbed by skipping inside
    /// the active stream.
    pub fn is_in_place(&self, distance: i64) -> bool {
        distance >= 0 && distance as u64 <= self.inplace_seek_limit
    }

    /// Note a seek that was not absorbed in place; latches `Auto` to
    /// `Random`.
    pub fn record_seek(&mut self, distance: i64) {
        if self.strategy == Fadvise::Auto
            && (distance < 0 || distance as u64 > self.inplace_seek_limit)
        {
            debug!(distance, "Access pattern latched to random");
            self.strategy = Fadvise::Random;
        }
    }

    /// Plan the length of the next range request issued at `position` for a
    /// destination wanting `want` bytes. `None` means unbounded.
    ///
    /// `footer_start` is passed only while a footer is cached and `position`
    /// is before it; the plan is clamped so the stream ends where the footer
    /// begins.
    pub fn plan_read(&self, want: u64, position: u64, footer_start: Option<u64>) -> Option<u64> {
        let mut planned = match self.strategy {
            Fadvise::Random => {
                let range_floor = self.inplace_seek_limit.max(self.min_range_request_size);
                Some(want.max(range_floor))
            }
            Fadvise::Sequential | Fadvise::Auto => None,
        };

        if let Some(footer_start) = footer_start {
            let to_footer = footer_start - position;
            planned = Some(match planned {
                Some(length) => length.min(to_footer),
                None => to_footer,
            });
        }

        planned
    }
}
