//! Stale-result gate
//!
//! Two counters decide whether a finished fetch may write to the state:
//! the generation changes when previously fetched results become invalid
//! (descriptor swap, dependency change, dropdown close), and every started
//! fetch takes a ticket. Only the holder of the latest ticket in the current
//! generation may apply.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct FetchGate {
    generation: AtomicU64,
    latest_ticket: AtomicU64,
}

impl FetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Invalidate everything issued so far; returns the new generation
    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Take a ticket for a fetch about to start
    pub fn issue(&self) -> u64 {
        self.latest_ticket.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, generation: u64, ticket: u64) -> bool {
        self.generation() == generation && self.latest_ticket.load(Ordering::Acquire) == ticket
    }
}
