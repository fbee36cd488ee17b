//! Observable watch-loop state.

use std::sync::atomic::{AtomicU8, Ordering};

/// Watch loop state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Init = 0,
    Watching = 1,
    Resubscribing = 2,
    Closed = 3,
}

impl From<u8> for WatchState {
    fn from(val: u8) -> Self {
        match val {
            1 => WatchState::Watching,
            2 => WatchState::Resubscribing,
            3 => WatchState::Closed,
            _ => WatchState::Init,
        }
    }
}

/// Shared cell the loop writes and the suite reads.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(WatchState::Init as u8))
    }

    pub fn get(&self) -> WatchState {
        WatchState::from(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: WatchState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
