//! Lazy loading of file batches
//!
//! Small batches are loaded right away. Larger ones are queued and drip-fed one
//! file per timer tick so a bulk import never blocks the UI for longer than a
//! single parse.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Batches with at least this many files are loaded one per tick
pub const LAZY_LOAD_AFTER_N_FILES: usize = 3;

/// Period of the lazy-load timer
pub const LAZY_LOAD_TICK: Duration = Duration::from_millis(100);

/// How a batch passed to [`LazyLoader::schedule`] is going to be loaded
#[derive(Debug, PartialEq, Eq)]
pub enum Schedule {
    /// Nothing to load
    Nothing,
    /// Load these paths synchronously, now
    Immediate(Vec<PathBuf>),
    /// Paths were queued; they are handed out by [`LazyLoader::poll`]
    Deferred,
}

/// Timer-driven queue of pending file loads
#[derive(Debug)]
pub struct LazyLoader {
    queue: VecDeque<PathBuf>,
    /// Loads not yet finished for the current batch
    pending: usize,
    /// Whether the tick timer is running
    armed: bool,
    last_tick: Option<Instant>,
    period: Duration,
}

impl Default for LazyLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyLoader {
    pub fn new() -> Self {
        Self::with_period(LAZY_LOAD_TICK)
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            pending: 0,
            armed: false,
            last_tick: None,
            period,
        }
    }

    /// Decide how to load `paths`, arming the timer at `now` if they are queued
    pub fn schedule(&mut self, paths: Vec<PathBuf>, now: Instant) -> Schedule {
        if paths.is_empty() {
            return Schedule::Nothing;
        }

        if paths.len() < LAZY_LOAD_AFTER_N_FILES && !self.armed {
            return Schedule::Immediate(paths);
        }

        tracing::info!("Queued {} files for lazy loading", paths.len());
        self.pending += paths.len();
        self.queue.extend(paths);
        if !self.armed {
            self.armed = true;
            self.last_tick = Some(now);
        }
        Schedule::Deferred
    }

    /// Hand out the next path if a tick is due at `now`
    ///
    /// Ticks fire once per period. When a tick finds the queue empty the timer
    /// stops and the pending counter resets.
    pub fn poll(&mut self, now: Instant) -> Option<PathBuf> {
        if !self.armed {
            return None;
        }
        if let Some(last) = self.last_tick
            && now.saturating_duration_since(last) < self.period
        {
            return None;
        }
        self.last_tick = Some(now);

        match self.queue.pop_front() {
            Some(path) => Some(path),
            None => {
                self.stop();
                None
            }
        }
    }

    /// Record that one handed-out load finished, successfully or not
    pub fn finish_one(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    fn stop(&mut self) {
        tracing::debug!("Lazy loading finished");
        self.armed = false;
        self.pending = 0;
        self.last_tick = None;
    }

    /// Loads still outstanding in the current batch
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Whether a batch is in progress
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// Whether the tick timer is running
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Delay until the next tick is due, if the timer is running
    pub fn next_tick_in(&self, now: Instant) -> Option<Duration> {
        if !self.armed {
            return None;
        }
        Some(match self.last_tick {
            Some(last) => self
                .period
                .saturating_sub(now.saturating_duration_since(last)),
            None => self.period,
        })
    }
}
