//! Bounded LED command mailbox and its single executor.
//!
//! ```text
//! ┌──────────────┐ enqueue  ┌─────────────────────┐  pop   ┌──────────────┐
//! │ main loop    │────────▶│  AnimationQueue     │──────▶│ animation    │
//! │ (events,     │         │  Mutex<Deque<_,10>> │       │ worker       │──▶ strip
//! │  menu)       │         │  drop when full     │       │ (own thread) │
//! └──────────────┘          └─────────────────────┘        └──────────────┘
//! ```
//!
//! `enqueue` never blocks for longer than the lock hold time of a push, and
//! never applies backpressure: a full queue drops the new command with a
//! warning.  The worker pops under the lock, releases it, then runs the
//! command to completion.  Commands execute strictly in FIFO order and are
//! never cancelled once started.

pub mod command;

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use heapless::Deque;
use log::{debug, warn};

pub use command::{LedCommand, LedKind};

use crate::drivers::led_patterns::LedRenderer;

/// Maximum number of pending commands.
pub const QUEUE_CAPACITY: usize = 10;

/// Worker sleep when the queue is empty.  Bounds wake latency.
pub const IDLE_SLEEP_MS: u32 = 100;

pub struct AnimationQueue {
    pending: Mutex<Deque<LedCommand, QUEUE_CAPACITY>>,
    dropped: AtomicU32,
}

impl AnimationQueue {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Deque::new()),
            dropped: AtomicU32::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Deque<LedCommand, QUEUE_CAPACITY>> {
        // A panic mid-push cannot leave the deque inconsistent.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `cmd`, or drop it when the queue is full.
    /// Returns whether the command was accepted.
    pub fn enqueue(&self, cmd: LedCommand) -> bool {
        let kind = cmd.kind();
        match self.lock().push_back(cmd) {
            Ok(()) => {
                debug!("queue: +{:?}", kind);
                true
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("queue: full, dropping {:?}", kind);
                false
            }
        }
    }

    /// Remove the oldest pending command.
    pub fn pop(&self) -> Option<LedCommand> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Commands dropped because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Execute at most one command.  Returns `true` if one ran.
    pub fn run_once(&self, renderer: &mut impl LedRenderer) -> bool {
        // The guard is a temporary of this statement, so the lock is
        // released before the command runs.
        let next = self.pop();
        match next {
            Some(cmd) => {
                renderer.render(&cmd);
                true
            }
            None => false,
        }
    }

    /// Worker loop: drain commands until `keep_running` goes false.
    pub fn run(
        &self,
        renderer: &mut impl LedRenderer,
        delay: &mut impl DelayNs,
        keep_running: &AtomicBool,
    ) {
        debug!("queue: worker running");
        while keep_running.load(Ordering::Acquire) {
            if !self.run_once(renderer) {
                delay.delay_ms(IDLE_SLEEP_MS);
            }
        }
        debug!("queue: worker stopped");
    }
}

impl Default for AnimationQueue {
    fn default() -> Self {
        Self::new()
    }
}
