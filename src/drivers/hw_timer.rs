//! One-shot release timers built on ESP-IDF's esp_timer API.
//!
//! Every debounced channel owns one timer.  Arming an already-armed timer
//! restarts it (disarm-then-rearm), so only the latest release counts.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR).  They
//! forward into the shared [`EdgeDetectorCell`](crate::sensors::EdgeDetectorCell),
//! which enters a critical section before touching detector state.
//!
//! On simulation targets, [`SimTimer`] records arm/disarm calls and the
//! caller fires the expiry by hand.

/// A restartable one-shot timer.
pub trait OneShotTimer {
    /// Start (or restart) the timer so it fires once after `after_ms`.
    fn arm(&mut self, after_ms: u32);

    /// Cancel a pending expiry.  No-op when idle.
    fn disarm(&mut self);
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspOneShot;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::sys::*;

    use super::OneShotTimer;
    use crate::error::Error;

    /// Timer expiry callback signature expected by esp_timer.
    pub type TimerCallback = unsafe extern "C" fn(*mut core::ffi::c_void);

    /// Owned esp_timer handle configured for one-shot use.
    pub struct EspOneShot {
        handle: esp_timer_handle_t,
    }

    // SAFETY: esp_timer handles may be started/stopped from any task; the
    // handle is only a pointer into the timer service's own list.
    unsafe impl Send for EspOneShot {}

    impl EspOneShot {
        /// Create a stopped timer. `name` must be null-terminated.
        /// `arg` is passed back verbatim to `callback`.
        pub fn new(name: &'static str, callback: TimerCallback, arg: usize) -> Result<Self, Error> {
            let args = esp_timer_create_args_t {
                callback: Some(callback),
                arg: arg as *mut core::ffi::c_void,
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: name.as_ptr() as *const _,
                skip_unhandled_events: true,
            };
            let mut handle: esp_timer_handle_t = core::ptr::null_mut();
            // SAFETY: args outlives the call; handle is written on success.
            let ret = unsafe { esp_timer_create(&args, &raw mut handle) };
            if ret != ESP_OK {
                log::error!("hw_timer: create '{}' failed (rc={})", name.trim_end_matches('\0'), ret);
                return Err(Error::Init("esp_timer_create"));
            }
            Ok(Self { handle })
        }
    }

    impl OneShotTimer for EspOneShot {
        fn arm(&mut self, after_ms: u32) {
            // SAFETY: handle is valid for the lifetime of self.  Stopping an
            // idle timer returns ESP_ERR_INVALID_STATE, which is harmless.
            unsafe {
                esp_timer_stop(self.handle);
                esp_timer_start_once(self.handle, u64::from(after_ms) * 1_000);
            }
        }

        fn disarm(&mut self) {
            // SAFETY: see arm().
            unsafe {
                esp_timer_stop(self.handle);
            }
        }
    }

    impl Drop for EspOneShot {
        fn drop(&mut self) {
            // SAFETY: handle was created by esp_timer_create and is not used
            // after this point.
            unsafe {
                esp_timer_stop(self.handle);
                esp_timer_delete(self.handle);
            }
        }
    }
}

// ── Simulation ────────────────────────────────────────────────

/// Host-side timer that only records what was asked of it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimTimer {
    armed_ms: Option<u32>,
    arm_count: u32,
}

impl SimTimer {
    pub const fn new() -> Self {
        Self {
            armed_ms: None,
            arm_count: 0,
        }
    }

    /// Delay of the pending expiry, if armed.
    pub fn armed(&self) -> Option<u32> {
        self.armed_ms
    }

    /// Total number of `arm` calls so far.
    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    /// Consume the pending expiry.  Returns `true` if the timer was armed,
    /// in which case the caller should run the expiry handler.
    pub fn fire(&mut self) -> bool {
        self.armed_ms.take().is_some()
    }
}

impl OneShotTimer for SimTimer {
    fn arm(&mut self, after_ms: u32) {
        self.armed_ms = Some(after_ms);
        self.arm_count += 1;
    }

    fn disarm(&mut self) {
        self.armed_ms = None;
    }
}
