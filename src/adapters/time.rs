//! Delay adapter.
//!
//! The animation worker and the main loop sleep through
//! [`embedded_hal::delay::DelayNs`], so the same code runs on both targets:
//!
//! - **`target_os = "espidf"`**: [`SystemDelay`] is the FreeRTOS tick
//!   delay, which yields to other tasks while sleeping.
//! - **`not(target_os = "espidf")`**: [`StdDelay`] sleeps the calling
//!   thread with `std::thread::sleep`.

use embedded_hal::delay::DelayNs;

/// Thread-sleeping delay for host builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

#[cfg(target_os = "espidf")]
pub type SystemDelay = esp_idf_hal::delay::FreeRtos;

#[cfg(not(target_os = "espidf"))]
pub type SystemDelay = StdDelay;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn std_delay_sleeps_at_least_requested() {
        let start = Instant::now();
        StdDelay.delay_ms(20);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
