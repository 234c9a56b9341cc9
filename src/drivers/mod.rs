//! Input channels, indicator outputs, timers and LED strip rendering.

pub mod button;
pub mod hw_init;
pub mod hw_timer;
pub mod led_patterns;
pub mod task_pin;
