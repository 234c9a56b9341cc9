//! Application core: scoreboard logic with zero direct I/O.
//!
//! The controller consumes the interrupt flags, drives the menu state
//! machine and scoreboard, and produces display updates, outbound protocol
//! lines and LED commands.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod screen;
pub mod service;
