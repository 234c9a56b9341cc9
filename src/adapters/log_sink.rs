//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production, stderr on the host).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => info!("START | mode={:?}", mode),
            AppEvent::ScoreDetected { team, pin } => {
                info!("SCORE | team={} pin={}", team.number(), pin);
            }
            AppEvent::TimeoutCalled { team, pin } => {
                info!("TIMEOUT | team={} pin={}", team.number(), pin);
            }
            AppEvent::GoalRecorded { team, outcome } => {
                info!("GOAL | team={} outcome={:?}", team.number(), outcome);
            }
            AppEvent::ModeChanged(mode) => info!("MODE | {:?}", mode),
            AppEvent::ClientConnected(count) => info!("CLIENT | connected (#{})", count),
            AppEvent::ClientDisconnected => info!("CLIENT | disconnected"),
            AppEvent::ConfigSaved => info!("CONFIG | saved"),
            AppEvent::Stopping => info!("STOP | program ending"),
        }
    }
}
