//! WS2812 strip driver on the ESP32 RMT peripheral.
//!
//! Implements [`PixelSink`]: pixels are buffered in RAM and clocked out as
//! GRB bit pulses when [`show`](PixelSink::show) is called.

use core::time::Duration;

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::{PinState, Pulse, RmtChannel, TxRmtDriver, VariableLengthSignal};
use log::{info, warn};

use crate::drivers::led_patterns::{OFF, PixelSink, Rgb};
use crate::error::Error;

/// High/low times of a 0 bit and a 1 bit.
const T0H: Duration = Duration::from_nanos(350);
const T0L: Duration = Duration::from_nanos(800);
const T1H: Duration = Duration::from_nanos(700);
const T1L: Duration = Duration::from_nanos(600);

pub struct Ws2812Strip<'d> {
    tx: TxRmtDriver<'d>,
    pixels: Vec<Rgb>,
    /// `[zero_high, zero_low, one_high, one_low]`
    pulses: [Pulse; 4],
    failures: u32,
}

impl<'d> Ws2812Strip<'d> {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'd,
        pin: impl Peripheral<P = impl OutputPin> + 'd,
        len: u16,
    ) -> Result<Self, Error> {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config).map_err(|_| Error::Init("rmt"))?;
        let hz = tx.counter_clock().map_err(|_| Error::Init("rmt clock"))?;
        let pulse = |state, d: &Duration| {
            Pulse::new_with_duration(hz, state, d).map_err(|_| Error::Init("rmt pulse"))
        };
        let pulses = [
            pulse(PinState::High, &T0H)?,
            pulse(PinState::Low, &T0L)?,
            pulse(PinState::High, &T1H)?,
            pulse(PinState::Low, &T1L)?,
        ];
        info!("ws2812: {} pixels", len);
        Ok(Self {
            tx,
            pixels: vec![OFF; usize::from(len)],
            pulses,
            failures: 0,
        })
    }

    fn transmit(&mut self) -> Result<(), esp_idf_hal::sys::EspError> {
        let mut signal = VariableLengthSignal::new();
        for &(r, g, b) in &self.pixels {
            let grb = (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b);
            for bit in (0..24).rev() {
                let [h0, l0, h1, l1] = &self.pulses;
                if grb & (1 << bit) != 0 {
                    signal.push([h1, l1])?;
                } else {
                    signal.push([h0, l0])?;
                }
            }
        }
        self.tx.start_blocking(&signal)
    }
}

impl PixelSink for Ws2812Strip<'_> {
    fn len(&self) -> u16 {
        self.pixels.len() as u16
    }

    fn set(&mut self, idx: u16, colour: Rgb) {
        if let Some(p) = self.pixels.get_mut(usize::from(idx)) {
            *p = colour;
        }
    }

    fn get(&self, idx: u16) -> Rgb {
        self.pixels.get(usize::from(idx)).copied().unwrap_or(OFF)
    }

    fn show(&mut self) {
        if let Err(e) = self.transmit() {
            self.failures += 1;
            if self.failures == 1 || self.failures % 100 == 0 {
                warn!("ws2812: transmit failed ({} so far): {}", self.failures, e);
            }
        }
    }
}
