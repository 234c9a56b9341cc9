//! GPIO bring-up and interrupt wiring.
//!
//! Configures the goal sensor and button inputs, the indicator outputs,
//! and registers one edge interrupt per input.  Every interrupt and every
//! release-timer callback forwards into [`DETECTOR`], so all of them are
//! serialised by its critical section.
//!
//! Interrupt handlers receive their GPIO number as the handler argument;
//! button release timers receive their button slot.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::InputLevels;
use crate::error::Error;

// ── Error type ────────────────────────────────────────────────

/// Errors during GPIO and interrupt setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrAddFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrAddFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::GpioConfigFailed(_) => Error::Init("gpio config"),
            HwInitError::IsrInstallFailed(_) => Error::Init("gpio isr service"),
            HwInitError::IsrAddFailed(_) => Error::Init("gpio isr handler"),
        }
    }
}

// ── Output pin ────────────────────────────────────────────────

/// A configured push-pull output, addressed by GPIO number.
#[derive(Debug)]
pub struct GpioOut {
    pin: u8,
    #[cfg(not(target_os = "espidf"))]
    level: bool,
}

impl GpioOut {
    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            #[cfg(not(target_os = "espidf"))]
            level: false,
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Last level written (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn is_set_high(&self) -> bool {
        self.level
    }
}

impl ErrorType for GpioOut {
    type Error = Infallible;
}

impl OutputPin for GpioOut {
    fn set_low(&mut self) -> Result<(), Infallible> {
        gpio_write(self.pin, false);
        #[cfg(not(target_os = "espidf"))]
        {
            self.level = false;
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        gpio_write(self.pin, true);
        #[cfg(not(target_os = "espidf"))]
        {
            self.level = true;
        }
        Ok(())
    }
}

// ── Raw pin access ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: u8) -> bool {
    // SAFETY: gpio_get_level is a read-only register access; safe from
    // any context including ISRs.
    (unsafe { gpio_get_level(i32::from(pin)) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: u8) -> bool {
    false
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: u8, high: bool) {
    // SAFETY: single register write to a pin configured as output.
    unsafe {
        gpio_set_level(i32::from(pin), u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: u8, _high: bool) {}

/// Live levels of the three sensors and two timeout buttons.
#[derive(Debug, Clone, Copy)]
pub struct GpioLevels {
    pins: [u8; 5],
}

impl GpioLevels {
    pub fn new(sensor_pins: [u8; 3], timeout_pins: [u8; 2]) -> Self {
        let [s1, s2, s3] = sensor_pins;
        let [b1, b2] = timeout_pins;
        Self {
            pins: [s1, s2, s3, b1, b2],
        }
    }
}

impl InputLevels for GpioLevels {
    fn levels(&self) -> [bool; 5] {
        self.pins.map(gpio_read)
    }
}

// ── Pin configuration ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn config_pins(
    pins: &[u8],
    mode: gpio_mode_t,
    pull_down: bool,
    intr: gpio_int_type_t,
) -> Result<(), HwInitError> {
    for &pin in pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: if pull_down {
                gpio_pulldown_t_GPIO_PULLDOWN_ENABLE
            } else {
                gpio_pulldown_t_GPIO_PULLDOWN_DISABLE
            },
            intr_type: intr,
        };
        // SAFETY: cfg outlives the call; runs once from the main task.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    Ok(())
}

/// Sensors float (external pull-ups on the beam modules); buttons are
/// pulled down.  Both trigger on any edge.
#[cfg(target_os = "espidf")]
pub fn init_inputs(sensor_pins: &[u8], button_pins: &[u8]) -> Result<(), HwInitError> {
    let any = gpio_int_type_t_GPIO_INTR_ANYEDGE;
    config_pins(sensor_pins, gpio_mode_t_GPIO_MODE_INPUT, false, any)?;
    config_pins(button_pins, gpio_mode_t_GPIO_MODE_INPUT, true, any)?;
    info!("hw_init: inputs configured (sensors={:?}, buttons={:?})", sensor_pins, button_pins);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_inputs(_sensor_pins: &[u8], _button_pins: &[u8]) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): input config skipped");
    Ok(())
}

/// Configure outputs and drive them low.
#[cfg(target_os = "espidf")]
pub fn init_outputs(pins: &[u8]) -> Result<(), HwInitError> {
    config_pins(pins, gpio_mode_t_GPIO_MODE_OUTPUT, false, gpio_int_type_t_GPIO_INTR_DISABLE)?;
    for &pin in pins {
        gpio_write(pin, false);
    }
    info!("hw_init: outputs configured {:?}", pins);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_outputs(_pins: &[u8]) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): output config skipped");
    Ok(())
}

// ── Interrupt wiring (device only) ────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::*;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::sys::*;
    use log::info;

    use super::{GpioOut, HwInitError, gpio_read};
    use crate::config::ControllerConfig;
    use crate::drivers::hw_timer::EspOneShot;
    use crate::error::Error;
    use crate::events::EventFlags;
    use crate::pins;
    use crate::sensors::{EdgeDetector, EdgeDetectorCell, MAX_SENSORS};

    pub type Detector = EdgeDetector<'static, GpioOut, EspOneShot>;

    /// The detector every edge interrupt and release timer drives.
    pub static DETECTOR: EdgeDetectorCell<'static, GpioOut, EspOneShot> = EdgeDetectorCell::new();

    unsafe extern "C" fn sensor_isr(arg: *mut core::ffi::c_void) {
        let pin = arg as usize as u8;
        DETECTOR.sensor_pin_edge(pin, gpio_read(pin));
    }

    unsafe extern "C" fn button_isr(arg: *mut core::ffi::c_void) {
        let pin = arg as usize as u8;
        DETECTOR.button_pin_edge(pin, gpio_read(pin));
    }

    unsafe extern "C" fn sensor_release(_arg: *mut core::ffi::c_void) {
        DETECTOR.sensor_release_elapsed();
    }

    unsafe extern "C" fn button_release(arg: *mut core::ffi::c_void) {
        DETECTOR.button_release_elapsed(arg as usize);
    }

    /// Build the detector from `config` with real outputs and timers.
    pub fn build_detector(config: &ControllerConfig, flags: &'static EventFlags) -> Result<Detector, Error> {
        let [led1, led2] = config.team_led_pins;
        let sensor_timer = EspOneShot::new("sensor_release\0", sensor_release, 0)?;
        let button_timers = [
            EspOneShot::new("pb1_release\0", button_release, 0)?,
            EspOneShot::new("pb2_release\0", button_release, 1)?,
            EspOneShot::new("pb3_release\0", button_release, 2)?,
        ];
        let levels: [bool; MAX_SENSORS] = config.sensor_pins.map(gpio_read);
        EdgeDetector::from_config(
            flags,
            config,
            [GpioOut::new(led1), GpioOut::new(led2)],
            GpioOut::new(pins::TIMEOUT_LED_GPIO),
            sensor_timer,
            button_timers,
            levels,
        )
    }

    /// Register one edge handler per input.  Call after the detector is
    /// installed in [`DETECTOR`].
    pub fn attach_isrs(sensor_pins: &[u8], button_pins: &[u8]) -> Result<(), HwInitError> {
        // SAFETY: handlers are static functions that only enter DETECTOR's
        // critical section; the pin number travels in the argument pointer.
        unsafe {
            let ret = gpio_install_isr_service(0);
            if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
                return Err(HwInitError::IsrInstallFailed(ret));
            }
            for (pins, handler) in [
                (sensor_pins, sensor_isr as unsafe extern "C" fn(*mut core::ffi::c_void)),
                (button_pins, button_isr),
            ] {
                for &pin in pins {
                    let gpio = i32::from(pin);
                    let ret = gpio_isr_handler_add(gpio, Some(handler), usize::from(pin) as *mut _);
                    if ret != ESP_OK as i32 {
                        return Err(HwInitError::IsrAddFailed(ret));
                    }
                    gpio_intr_enable(gpio);
                }
            }
        }
        info!("hw_init: edge interrupts attached");
        Ok(())
    }

    /// Remove every handler registered by [`attach_isrs`].
    pub fn detach_isrs(pins: &[u8]) {
        for &pin in pins {
            // SAFETY: removing a handler that was never added is a no-op
            // error we ignore.
            unsafe {
                gpio_intr_disable(i32::from(pin));
                gpio_isr_handler_remove(i32::from(pin));
            }
        }
        info!("hw_init: edge interrupts detached");
    }
}
