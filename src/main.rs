//! Foosboard firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  I2cLcd          LogEventSink    FileConfigStore   TcpServer   │
//! │  (DisplayPort)   (EventSink)     (ConfigStore)     (Listener)  │
//! │  Ws2812Strip     GpioLevels      WifiAdapter                   │
//! │  (PixelSink)     (InputLevels)   (association)                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          Controller (pure logic, main loop)            │    │
//! │  │  Mode · Menu · Scoreboard · Relay log                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  EdgeDetector (ISR + timers)  ·  AnimationQueue (worker task)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin};
use esp_idf_hal::i2c::{I2cConfig as I2cBusConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{LevelFilter, error, info, warn};

use foosboard::adapters::file_store::{FileConfigStore, mount_flash_fs};
use foosboard::adapters::lcd::I2cLcd;
use foosboard::adapters::log_sink::LogEventSink;
use foosboard::adapters::tcp_server::TcpServer;
use foosboard::adapters::wifi::{CONNECT_ATTEMPTS, WifiAdapter};
use foosboard::adapters::ws2812::Ws2812Strip;
use foosboard::animation::AnimationQueue;
use foosboard::app::events::AppEvent;
use foosboard::app::ports::{ConfigStore, DisplayPort, EventSink, NoPeer};
use foosboard::app::screen;
use foosboard::app::service::{BootStage, Controller, loop_pause_ms};
use foosboard::config::ControllerConfig;
use foosboard::drivers::hw_init::{self, DETECTOR, GpioLevels};
use foosboard::drivers::led_patterns::StripRenderer;
use foosboard::drivers::task_pin::{Core, spawn_on_core};
use foosboard::error::ConfigError;
use foosboard::events::FLAGS;
use foosboard::fsm::context::Mode;
use foosboard::pins;
use foosboard::rpc::engine::{ProtocolEngine, ProtocolEvent, SaveOutcome};
use foosboard::validation::schema::ConfigSchema;
use foosboard::validation::validate;

/// LED commands waiting for the animation worker.
static QUEUE: AnimationQueue = AnimationQueue::new();
/// Cleared at End Program to stop the animation worker.
static ANIMATING: AtomicBool = AtomicBool::new(true);

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Foosboard v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 2. Schema + configuration (fatal on failure) ──────────
    mount_flash_fs()?;
    let schema = ConfigSchema::load(Path::new(pins::SCHEMA_FILE))?;
    let mut store = FileConfigStore::new(pins::CONFIG_FILE);
    let lines = store.read_lines()?;
    let report = validate(&schema, &lines);
    if !report.is_valid() {
        report.log();
        bail!(ConfigError::Invalid(report.issues().len()));
    }
    let config = ControllerConfig::from_lines(&lines)?;
    if config.debug {
        log::set_max_level(LevelFilter::Debug);
    }
    info!("config: {}", serde_json::to_string(&config)?);

    // ── 3. LED strip + animation worker ───────────────────────
    // SAFETY: the strip pin comes from the validated configuration and is
    // not claimed by any other driver.
    let strip_pin = unsafe { AnyOutputPin::new(i32::from(config.strip.pin)) };
    let strip = Ws2812Strip::new(peripherals.rmt.channel0, strip_pin, config.strip.pixels)?;
    let worker = spawn_on_core(Core::App, 5, 8, "leds\0", move || {
        let mut renderer = StripRenderer::new(strip, FreeRtos);
        QUEUE.run(&mut renderer, &mut FreeRtos, &ANIMATING);
    })?;

    let mut controller = Controller::new(config.clone(), &FLAGS, &QUEUE, Mode::Relay);
    controller.show_boot_stage(BootStage::Initializing);

    // ── 4. Display ────────────────────────────────────────────
    // SAFETY: SDA/SCL come from the validated configuration.
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(i32::from(config.i2c.sda)),
            AnyIOPin::new(i32::from(config.i2c.scl)),
        )
    };
    let bus_config = I2cBusConfig::new().baudrate(Hertz(pins::LCD_I2C_FREQ_HZ));
    let i2c = if config.i2c.bus == 0 {
        I2cDriver::new(peripherals.i2c0, sda, scl, &bus_config)?
    } else {
        I2cDriver::new(peripherals.i2c1, sda, scl, &bus_config)?
    };
    let mut lcd = I2cLcd::new(i2c, FreeRtos, pins::LCD_I2C_ADDR, pins::LCD_ROWS, pins::LCD_COLUMNS)?;

    // ── 5. Inputs, indicators, interrupts ─────────────────────
    let [led1, led2] = config.team_led_pins;
    hw_init::init_outputs(&[led1, led2, pins::TIMEOUT_LED_GPIO])?;
    hw_init::init_inputs(&config.sensor_pins, &config.button_pins)?;
    DETECTOR.install(hw_init::build_detector(&config, &FLAGS)?);
    hw_init::attach_isrs(&config.sensor_pins, &config.button_pins)?;

    // ── 6. Network + control server ───────────────────────────
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, Some(nvs))?;
    let ssid = option_env!("FOOSBOARD_WIFI_SSID").unwrap_or_default();
    let password = option_env!("FOOSBOARD_WIFI_PASS").unwrap_or_default();
    if let Err(e) = wifi.set_credentials(ssid, password) {
        warn!("WiFi: {}", e);
    }
    let mut engine = match wifi.connect(CONNECT_ATTEMPTS) {
        Ok(ip) => {
            controller.show_boot_stage(BootStage::NetworkUp);
            controller.set_host(Some(ip));
            let server = TcpServer::bind(config.port)?;
            Some(ProtocolEngine::new(server, schema))
        }
        Err(e) => {
            warn!("network unavailable: {}", e);
            controller.show_boot_stage(BootStage::NetworkDown);
            controller.degrade_to_stand_alone();
            None
        }
    };
    controller.show_boot_stage(BootStage::Ready);

    // ── 7. Main loop ──────────────────────────────────────────
    let mut sink = LogEventSink::new();
    if config.debug {
        info!("settings: {}", screen::settings_summary(controller.settings()));
    }
    controller.start(&mut lcd, &mut sink);
    if let Some(engine) = engine.as_ref() {
        controller.log_line(&mut lcd, format!("listening on :{}", engine.port()));
    }
    controller.show_boot_stage(BootStage::Running);

    let levels = GpioLevels::new(config.sensor_pins, [config.button_pins[0], config.button_pins[1]]);
    info!("System ready. Entering main loop.");

    while controller.keep_running() {
        match engine.as_mut() {
            Some(server) => {
                for event in server.poll(&mut store) {
                    match event {
                        ProtocolEvent::Connected { peer, count } => {
                            controller.client_connected(&mut lcd, &mut sink, &peer, count);
                        }
                        ProtocolEvent::Disconnected => controller.client_disconnected(&mut sink),
                        ProtocolEvent::ResetRequested => {
                            shutdown(&mut lcd, &config);
                            // SAFETY: esp_restart never returns.
                            unsafe { esp_idf_svc::sys::esp_restart() };
                        }
                        ProtocolEvent::ConfigSent(n) => info!("proto: sent {} config lines", n),
                        ProtocolEvent::Saved(SaveOutcome::Written { .. }) => {
                            sink.emit(&AppEvent::ConfigSaved);
                        }
                        ProtocolEvent::Saved(outcome) => info!("proto: save {:?}", outcome),
                    }
                }
                controller.process_pending(&mut lcd, server, &mut sink);
            }
            None => controller.process_pending(&mut lcd, &mut NoPeer, &mut sink),
        }
        controller.refresh_inputs(&mut lcd, &levels);
        FreeRtos::delay_ms(loop_pause_ms(engine.is_some()));
    }

    // ── 8. End Program ────────────────────────────────────────
    if let Some(server) = engine.as_mut() {
        server.close();
    }
    shutdown(&mut lcd, &config);
    ANIMATING.store(false, Ordering::Release);
    if worker.join().is_err() {
        error!("animation worker panicked");
    }
    wifi.disconnect();
    info!("Program ended.");
    Ok(())
}

/// Silence every output and stop all input handling.
fn shutdown(lcd: &mut impl DisplayPort, config: &ControllerConfig) {
    let mut pins_in_use: Vec<u8> = config.sensor_pins.to_vec();
    pins_in_use.extend_from_slice(&config.button_pins);
    hw_init::detach_isrs(&pins_in_use);
    if let Some(mut detector) = DETECTOR.take() {
        detector.shutdown();
    }
    FLAGS.clear_pending();
    lcd.power_off();
}
