//! WiFi station-mode adapter.
//!
//! Associates with the configured access point at startup and reports the
//! local address for the Show Host screen and the connection banner.  There
//! is no roaming or background reconnection: if association fails after
//! the allotted attempts the controller runs stand-alone without a server.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation that associates immediately on loopback.

use core::fmt;
use log::{error, info, warn};

use crate::error::CommsError;

/// Association attempts made at startup.
pub const CONNECT_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
        }
    }
}

/// Space through tilde.
fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting { attempt: u32 },
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), CredentialError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CredentialError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(CredentialError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    ip: Option<String>,
    #[cfg(target_os = "espidf")]
    driver: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: esp_idf_hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
    ) -> Result<Self, crate::error::Error> {
        use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

        let wifi = EspWifi::new(modem, sysloop.clone(), nvs)
            .map_err(|_| crate::error::Error::Init("wifi driver"))?;
        let driver = BlockingWifi::wrap(wifi, sysloop)
            .map_err(|_| crate::error::Error::Init("wifi event loop"))?;
        Ok(Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            ip: None,
            driver,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            ip: None,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    /// Local IPv4 address, once associated.
    pub fn local_ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), CredentialError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|_| CredentialError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| CredentialError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Try to associate up to `attempts` times.  Returns the local address.
    pub fn connect(&mut self, attempts: u32) -> Result<String, CommsError> {
        if self.ssid.is_empty() {
            warn!("WiFi: no SSID configured");
            self.state = WifiState::Failed;
            return Err(CommsError::NetworkUnavailable);
        }
        for attempt in 1..=attempts {
            info!("WiFi: connecting to '{}' (attempt {})", self.ssid, attempt);
            self.state = WifiState::Connecting { attempt };
            match self.platform_connect() {
                Ok(ip) => {
                    info!("WiFi: connected, IP {}", ip);
                    self.state = WifiState::Connected;
                    self.ip = Some(ip.clone());
                    return Ok(ip);
                }
                Err(e) => warn!("WiFi: attempt {} failed: {}", attempt, e),
            }
        }
        error!("WiFi: giving up after {} attempts", attempts);
        self.state = WifiState::Failed;
        Err(CommsError::NetworkUnavailable)
    }

    pub fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.ip = None;
        info!("WiFi: disconnected");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<String, esp_idf_svc::sys::EspError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        self.driver
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: self.ssid.clone(),
                password: self.password.clone(),
                auth_method,
                ..Default::default()
            }))?;
        if !self.driver.is_started()? {
            self.driver.start()?;
        }
        self.driver.connect()?;
        self.driver.wait_netif_up()?;
        let info = self.driver.wifi().sta_netif().get_ip_info()?;
        Ok(info.ip.to_string())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<String, CommsError> {
        Ok(std::net::Ipv4Addr::LOCALHOST.to_string())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi: disconnect failed: {}", e);
        }
        if let Err(e) = self.driver.stop() {
            warn!("WiFi: stop failed: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {}
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
