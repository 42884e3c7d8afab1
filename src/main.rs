//! Doorwatch Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     LogEventSink   NvsAdapter   Esp32System   │
//! │  (Sensor+Indicator)  (EventSink)    (Config)     (SystemPort)  │
//! │  WifiAdapter         MqttAdapter                               │
//! │  (Connectivity)      (PubSubClient)                            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              DoorMonitor (pure logic)                  │    │
//! │  │  Debounce · DoorFsm · Telemetry · CommandDispatcher    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Watchdog (fed per iteration) · BOOT button (stop request)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use doorwatch::adapters::device_id;
use doorwatch::adapters::hardware::HardwareAdapter;
use doorwatch::adapters::log_sink::LogEventSink;
use doorwatch::adapters::mqtt::MqttAdapter;
use doorwatch::adapters::nvs::NvsAdapter;
use doorwatch::adapters::system::Esp32System;
use doorwatch::adapters::wifi::WifiAdapter;
use doorwatch::app::ports::SystemPort;
use doorwatch::app::service::DoorMonitor;
use doorwatch::config::{self, BuildOverrides};
use doorwatch::drivers::status_led::StatusLed;
use doorwatch::drivers::watchdog::Watchdog;
use doorwatch::pins;
use doorwatch::sensors::debounce::DebounceDetector;
use doorwatch::sensors::door_contact::DoorContact;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Doorwatch v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Config from NVS (seeded on first boot) ─────────────
    let nvs = NvsAdapter::new(nvs_partition.clone());
    let config = config::load_or_seed(&nvs, &BuildOverrides::from_env());
    if !config.is_provisioned() {
        warn!("Config: no WiFi credentials, running offline until provisioned");
    }

    // ── 3. Status LED (LEDC, shared timer) ────────────────────
    let led_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new().frequency(Hertz(pins::LED_PWM_FREQ_HZ)),
    )?;
    let red = LedcDriver::new(peripherals.ledc.channel0, &led_timer, peripherals.pins.gpio25)?;
    let green = LedcDriver::new(peripherals.ledc.channel1, &led_timer, peripherals.pins.gpio26)?;
    let blue = LedcDriver::new(peripherals.ledc.channel2, &led_timer, peripherals.pins.gpio27)?;
    info!(
        "LED: R/G/B on GPIO{}/{}/{}",
        pins::LED_R_GPIO,
        pins::LED_G_GPIO,
        pins::LED_B_GPIO
    );

    // ── 4. Door contact and BOOT button (pull-ups) ────────────
    let mut contact_pin = PinDriver::input(peripherals.pins.gpio4.downgrade_input())?;
    contact_pin.set_pull(Pull::Up)?;
    info!("Door: contact on GPIO{}", pins::DOOR_CONTACT_GPIO);

    let mut stop_pin = PinDriver::input(peripherals.pins.gpio0.downgrade_input())?;
    stop_pin.set_pull(Pull::Up)?;

    let mut hw = HardwareAdapter::new(
        DoorContact::new(contact_pin),
        StatusLed::new(red, green, blue),
    );

    // ── 5. Identity and network ───────────────────────────────
    let mac = device_id::read_mac();
    let identity = device_id::resolve_client_id(&config.client_id, &mac);
    let hostname = device_id::hostname(&mac);
    info!("Device: client id '{}' (hostname: {})", identity, hostname);

    let mut esp_wifi = EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs_partition))?;
    if let Err(e) = esp_wifi.sta_netif_mut().set_hostname(&hostname) {
        warn!("WiFi: hostname not set ({})", e);
    }
    let mut net = WifiAdapter::new(
        BlockingWifi::wrap(esp_wifi, sys_loop)?,
        config.wifi_connect_timeout_ms,
    );
    if config.is_provisioned() {
        if let Err(e) = net.set_credentials(&config.wifi_ssid, &config.wifi_password) {
            warn!("WiFi: stored credentials rejected ({})", e);
        }
    }

    // ── 6. Door monitor ───────────────────────────────────────
    let mut system = Esp32System::new();
    let mut sink = LogEventSink::new();
    let mqtt = MqttAdapter::new(config.wifi_connect_timeout_ms);
    let mut monitor = DoorMonitor::new(config.clone(), mqtt, &identity, system.uptime_ms());

    if let Err(e) = monitor.start(&mut hw, &mut net, &mut system, &mut sink) {
        warn!("Startup: offline ({}), will keep retrying", e);
    }

    // ── 7. Control loop ───────────────────────────────────────
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    // BOOT held low for the debounce window requests an orderly stop.
    let mut stop_debounce =
        DebounceDetector::new(config.debounce_window_ms, false, system.uptime_ms());
    let should_stop = move |now_ms: u64| {
        stop_debounce
            .sample(stop_pin.is_low(), now_ms)
            .is_some_and(|s| s.level)
    };

    monitor.run(
        &mut hw,
        &mut net,
        &mut system,
        &mut sink,
        should_stop,
        || watchdog.feed(),
    );

    info!("Stop requested on GPIO{}; program exiting", pins::STOP_BUTTON_GPIO);
    Ok(())
}
