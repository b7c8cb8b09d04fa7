//! Dump-load regulator firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogEventSink   NvsRegion    MonotonicClock │
//! │  (Sample+DumpLoad)  (EventSink)    (Storage)    (TimePort)     │
//! │  EspHttpServer ──▶ SurfaceBridge                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          RegulatorService (pure logic)                 │    │
//! │  │  ConfigStore · hysteresis                              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Ticker (1 Hz control) · Watchdog                              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::http::Method as HttpMethod;
use esp_idf_svc::http::server::{Configuration as HttpConfig, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::io::{Read, Write};
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration as WifiConfig, EspWifi};
use log::{error, info, warn};

use dumpload::adapters::hardware::HardwareAdapter;
use dumpload::adapters::log_sink::LogEventSink;
use dumpload::adapters::nvs::NvsRegion;
use dumpload::adapters::time::MonotonicClock;
use dumpload::app::ports::TimePort;
use dumpload::app::service::RegulatorService;
use dumpload::config::{SERVICE_POLL_MS, SURFACE_BUDGET_PER_POLL, TICK_INTERVAL_MS};
use dumpload::drivers::dump_load::DumpLoadSwitch;
use dumpload::drivers::watchdog::Watchdog;
use dumpload::error::Error;
use dumpload::pins;
use dumpload::scheduler::Ticker;
use dumpload::sensors::ina226::{self, Ina226};
use dumpload::store::{ConfigStore, REGION_SIZE};
use dumpload::surface::channels::SurfaceBridge;
use dumpload::surface::form::MAX_FORM_LEN;
use dumpload::surface::handler::{self, Method, Response};

/// Shared between the HTTP server task and the control loop.
static BRIDGE: SurfaceBridge = SurfaceBridge::new();

/// How long an HTTP handler waits for the loop to answer.
const SURFACE_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

const WIFI_SSID: Option<&str> = option_env!("DUMPLOAD_WIFI_SSID");
const WIFI_PASS: Option<&str> = option_env!("DUMPLOAD_WIFI_PASS");

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Dumpload regulator v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let mut watchdog = Watchdog::new();

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let region = NvsRegion::open(REGION_SIZE).map_err(|e| anyhow::anyhow!("NVS open failed: {e}"))?;
    let mut store = ConfigStore::new(region);
    store.load();

    // ── 3. Construct hardware adapters ────────────────────────
    // SAFETY: pin numbers come from the board map in `pins` and are not
    // claimed by any other driver.
    let (sda, scl, gate) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyOutputPin::new(pins::DUMP_LOAD_GPIO),
        )
    };
    let i2c_config = I2cConfig::new()
        .baudrate(Hertz(pins::I2C_BAUD_HZ))
        .timeout(Duration::from_millis(u64::from(pins::I2C_TIMEOUT_MS)).into());
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_config)?;
    let monitor = Ina226::new(i2c, ina226::DEFAULT_ADDRESS, pins::SHUNT_OHMS);
    let switch = DumpLoadSwitch::new(PinDriver::output(gate)?, pins::DUMP_LOAD_POLARITY)
        .map_err(|e| anyhow::anyhow!("dump-load pin: {e}"))?;
    let mut hw = HardwareAdapter::new(monitor, switch);
    let mut sink = LogEventSink::new();
    let mut service = RegulatorService::new(store);

    // ── 4. Sensor check: no monitor, no regulator ─────────────
    let started = hw
        .probe()
        .map_err(Error::from)
        .and_then(|()| service.start(&mut hw, &mut sink));
    if let Err(e) = started {
        // Halt without serving; the watchdog resets the device.
        error!("Startup failed: {}; halting", e);
        loop {
            std::thread::sleep(Duration::from_secs(1));
        }
    }
    BRIDGE.publish_status(service.status());

    // ── 5. Network surface (optional) ─────────────────────────
    let _wifi = match connect_wifi(peripherals.modem, sysloop) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("WiFi unavailable ({}), regulating without surface", e);
            None
        }
    };
    let _server = match start_http_server() {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("HTTP server failed to start: {}", e);
            None
        }
    };

    // ── 6. Main loop ──────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut ticker = Ticker::starting_at(clock.uptime_ms(), TICK_INTERVAL_MS);
    info!("Entering control loop ({} ms tick)", TICK_INTERVAL_MS);

    loop {
        BRIDGE.serve_pending(&mut service, &mut sink, SURFACE_BUDGET_PER_POLL);

        if ticker.poll(clock.uptime_ms()) {
            service.tick(&mut hw, &mut sink);
            BRIDGE.publish_status(service.status());
        }

        watchdog.feed();
        let wait = ticker.until_due(clock.uptime_ms()).min(u64::from(SERVICE_POLL_MS));
        std::thread::sleep(Duration::from_millis(wait.max(1)));
    }
}

fn connect_wifi(
    modem: esp_idf_hal::modem::Modem,
    sysloop: EspSystemEventLoop,
) -> Result<BlockingWifi<EspWifi<'static>>> {
    let (Some(ssid), Some(pass)) = (WIFI_SSID, WIFI_PASS) else {
        anyhow::bail!("no credentials compiled in");
    };
    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), None)?, sysloop)?;
    wifi.set_configuration(&WifiConfig::Client(ClientConfiguration {
        ssid: ssid.try_into().map_err(|_| anyhow::anyhow!("SSID too long"))?,
        password: pass.try_into().map_err(|_| anyhow::anyhow!("password too long"))?,
        auth_method: if pass.is_empty() { AuthMethod::None } else { AuthMethod::WPA2Personal },
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;
    info!("WiFi: connected to '{}'", ssid);
    Ok(wifi)
}

fn start_http_server() -> Result<EspHttpServer<'static>> {
    let mut server = EspHttpServer::new(&HttpConfig::default())?;

    for path in [handler::ROUTE_ROOT, handler::ROUTE_STATUS] {
        server.fn_handler(path, HttpMethod::Get, |req| -> Result<()> {
            match BRIDGE.latest_status() {
                Some(view) => {
                    let body = serde_json::to_string(&view).map_err(|e| anyhow::anyhow!("{e}"))?;
                    send(req, Response::Json { status: 200, body })
                }
                None => forward(req, Method::Get, &[]),
            }
        })?;
    }
    server.fn_handler(handler::ROUTE_CONFIG, HttpMethod::Get, |req| -> Result<()> {
        forward(req, Method::Get, &[])
    })?;
    server.fn_handler(handler::ROUTE_CONFIG, HttpMethod::Post, |mut req| -> Result<()> {
        let mut body = [0u8; MAX_FORM_LEN + 1];
        let mut len = 0;
        while len < body.len() {
            let n = req.read(&mut body[len..])?;
            if n == 0 {
                break;
            }
            len += n;
        }
        forward(req, Method::Post, &body[..len])
    })?;

    info!("HTTP server listening");
    Ok(server)
}

/// Hand the request to the control loop and relay its answer.
fn forward(req: Request<&mut EspHttpConnection<'_>>, method: Method, body: &[u8]) -> Result<()> {
    let path = req.uri().to_owned();
    let response = match BRIDGE.submit(method, &path, body, SURFACE_REPLY_TIMEOUT) {
        Ok(r) => r,
        Err(e) => Response::Json {
            status: e.status(),
            body: format!(r#"{{"error":"{:?}"}}"#, e),
        },
    };
    send(req, response)
}

fn send(req: Request<&mut EspHttpConnection<'_>>, response: Response) -> Result<()> {
    match response {
        Response::Json { status, body } => {
            let mut resp = req.into_response(status, None, &[("Content-Type", "application/json")])?;
            resp.write_all(body.as_bytes())?;
        }
        Response::Redirect { location } => {
            req.into_response(303, None, &[("Location", location)])?;
        }
    }
    Ok(())
}
