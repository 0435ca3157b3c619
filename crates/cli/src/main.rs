//! pollswitch CLI: inspect the mouse and switch its polling rate.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pollswitch_core::buttons::SpdtMode;
use pollswitch_core::comm::{check_device_status, DeviceStatus, ErrorClass};
use pollswitch_core::device::{list_interfaces, HidBackend};
use pollswitch_core::profile::Profile;
use pollswitch_core::safety::FLASH_DISCLAIMER;
use pollswitch_core::{ConfigStore, DeviceSelector, PollingRate, RateProfile, DEFAULT_SELECTOR};

fn parse_hex_u16(s: &str) -> std::result::Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}

/// Overrides for the HID interface to talk to.
#[derive(Args)]
struct SelectorArgs {
    /// USB vendor ID (hex).
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    vid: Option<u16>,
    /// USB product ID (hex).
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    pid: Option<u16>,
    /// HID usage of the configuration interface (hex).
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    usage: Option<u16>,
    /// HID usage page of the configuration interface (hex).
    #[arg(long = "usage-page", global = true, value_parser = parse_hex_u16)]
    usage_page: Option<u16>,
}

impl SelectorArgs {
    fn selector(&self) -> DeviceSelector {
        DeviceSelector {
            vendor_id: self.vid.unwrap_or(DEFAULT_SELECTOR.vendor_id),
            product_id: self.pid.unwrap_or(DEFAULT_SELECTOR.product_id),
            usage: self.usage.unwrap_or(DEFAULT_SELECTOR.usage),
            usage_page: self.usage_page.unwrap_or(DEFAULT_SELECTOR.usage_page),
        }
    }
}

#[derive(Parser)]
#[command(
    name = "pollswitch",
    version,
    about = "Polling-rate switcher for 8 kHz gaming mice"
)]
struct Cli {
    #[command(flatten)]
    selector: SelectorArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List HID interfaces of the mouse.
    ListDevices,
    /// Print the firmware version.
    Version,
    /// Show the current configuration.
    Show {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Set polling rate: high, low, or 8000/4000/2000/1000 Hz.
    SetRate {
        /// Profile name or rate in Hz.
        value: String,
    },
    /// Check whether the mouse responds.
    Status,
    /// Restore factory settings.
    FactoryReset {
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },
}

fn parse_rate(value: &str) -> Result<PollingRate> {
    if let Some(profile) = RateProfile::from_name(value) {
        return Ok(profile.rate());
    }
    let hz: u32 = value
        .trim_end_matches("Hz")
        .trim_end_matches("hz")
        .trim()
        .parse()
        .with_context(|| format!("'{value}' is neither a profile name nor a rate in Hz"))?;
    PollingRate::from_hz(hz).ok_or_else(|| {
        anyhow::anyhow!(
            "Unsupported polling rate {hz} Hz. Valid rates: {}",
            PollingRate::ALL
                .iter()
                .map(|r| r.as_hz().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

/// Attach the classification hint to a core error.
fn explain(err: pollswitch_core::Error) -> anyhow::Error {
    let hint = ErrorClass::classify(&err).hint();
    anyhow::Error::new(err).context(hint)
}

fn print_profile(profile: &Profile) {
    if let Some(fw) = &profile.firmware {
        println!("Firmware:       {fw}");
    }
    match profile.polling_rate {
        Some(rate) => println!("Polling rate:   {rate} (divisor {})", profile.polling_divisor),
        None => println!("Polling rate:   unknown (divisor {})", profile.polling_divisor),
    }
    println!("Lift-off:       {}", profile.lift_off_distance);
    println!("Angle snapping: {}", profile.angle_snapping);
    println!("Ripple control: {}", profile.ripple_control);
    println!("Motion sync:    {}", profile.motion_sync);
    println!("CPI levels:     {}", profile.cpi_levels);
    for (i, cpi) in profile.active_cpis().iter().enumerate() {
        if cpi.xy_split {
            println!("  CPI {i}: {} x {}", cpi.x, cpi.y);
        } else {
            println!("  CPI {i}: {}", cpi.x);
        }
    }
    for btn in &profile.buttons {
        match btn.spdt_mode {
            SpdtMode::Off => println!("Button {}: {}", btn.index, btn.label),
            mode => println!("Button {}: {} ({mode:?})", btn.index, btn.label),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let selector = cli.selector.selector();
    tracing::debug!(%selector, "Using device selector");

    match cli.command {
        Commands::ListDevices => {
            let backend = HidBackend::new().map_err(explain)?;
            let interfaces = list_interfaces(&backend, &selector).map_err(explain)?;
            if interfaces.is_empty() {
                println!("No interfaces found for {selector}.");
                println!("Ensure your mouse is connected and the hidraw nodes are accessible.");
            } else {
                for iface in &interfaces {
                    let marker = if selector.matches(iface) { "*" } else { " " };
                    println!(
                        "{marker} {} (interface {}, usage 0x{:04X}, usage page 0x{:04X}, path: {})",
                        iface.product.as_deref().unwrap_or("unknown"),
                        iface.interface_number,
                        iface.usage,
                        iface.usage_page,
                        iface.path
                    );
                }
            }
        }
        Commands::Version => {
            let store = ConfigStore::with_hidapi(selector).map_err(explain)?;
            let version = store.query_version().map_err(explain)?;
            println!("Firmware version: {version}");
        }
        Commands::Show { json } => {
            let store = ConfigStore::with_hidapi(selector).map_err(explain)?;
            let version = store.query_version().map_err(explain)?;
            store.load().map_err(explain)?;
            let profile = Profile::from_record(&store.snapshot(), Some(version));
            if json {
                println!("{}", profile.to_json_pretty()?);
            } else {
                print_profile(&profile);
            }
        }
        Commands::SetRate { value } => {
            let rate = parse_rate(&value)?;
            let store = ConfigStore::with_hidapi(selector).map_err(explain)?;
            store.load().map_err(explain)?;
            if store.polling_rate() == Some(rate) {
                println!("Polling rate already {rate}");
                return Ok(());
            }
            eprintln!("{FLASH_DISCLAIMER}");
            store.apply_rate(rate).map_err(explain)?;
            println!("Polling rate set to {rate}");
        }
        Commands::Status => {
            let store = ConfigStore::with_hidapi(selector).map_err(explain)?;
            match check_device_status(&store) {
                DeviceStatus::Connected => {
                    let path = store.device_path().unwrap_or_default();
                    println!("Connected ({path})");
                }
                DeviceStatus::Disconnected => println!("Disconnected"),
                DeviceStatus::PermissionError => {
                    println!("Permission denied: {}", ErrorClass::PermissionDenied.hint())
                }
                DeviceStatus::Error => println!("Error: device did not respond as expected"),
            }
        }
        Commands::FactoryReset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to reset without --yes");
            }
            let store = ConfigStore::with_hidapi(selector).map_err(explain)?;
            store.factory_reset().map_err(explain)?;
            println!("Factory settings restored");
        }
    }

    Ok(())
}
