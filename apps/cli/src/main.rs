//! `bq28z610`: command line tool for the TI BQ28Z610 fuel gauge on a Linux
//! I2C bus.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linux_embedded_hal::I2cdev;
use tracing_subscriber::EnvFilter;

use bq28z610_core::flags::{self, FlagDef};
use bq28z610_core::{
    Gauge, HalTransport, LearningCycleConfig, SecurityMode, TracingObserver,
};

#[derive(Parser)]
#[command(name = "bq28z610", version, about = "BQ28Z610 battery fuel gauge tool")]
struct Cli {
    /// I2C character device the gauge sits on.
    #[arg(long, default_value = "/dev/i2c-1")]
    bus: String,

    /// 7-bit device address.
    #[arg(long, default_value = "0x55", value_parser = parse_hex_u8)]
    address: u8,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Device type, firmware and hardware versions, chemical ID.
    Info,
    /// Voltages, currents, temperature, capacity and charge state.
    Status,
    /// Decode the status words into their documented flags.
    Flags,
    /// Report the current security mode.
    Security,
    /// Unseal the device (default key unless one is given).
    Unseal {
        #[arg(value_parser = parse_hex_u32)]
        key: Option<u32>,
    },
    /// Step up to full access (default key unless one is given).
    FullAccess {
        #[arg(value_parser = parse_hex_u32)]
        key: Option<u32>,
    },
    /// Seal the device.
    Seal,
    /// Read raw bytes from data flash.
    Read {
        #[arg(value_parser = parse_hex_u16)]
        address: u16,
        #[arg(default_value_t = 32)]
        len: usize,
    },
    /// Read a little-endian word from data flash.
    ReadWord {
        #[arg(value_parser = parse_hex_u16)]
        address: u16,
    },
    /// Write a little-endian word to data flash.
    WriteWord {
        #[arg(value_parser = parse_hex_u16)]
        address: u16,
        #[arg(value_parser = parse_hex_u16)]
        value: u16,
    },
    /// Write the per-cell Qmax values (pack Qmax becomes the minimum).
    Qmax { cell_1: u16, cell_2: u16 },
    /// Reset the Ra-table flag words to learning defaults.
    RaReset,
    /// Show the Ra-table flag words.
    RaTable,
    /// Seed the gauge for a learning cycle from a TOML config.
    LearningInit {
        #[arg(long)]
        config: String,
    },
    /// One-shot learning-cycle log line.
    Snapshot,
    /// Stop charging at 60% SOC (on) or restore normal charging (off).
    SocThreshold { enabled: bool },
    /// Force the charge FET into a test state.
    ChargeFet { on: bool },
    /// Force the discharge FET into a test state.
    DischargeFet { on: bool },
    /// Set ManufacturingStatus[FET_EN].
    FetControl { enabled: bool },
    /// Dump the whole data-flash region.
    DumpFlash,
    /// Reset the gauge.
    Reset,
}

fn parse_hex_u8(s: &str) -> Result<u8, String> {
    parse_hex_u32(s)?
        .try_into()
        .map_err(|_| format!("value out of range: {s}"))
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    parse_hex_u32(s)?
        .try_into()
        .map_err(|_| format!("value out of range: {s}"))
}

fn parse_hex_u32(s: &str) -> Result<u32, String> {
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    u32::from_str_radix(digits, radix).map_err(|e| format!("invalid number {s}: {e}"))
}

fn print_flags(label: &str, value: u32, table: &'static [FlagDef]) {
    println!("{label}: {value:#010X}");
    for flag in flags::active_flags(table, value) {
        println!("  [{}] {}", flag.name, flag.description);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let bus = I2cdev::new(&cli.bus)
        .with_context(|| format!("Failed to open I2C bus {}", cli.bus))?;
    let transport = HalTransport::with_address(bus, cli.address);
    let gauge = Gauge::with_observer(transport, Arc::new(TracingObserver));

    match cli.command {
        Command::Info => {
            println!("Device type:  {:#06X}", gauge.device_type()?);
            let fw = gauge.firmware_version()?;
            println!(
                "Firmware:     {:04X} version {:04X} build {:04X} (type {:02X}, IT {:04X})",
                fw.device_number, fw.version, fw.build, fw.firmware_type,
                fw.impedance_track_version
            );
            println!("Hardware:     {:#06X}", gauge.hardware_version()?);
            println!("Chemical ID:  {:#06X}", gauge.chemical_id()?);
            println!("Device name:  {}", gauge.device_name()?);
            println!("Manufacturer: {}", gauge.manufacturer_name()?);
            println!("Chemistry:    {}", gauge.device_chemistry()?);
        }
        Command::Status => {
            println!("Voltage:            {} mV", gauge.voltage_mv()?);
            println!("Current:            {} mA", gauge.current_ma()?);
            println!("Average current:    {} mA", gauge.average_current_ma()?);
            println!("Temperature:        {:.1} C", gauge.temperature_c()?);
            println!("State of charge:    {} %", gauge.relative_state_of_charge()?);
            println!("State of health:    {} %", gauge.state_of_health()?);
            println!("Remaining capacity: {} mAh", gauge.remaining_capacity_mah()?);
            println!("Full capacity:      {} mAh", gauge.full_charge_capacity_mah()?);
            println!("Design capacity:    {} mAh", gauge.design_capacity_mah()?);
            println!("Cycle count:        {}", gauge.cycle_count()?);
            println!("Charging voltage:   {} mV", gauge.charging_voltage_mv()?);
            println!("Charging current:   {} mA", gauge.charging_current_ma()?);
        }
        Command::Flags => {
            print_flags(
                "BatteryStatus",
                gauge.battery_status()?.into(),
                flags::battery_status::ALL,
            );
            print_flags(
                "OperationStatus",
                gauge.operation_status()?,
                flags::operation_status::ALL,
            );
            print_flags(
                "SafetyAlert",
                gauge.safety_alert()?,
                flags::safety_status::ALL,
            );
            print_flags(
                "SafetyStatus",
                gauge.safety_status()?,
                flags::safety_status::ALL,
            );
            print_flags("PFAlert", gauge.pf_alert()?, flags::pf_status::ALL);
            print_flags("PFStatus", gauge.pf_status()?, flags::pf_status::ALL);
            print_flags(
                "ChargingStatus",
                gauge.charging_status()?.into(),
                flags::charging_status::ALL,
            );
            print_flags(
                "GaugingStatus",
                gauge.gauging_status()?,
                flags::gauging_status::ALL,
            );
            print_flags(
                "ManufacturingStatus",
                gauge.manufacturing_status()?.into(),
                flags::manufacturing_status::ALL,
            );
            if gauge.is_permanent_fail()? {
                println!("\nThe device is in PERMANENT FAIL");
            }
        }
        Command::Security => {
            println!("Security mode: {}", gauge.security_mode()?);
        }
        Command::Unseal { key } => {
            gauge.unseal(key.unwrap_or(bq28z610_core::protocol::constants::DEFAULT_UNSEAL_KEY))?;
            println!("Security mode: {}", gauge.security_mode()?);
        }
        Command::FullAccess { key } => {
            gauge.full_access(
                key.unwrap_or(bq28z610_core::protocol::constants::DEFAULT_FULL_ACCESS_KEY),
            )?;
            println!("Security mode: {}", gauge.security_mode()?);
        }
        Command::Seal => {
            gauge.seal()?;
            println!("Security mode: {}", gauge.security_mode()?);
        }
        Command::Read { address, len } => {
            let data = gauge.read_flash(address, len)?;
            print_hex_row(address, &data);
        }
        Command::ReadWord { address } => {
            let value = gauge.read_flash_word(address)?;
            println!("{address:#06X} = {value:#06X} ({value})");
        }
        Command::WriteWord { address, value } => {
            gauge.write_flash_word(address, value)?;
            println!("{address:#06X} <- {value:#06X}");
        }
        Command::Qmax { cell_1, cell_2 } => {
            gauge.write_qmax(cell_1, cell_2)?;
            println!(
                "Qmax set: cell1 {cell_1}, cell2 {cell_2}, pack {}",
                cell_1.min(cell_2)
            );
        }
        Command::RaReset => {
            gauge.reset_ra_table_flags()?;
            println!("Ra-table flags reset");
        }
        Command::RaTable => {
            for (address, value) in gauge.read_ra_table_flags()? {
                println!("{address:#06X} = {value:#06X}");
            }
        }
        Command::LearningInit { config } => {
            let config = LearningCycleConfig::load_from_file(&config)?;
            confirm_unsealed(&gauge)?;
            gauge.learning_cycle_init(&config)?;
            println!("Learning cycle initialized: {config:?}");
        }
        Command::Snapshot => {
            let snap = gauge.learning_cycle_snapshot()?;
            println!(
                "{};{};{};{};{:.1};{};{};{};{};{:#010X};{:#04X}",
                snap.cell_voltage_1_mv,
                snap.cell_voltage_2_mv,
                snap.pack_voltage_mv,
                snap.current_ma,
                snap.temperature_c,
                snap.state_of_charge,
                snap.qmax_cell_1,
                snap.qmax_cell_2,
                snap.qmax_pack,
                snap.gauging_status,
                snap.update_status,
            );
        }
        Command::SocThreshold { enabled } => {
            gauge.set_charging_soc_threshold(enabled)?;
            println!(
                "Charging SOC threshold {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        Command::ChargeFet { on } => gauge.set_charge_fet(on)?,
        Command::DischargeFet { on } => gauge.set_discharge_fet(on)?,
        Command::FetControl { enabled } => gauge.set_fet_control(enabled)?,
        Command::DumpFlash => {
            for (address, row) in gauge.dump_flash()? {
                print_hex_row(address, &row);
            }
        }
        Command::Reset => {
            gauge.device_reset()?;
            println!("Device reset issued");
        }
    }

    Ok(())
}

fn print_hex_row(address: u16, data: &[u8]) {
    print!("{address:#06X}:");
    for byte in data {
        print!(" {byte:02X}");
    }
    println!();
}

fn confirm_unsealed<T, O>(gauge: &Gauge<T, O>) -> Result<()>
where
    T: bq28z610_core::GaugeTransport,
    O: bq28z610_core::GaugeObserver,
{
    if gauge.security_mode()? == SecurityMode::Sealed {
        gauge.unseal_default()?;
        anyhow::ensure!(
            gauge.security_mode()? != SecurityMode::Sealed,
            "device stayed sealed; pass the correct unseal key first"
        );
    }
    Ok(())
}
