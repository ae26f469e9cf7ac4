//! Register map, subcommand catalog and fixed device parameters for the
//! BQ28Z610 (TI SLUUA65, chapter 12).

use std::time::Duration;

/// 7-bit I2C address of the gauge.
pub const DEVICE_ADDRESS: u8 = 0x55;

// ==================== Block protocol geometry ====================

/// Full AltManufacturerAccess response: address echo + payload + checksum + length.
pub const FRAME_SIZE: usize = 36;
/// Largest payload a single frame carries (also the bus transaction limit).
pub const PAYLOAD_MAX: usize = 32;
/// Address echo bytes at the head of the frame.
pub const ADDR_SIZE: usize = 2;
/// Checksum byte + length byte at the tail of the frame.
pub const TRAILER_SIZE: usize = 2;
/// Non-payload bytes counted by the length field: echo + checksum + length.
pub const SERVICE_SIZE: usize = 4;
/// Offset of the first payload byte.
pub const DATA_INDEX: usize = 2;
/// Offset of the checksum byte.
pub const CHECKSUM_INDEX: usize = 34;
/// Offset of the total-length byte.
pub const LENGTH_INDEX: usize = 35;

// ==================== Standard data commands (12.1) ====================

pub const REG_MANUFACTURER_ACCESS_CONTROL: u8 = 0x00;
pub const REG_TEMPERATURE: u8 = 0x06;
pub const REG_VOLTAGE: u8 = 0x08;
pub const REG_BATTERY_STATUS: u8 = 0x0A;
pub const REG_CURRENT: u8 = 0x0C;
pub const REG_REMAINING_CAPACITY: u8 = 0x10;
pub const REG_FULL_CHARGE_CAPACITY: u8 = 0x12;
pub const REG_AVERAGE_CURRENT: u8 = 0x14;
pub const REG_CYCLE_COUNT: u8 = 0x2A;
pub const REG_RELATIVE_STATE_OF_CHARGE: u8 = 0x2C;
pub const REG_STATE_OF_HEALTH: u8 = 0x2E;
pub const REG_CHARGING_VOLTAGE: u8 = 0x30;
pub const REG_CHARGING_CURRENT: u8 = 0x32;
pub const REG_DESIGN_CAPACITY: u8 = 0x3C;
pub const REG_ALT_MANUFACTURER_ACCESS: u8 = 0x3E;
pub const REG_MAC_DATA: u8 = 0x40;
pub const REG_MAC_DATA_CHECKSUM: u8 = 0x60;

// ==================== AltManufacturerAccess subcommands (12.2) ====================

pub const SUBCMD_DEVICE_TYPE: u16 = 0x0001;
pub const SUBCMD_FIRMWARE_VERSION: u16 = 0x0002;
pub const SUBCMD_HARDWARE_VERSION: u16 = 0x0003;
pub const SUBCMD_CHEMICAL_ID: u16 = 0x0006;
pub const SUBCMD_DEVICE_RESET: u16 = 0x0012;
pub const SUBCMD_CHG_FET: u16 = 0x001F;
pub const SUBCMD_DSG_FET: u16 = 0x0020;
pub const SUBCMD_GAUGE_EN: u16 = 0x0021;
pub const SUBCMD_FET_CONTROL: u16 = 0x0022;
pub const SUBCMD_LIFETIME_DATA_RESET: u16 = 0x0028;
pub const SUBCMD_PERMANENT_FAIL_DATA_RESET: u16 = 0x0029;
pub const SUBCMD_SEAL_DEVICE: u16 = 0x0030;
pub const SUBCMD_SAFETY_ALERT: u16 = 0x0050;
pub const SUBCMD_SAFETY_STATUS: u16 = 0x0051;
pub const SUBCMD_PF_ALERT: u16 = 0x0052;
pub const SUBCMD_PF_STATUS: u16 = 0x0053;
pub const SUBCMD_OPERATION_STATUS: u16 = 0x0054;
pub const SUBCMD_CHARGING_STATUS: u16 = 0x0055;
pub const SUBCMD_GAUGING_STATUS: u16 = 0x0056;
pub const SUBCMD_MANUFACTURING_STATUS: u16 = 0x0057;
pub const SUBCMD_DA_STATUS_1: u16 = 0x0071;
pub const SUBCMD_DA_STATUS_2: u16 = 0x0072;
pub const SUBCMD_IT_STATUS_1: u16 = 0x0073;
pub const SUBCMD_IT_STATUS_2: u16 = 0x0074;
pub const SUBCMD_IT_STATUS_3: u16 = 0x0075;

// ==================== Data flash addresses (chapter 13) ====================

pub const DF_MIN_ADDR: u16 = 0x4000;
pub const DF_MAX_ADDR: u16 = 0x5FFF;

pub const DF_MANUFACTURER_NAME: u16 = 0x406B;
pub const DF_DEVICE_NAME: u16 = 0x4080;
pub const DF_DEVICE_CHEMISTRY: u16 = 0x4095;

/// Ra table status words, one per table.
pub const DF_CELL0_RA_FLAG: u16 = 0x4100;
pub const DF_CELL1_RA_FLAG: u16 = 0x4140;
pub const DF_X_CELL0_RA_FLAG: u16 = 0x4180;
pub const DF_X_CELL1_RA_FLAG: u16 = 0x41C0;

pub const DF_QMAX_CELL_1: u16 = 0x4206;
pub const DF_QMAX_CELL_2: u16 = 0x4208;
pub const DF_QMAX_PACK: u16 = 0x420A;
pub const DF_GAS_GAUGING_UPDATE_STATUS: u16 = 0x420E;
pub const DF_CYCLE_COUNT: u16 = 0x4240;

pub const DF_FET_OPTIONS: u16 = 0x4600;
pub const DF_DESIGN_CAPACITY_MAH: u16 = 0x462A;
pub const DF_DESIGN_CAPACITY_CWH: u16 = 0x462C;
pub const DF_SOC_FLAG_CONFIG_A: u16 = 0x4632;
pub const DF_TC_SET_RSOC_THRESHOLD: u16 = 0x464B;
pub const DF_TC_CLEAR_RSOC_THRESHOLD: u16 = 0x464C;
pub const DF_CHARGE_TERM_TAPER_CURRENT: u16 = 0x4693;
pub const DF_DA_CONFIGURATION: u16 = 0x469B;
pub const DF_OCC_THRESHOLD: u16 = 0x46C9;
pub const DF_OTC_THRESHOLD: u16 = 0x46D8;
pub const DF_OTC_RECOVERY: u16 = 0x46DB;

/// Ra flag word: impedance never updated, table being used.
pub const RA_TABLE_USED_NOT_UPDATED: u16 = 0xFF55;
/// Ra flag word: impedance never updated, table never used.
pub const RA_TABLE_NEVER_USED: u16 = 0xFFFF;

/// Update Status value that starts a learning cycle (IT enabled, not learned).
pub const UPDATE_STATUS_LEARNING: u8 = 0x04;

// ==================== Security keys (9.5) ====================

pub const DEFAULT_UNSEAL_KEY: u32 = 0x3672_0414;
pub const DEFAULT_FULL_ACCESS_KEY: u32 = 0xFFFF_FFFF;

// ==================== Fixed timings ====================

/// Chip processing time between dispatching a subcommand and reading back.
pub const SUBCOMMAND_SETTLE: Duration = Duration::from_millis(5);
/// Data flash write commit time.
pub const FLASH_COMMIT: Duration = Duration::from_millis(200);
/// Gap between the two unseal key words.
pub const UNSEAL_KEY_GAP: Duration = Duration::from_millis(5);
/// Wait before unsealed access is honored.
pub const UNSEAL_SETTLE: Duration = Duration::from_millis(1000);
/// Wait after FET / gauging / seal toggle subcommands.
pub const SUBCOMMAND_TOGGLE_SETTLE: Duration = Duration::from_millis(500);
/// Wait after PermanentFailDataReset.
pub const PF_CLEAR_SETTLE: Duration = Duration::from_millis(1000);
