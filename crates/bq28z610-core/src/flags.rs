//! Flag dictionaries for the status words and data-flash config fields.
//!
//! Plain const tables, one module per register, so callers can test a bit or
//! walk the set bits of a raw value without carrying the TRM around.

/// One documented bit of a status or config word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDef {
    pub bit: u8,
    pub name: &'static str,
    pub description: &'static str,
}

impl FlagDef {
    pub const fn new(bit: u8, name: &'static str, description: &'static str) -> Self {
        Self {
            bit,
            name,
            description,
        }
    }

    pub fn is_set(&self, value: u32) -> bool {
        value & (1 << self.bit) != 0
    }
}

/// Flags from `table` that are set in `value`, in table order.
pub fn active_flags(table: &'static [FlagDef], value: u32) -> impl Iterator<Item = &'static FlagDef> {
    table.iter().filter(move |flag| flag.is_set(value))
}

/// 12.1.6 BatteryStatus().
pub mod battery_status {
    use super::FlagDef;

    pub const FD: FlagDef = FlagDef::new(4, "FD", "Fully Discharged");
    pub const FC: FlagDef = FlagDef::new(5, "FC", "Fully Charged");
    pub const DSG: FlagDef = FlagDef::new(6, "DSG", "Discharging");
    pub const INIT: FlagDef = FlagDef::new(7, "INIT", "Initialization");
    pub const RTA: FlagDef = FlagDef::new(8, "RTA", "Remaining Time Alarm");
    pub const RCA: FlagDef = FlagDef::new(9, "RCA", "Remaining Capacity Alarm");
    pub const TDA: FlagDef = FlagDef::new(11, "TDA", "Terminate Discharge Alarm");
    pub const OTA: FlagDef = FlagDef::new(12, "OTA", "Overtemperature Alarm");
    pub const TCA: FlagDef = FlagDef::new(14, "TCA", "Terminate Charge Alarm");
    pub const OCA: FlagDef = FlagDef::new(15, "OCA", "Overcharged Alarm");

    /// Error code lives in bits 3:0.
    pub const ERROR_CODE_MASK: u16 = 0b111;

    pub const ALL: &[FlagDef] = &[FD, FC, DSG, INIT, RTA, RCA, TDA, OTA, TCA, OCA];
}

/// 12.2.26 SafetyAlert() / 12.2.27 SafetyStatus().
pub mod safety_status {
    use super::FlagDef;

    pub const CUV: FlagDef = FlagDef::new(0, "CUV", "Cell Undervoltage");
    pub const COV: FlagDef = FlagDef::new(1, "COV", "Cell Overvoltage");
    pub const OCC: FlagDef = FlagDef::new(2, "OCC", "Overcurrent During Charge");
    pub const OCD: FlagDef = FlagDef::new(4, "OCD", "Overcurrent During Discharge");
    pub const AOLD: FlagDef = FlagDef::new(6, "AOLD", "Overload During Discharge");
    pub const ASCC: FlagDef = FlagDef::new(8, "ASCC", "Short-Circuit During Charge");
    pub const ASCD: FlagDef = FlagDef::new(10, "ASCD", "Short-Circuit During Discharge");
    pub const OTC: FlagDef = FlagDef::new(12, "OTC", "Overtemperature During Charge");
    pub const OTD: FlagDef = FlagDef::new(13, "OTD", "Overtemperature During Discharge");
    pub const PTO: FlagDef = FlagDef::new(18, "PTO", "Precharge Timeout");
    pub const CTO: FlagDef = FlagDef::new(20, "CTO", "Charge Timeout");
    pub const UTC: FlagDef = FlagDef::new(26, "UTC", "Undertemperature During Charge");
    pub const UTD: FlagDef = FlagDef::new(27, "UTD", "Undertemperature During Discharge");

    pub const ALL: &[FlagDef] = &[
        CUV, COV, OCC, OCD, AOLD, ASCC, ASCD, OTC, OTD, PTO, CTO, UTC, UTD,
    ];
}

/// 12.2.29 PFStatus().
pub mod pf_status {
    use super::FlagDef;

    pub const SOV: FlagDef = FlagDef::new(1, "SOV", "Safety Cell Overvoltage Failure");
    pub const VIMA: FlagDef = FlagDef::new(11, "VIMA", "Voltage Imbalance While Pack Is Active");
    pub const VIMR: FlagDef = FlagDef::new(12, "VIMR", "Voltage Imbalance While Pack Is At Rest");
    pub const CFETF: FlagDef = FlagDef::new(16, "CFETF", "Charge FET Failure");
    pub const DFETF: FlagDef = FlagDef::new(17, "DFETF", "Discharge FET Failure");
    pub const IFC: FlagDef = FlagDef::new(24, "IFC", "Instruction Flash Checksum Failure");
    pub const DFW: FlagDef = FlagDef::new(26, "DFW", "Data Flash Wearout Failure");

    pub const ALL: &[FlagDef] = &[SOV, VIMA, VIMR, CFETF, DFETF, IFC, DFW];
}

/// 12.2.30 OperationStatus().
pub mod operation_status {
    use super::FlagDef;

    pub const DSG: FlagDef = FlagDef::new(1, "DSG", "DSG FET status");
    pub const CHG: FlagDef = FlagDef::new(2, "CHG", "CHG FET status");
    pub const BTP_INT: FlagDef = FlagDef::new(7, "BTP_INT", "Battery Trip Point interrupt");
    pub const SEC0: FlagDef = FlagDef::new(8, "SEC0", "Security mode bit 0");
    pub const SEC1: FlagDef = FlagDef::new(9, "SEC1", "Security mode bit 1");
    pub const SDV: FlagDef = FlagDef::new(10, "SDV", "Shutdown triggered via low pack voltage");
    pub const SS: FlagDef = FlagDef::new(11, "SS", "SAFETY mode status");
    pub const PF: FlagDef = FlagDef::new(12, "PF", "PERMANENT FAILURE mode status");
    pub const XDSG: FlagDef = FlagDef::new(13, "XDSG", "Discharging disabled");
    pub const XCHG: FlagDef = FlagDef::new(14, "XCHG", "Charging disabled");
    pub const SLEEP: FlagDef = FlagDef::new(15, "SLEEP", "Sleep conditions met");
    pub const SDM: FlagDef = FlagDef::new(16, "SDM", "Shutdown triggered via command");
    pub const AUTH: FlagDef = FlagDef::new(18, "AUTH", "Authentication in progress");
    pub const AUTHCALM: FlagDef = FlagDef::new(19, "AUTHCALM", "Auto CC offset calibration");
    pub const CAL: FlagDef = FlagDef::new(20, "CAL", "Calibration output active");
    pub const CAL_OFFSET: FlagDef = FlagDef::new(21, "CAL_OFFSET", "Raw CC offset output");
    pub const XL: FlagDef = FlagDef::new(22, "XL", "400-kHz bus mode");
    pub const SLEEPM: FlagDef = FlagDef::new(23, "SLEEPM", "SLEEP mode");
    pub const INIT: FlagDef = FlagDef::new(24, "INIT", "Initialization after full reset");
    pub const SMBLCAL: FlagDef = FlagDef::new(25, "SMBLCAL", "Auto-offset calibration on bus low");
    pub const SLPAD: FlagDef = FlagDef::new(26, "SLPAD", "ADC measurement in SLEEP");
    pub const SLPCC: FlagDef = FlagDef::new(27, "SLPCC", "CC measurement in SLEEP");
    pub const CB: FlagDef = FlagDef::new(28, "CB", "Cell balancing");
    pub const EMSHUT: FlagDef = FlagDef::new(29, "EMSHUT", "Emergency FET shutdown");

    pub const ALL: &[FlagDef] = &[
        DSG, CHG, BTP_INT, SEC0, SEC1, SDV, SS, PF, XDSG, XCHG, SLEEP, SDM, AUTH, AUTHCALM, CAL,
        CAL_OFFSET, XL, SLEEPM, INIT, SMBLCAL, SLPAD, SLPCC, CB, EMSHUT,
    ];
}

/// 12.2.31 ChargingStatus().
pub mod charging_status {
    use super::FlagDef;

    pub const UT: FlagDef = FlagDef::new(0, "UT", "Under temperature region");
    pub const LT: FlagDef = FlagDef::new(1, "LT", "Low temperature region");
    pub const STL: FlagDef = FlagDef::new(2, "STL", "Standard temperature low region");
    pub const RT: FlagDef = FlagDef::new(3, "RT", "Room temperature region");
    pub const STH: FlagDef = FlagDef::new(4, "STH", "Standard temperature high region");
    pub const HT: FlagDef = FlagDef::new(5, "HT", "High temperature region");
    pub const OT: FlagDef = FlagDef::new(6, "OT", "Over temperature region");
    pub const PV: FlagDef = FlagDef::new(8, "PV", "Precharge voltage region");
    pub const LV: FlagDef = FlagDef::new(9, "LV", "Low voltage region");
    pub const MV: FlagDef = FlagDef::new(10, "MV", "Mid voltage region");
    pub const HV: FlagDef = FlagDef::new(11, "HV", "High voltage region");
    pub const IN: FlagDef = FlagDef::new(12, "IN", "Charge inhibit");
    pub const SU: FlagDef = FlagDef::new(13, "SU", "Charge suspend");
    pub const MCHG: FlagDef = FlagDef::new(14, "MCHG", "Maintenance charge");
    pub const VCT: FlagDef = FlagDef::new(15, "VCT", "Charge termination");

    pub const ALL: &[FlagDef] = &[
        UT, LT, STL, RT, STH, HT, OT, PV, LV, MV, HV, IN, SU, MCHG, VCT,
    ];
}

/// 12.2.32 GaugingStatus().
pub mod gauging_status {
    use super::FlagDef;

    pub const FD: FlagDef = FlagDef::new(0, "FD", "Fully discharged");
    pub const FC: FlagDef = FlagDef::new(1, "FC", "Fully charged");
    pub const TD: FlagDef = FlagDef::new(2, "TD", "Terminate discharge");
    pub const TC: FlagDef = FlagDef::new(3, "TC", "Terminate charge");
    pub const BAL_EN: FlagDef = FlagDef::new(4, "BAL_EN", "Cell balancing");
    pub const EDV: FlagDef = FlagDef::new(5, "EDV", "End-of-discharge termination voltage");
    pub const DSG: FlagDef = FlagDef::new(6, "DSG", "Discharge/relax");
    pub const CF: FlagDef = FlagDef::new(7, "CF", "Condition flag");
    pub const REST: FlagDef = FlagDef::new(8, "REST", "Rest");
    pub const RDIS: FlagDef = FlagDef::new(10, "RDIS", "Resistance updates disabled");
    pub const VOK: FlagDef = FlagDef::new(11, "VOK", "Voltage OK for QMax update");
    pub const QEN: FlagDef = FlagDef::new(12, "QEN", "Impedance Track gauging enabled");
    pub const SLPQMAX: FlagDef = FlagDef::new(13, "SLPQMax", "QMax update during sleep");
    pub const NSFM: FlagDef = FlagDef::new(15, "NSFM", "Negative scale factor mode");
    pub const VDQ: FlagDef = FlagDef::new(16, "VDQ", "Discharge qualified for learning");
    pub const QMAX: FlagDef = FlagDef::new(17, "QMax", "Toggles after every QMax update");
    pub const RX: FlagDef = FlagDef::new(18, "RX", "Toggles after every resistance update");
    pub const LDMD: FlagDef = FlagDef::new(19, "LDMD", "LOAD mode");
    pub const OCVFR: FlagDef = FlagDef::new(20, "OCVFR", "OCV in flat region during relax");

    pub const ALL: &[FlagDef] = &[
        FD, FC, TD, TC, BAL_EN, EDV, DSG, CF, REST, RDIS, VOK, QEN, SLPQMAX, NSFM, VDQ, QMAX, RX,
        LDMD, OCVFR,
    ];
}

/// 12.2.33 ManufacturingStatus().
pub mod manufacturing_status {
    use super::FlagDef;

    pub const CHG_TEST: FlagDef = FlagDef::new(1, "CHG_TEST", "Charge FET test");
    pub const DSG_TEST: FlagDef = FlagDef::new(2, "DSG_TEST", "Discharge FET test");
    pub const GAUGE_EN: FlagDef = FlagDef::new(3, "GAUGE_EN", "Gas gauging mode");
    pub const FET_EN: FlagDef = FlagDef::new(4, "FET_EN", "All FET action mode");
    pub const LF_EN: FlagDef = FlagDef::new(5, "LF_EN", "Lifetime data collection mode");
    pub const PF_EN: FlagDef = FlagDef::new(6, "PF_EN", "Permanent failure mode");
    pub const CAL_EN: FlagDef = FlagDef::new(15, "CAL_EN", "Calibration mode");

    pub const ALL: &[FlagDef] = &[CHG_TEST, DSG_TEST, GAUGE_EN, FET_EN, LF_EN, PF_EN, CAL_EN];
}

/// Data flash 0x4600 FET Options.
pub mod fet_options {
    use super::FlagDef;

    pub const OTFET: FlagDef = FlagDef::new(2, "OTFET", "FET action in overtemperature mode");
    pub const CHGSU: FlagDef = FlagDef::new(3, "CHGSU", "FET action in charge suspend mode");
    pub const CHGIN: FlagDef = FlagDef::new(4, "CHGIN", "FET action in charge inhibit mode");
    pub const CHGFET: FlagDef = FlagDef::new(5, "CHGFET", "FET action on valid charge termination");
    pub const SLEEPCHG: FlagDef = FlagDef::new(6, "SLEEPCHG", "CHG FET enabled during sleep");

    pub const ALL: &[FlagDef] = &[OTFET, CHGSU, CHGIN, CHGFET, SLEEPCHG];
}

/// Data flash 0x469B DA Configuration.
pub mod da_configuration {
    use super::FlagDef;

    pub const CC0: FlagDef = FlagDef::new(0, "CC0", "Cell count: 0 = 1 cell, 1 = 2 cell");
    pub const IN_SYSTEM_SLEEP: FlagDef = FlagDef::new(3, "IN_SYSTEM_SLEEP", "In-system SLEEP mode");
    pub const SLEEP: FlagDef = FlagDef::new(4, "SLEEP", "SLEEP mode");
    pub const CTEMP: FlagDef = FlagDef::new(6, "CTEMP", "Cell temperature protection source");

    pub const ALL: &[FlagDef] = &[CC0, IN_SYSTEM_SLEEP, SLEEP, CTEMP];
}

/// Data flash 0x420E Gas Gauging Update Status.
pub mod update_status {
    use super::FlagDef;

    pub const UPDATE0: FlagDef = FlagDef::new(0, "Update0", "Update status bit 0");
    pub const UPDATE1: FlagDef = FlagDef::new(1, "Update1", "Update status bit 1");
    pub const ENABLE: FlagDef = FlagDef::new(2, "Enable", "Impedance Track gauging enabled");
    pub const QMAX_UPDATE: FlagDef = FlagDef::new(3, "QMax_update", "QMax updated in the field");

    /// Learning progress lives in bits 1:0.
    pub const UPDATE_MASK: u8 = 0b11;

    pub const ALL: &[FlagDef] = &[UPDATE0, UPDATE1, ENABLE, QMAX_UPDATE];
}

/// Data flash 0x4632 SOC Flag Config A.
pub mod soc_flag_config_a {
    use super::FlagDef;

    pub const TDSETV: FlagDef = FlagDef::new(0, "TDSETV", "TD set by cell voltage threshold");
    pub const TDCLEARV: FlagDef = FlagDef::new(1, "TDCLEARV", "TD clear by cell voltage threshold");
    pub const TDSETRSOC: FlagDef = FlagDef::new(2, "TDSETRSOC", "TD set by RSOC threshold");
    pub const TDCLEARRSOC: FlagDef = FlagDef::new(3, "TDCLEARRSOC", "TD clear by RSOC threshold");
    pub const TCSETV: FlagDef = FlagDef::new(4, "TCSETV", "TC set by cell voltage threshold");
    pub const TCCLEARV: FlagDef = FlagDef::new(5, "TCCLEARV", "TC clear by cell voltage threshold");
    pub const TCSETRSOC: FlagDef = FlagDef::new(6, "TCSETRSOC", "TC set by RSOC threshold");
    pub const TCCLEARRSOC: FlagDef = FlagDef::new(7, "TCCLEARRSOC", "TC clear by RSOC threshold");
    pub const FCSETVCT: FlagDef = FlagDef::new(10, "FCSETVCT", "FC set by charge termination");
    pub const TCSETVCT: FlagDef = FlagDef::new(11, "TCSETVCT", "TC set by charge termination");

    pub const ALL: &[FlagDef] = &[
        TDSETV, TDCLEARV, TDSETRSOC, TDCLEARRSOC, TCSETV, TCCLEARV, TCSETRSOC, TCCLEARRSOC,
        FCSETVCT, TCSETVCT,
    ];
}
