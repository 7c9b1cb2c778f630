//! Scd4x device definitions
//!
//! Copyright 2019 Ryan Kurte


/// Scd4x default I2C address
/// (note this is shifted left 1 bit on the wire)
pub const DEFAULT_ADDRESS: u8 = 0x62;

pub const CRC_POLY: u8 = 0x31;
pub const CRC_INIT: u8 = 0xff;
pub const CRC_XOR: u8 = 0x00;

/// Mask applied to the data ready status word, the device is ready if any of these bits are set
pub const DATA_READY_MASK: u16 = 0x07FF;

/// Offset applied to the forced recalibration response word
pub const FRC_OFFSET: u16 = 0x8000;

/// Forced recalibration response word indicating the calibration failed
pub const FRC_FAILED: u16 = 0xFFFF;

/// Default command execution time in milliseconds
pub const DEFAULT_EXECUTION_MS: u32 = 1;

/// Scd4x I2C Command
/// Commands are big endian 16-bit unsigned integers, any data word is also big endian and followed by a CRC-8 checksum
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Command {
    /// Start periodic measurement mode
    /// Signal update interval is 5 seconds
    StartPeriodicMeasurement = 0x21b1,

    /// Read a measurement from the buffer
    /// Returns CO2 (ppm), temperature and humidity words
    ReadMeasurement = 0xec05,

    /// Stop periodic measurement mode
    /// The device accepts no other commands for 500ms after this
    StopPeriodicMeasurement = 0x3f86,

    /// Set temperature offset
    /// Data is a u16, offset in degrees celsius * 65536 / 175
    SetTemperatureOffset = 0x241d,

    /// Fetch the current temperature offset
    GetTemperatureOffset = 0x2318,

    /// Set sensor altitude
    /// Data is a u16 in meters above sea level
    SetSensorAltitude = 0x2427,

    /// Fetch the current sensor altitude
    GetSensorAltitude = 0x2322,

    /// Set ambient pressure
    /// Data is a u16 in pascal / 100, may be issued during periodic measurement
    SetAmbientPressure = 0xe000,

    /// Perform Forced Recalibration (FRC)
    /// Data is a u16 target CO2 concentration in ppm, response is the correction + 0x8000
    PerformForcedRecalibration = 0x362f,

    /// Enable or Disable Automatic Self Calibration (ASC)
    /// Data is a u16, 1 enables ASC and 0 disables ASC
    SetAutomaticSelfCalibration = 0x2416,

    /// Fetch the Automatic Self Calibration (ASC) state
    GetAutomaticSelfCalibration = 0x2313,

    /// Start low power periodic measurement mode
    /// Signal update interval is approximately 30 seconds
    StartLowPowerPeriodicMeasurement = 0x21ac,

    /// Fetch data ready status
    GetDataReadyStatus = 0xe4b8,

    /// Persist settings to EEPROM
    /// The EEPROM is rated for at least 2000 write cycles
    PersistSettings = 0x3615,

    /// Fetch the 48-bit serial number
    GetSerialNumber = 0x3682,

    /// Perform on-chip self test
    PerformSelfTest = 0x3639,

    /// Reset all EEPROM settings and erase FRC / ASC history
    PerformFactoryReset = 0x3632,

    /// Reload user settings from EEPROM
    Reinit = 0x3646,

    /// On-demand measurement of CO2, temperature and humidity (SCD41 only)
    MeasureSingleShot = 0x219d,

    /// On-demand measurement of temperature and humidity only (SCD41 only)
    MeasureSingleShotRhtOnly = 0x2196,

    /// Put the sensor from idle to sleep (SCD41 only)
    PowerDown = 0x36e0,

    /// Wake the sensor from sleep to idle (SCD41 only)
    /// This command is not acknowledged by the device
    WakeUp = 0x36f6,
}

impl Command {
    /// Time in milliseconds the device requires after this command before accepting another
    pub fn execution_ms(&self) -> u32 {
        match self {
            Command::StopPeriodicMeasurement => 500,
            Command::PerformForcedRecalibration => 400,
            Command::PersistSettings => 800,
            Command::PerformSelfTest => 10_000,
            Command::PerformFactoryReset => 1_200,
            Command::Reinit => 20,
            Command::WakeUp => 20,
            Command::MeasureSingleShot => 5_000,
            Command::MeasureSingleShotRhtOnly => 50,
            _ => DEFAULT_EXECUTION_MS,
        }
    }

    /// Whether the device only accepts this command while idle
    pub fn idle_only(&self) -> bool {
        !matches!(self,
            Command::ReadMeasurement
            | Command::StopPeriodicMeasurement
            | Command::SetAmbientPressure
            | Command::GetDataReadyStatus
            | Command::WakeUp
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_execution_times() {
        let tests = &[
            (Command::StopPeriodicMeasurement, 500),
            (Command::PerformSelfTest, 10_000),
            (Command::Reinit, 20),
            (Command::WakeUp, 20),
            (Command::PerformForcedRecalibration, 400),
            (Command::PersistSettings, 800),
            (Command::PerformFactoryReset, 1_200),
            (Command::MeasureSingleShot, 5_000),
            (Command::MeasureSingleShotRhtOnly, 50),
            (Command::ReadMeasurement, DEFAULT_EXECUTION_MS),
        ];

        for (c, ms) in tests {
            assert_eq!(c.execution_ms(), *ms, "command: {:?}", c);
        }
    }

    #[test]
    fn test_idle_only() {
        assert!(Command::SetSensorAltitude.idle_only());
        assert!(Command::PerformSelfTest.idle_only());
        assert!(!Command::SetAmbientPressure.idle_only());
        assert!(!Command::ReadMeasurement.idle_only());
    }
}
