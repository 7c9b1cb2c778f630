//! Scd4x CO2 / temperature / humidity sensor driver
//!
//! Copyright 2019 Ryan Kurte

#![cfg_attr(not(test), no_std)]

use core::fmt::Debug;
use core::marker::PhantomData;

extern crate embedded_hal;
use embedded_hal::blocking::{i2c, delay};

#[macro_use]
extern crate log;

pub mod device;
use device::*;

pub mod base;
use base::*;

pub mod gt5688;

/// Scd4x sensor object
/// This is generic over an I2C connector, a delay provider and the associated connector error type
pub struct Scd4x<Conn, Delay, Err> {
    conn: Conn,
    delay: Delay,
    address: u8,
    mode: Mode,
    crc_policy: CrcPolicy,
    _err: PhantomData<Err>,
}

/// Scd4x error object
#[derive(Debug, PartialEq)]
pub enum Error<ConnErr> {
    /// Underlying connector error
    Conn(ConnErr),
    /// CRC mismatch (expected, received)
    Crc(u8, u8),
    /// No device found (serial number blank)
    NoDevice,
    /// Forced recalibration reported failure
    CalibrationFailed,
}

impl <ConnErr> From<ConnErr> for Error<ConnErr> {
    fn from(conn_err: ConnErr) -> Self {
        Error::Conn(conn_err)
    }
}

/// Handling of CRC mismatches on received words
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum CrcPolicy {
    /// Log the mismatch and return the decoded value anyway
    Lenient,
    /// Return `Error::Crc` on mismatch
    Strict,
}

impl Default for CrcPolicy {
    fn default() -> Self {
        CrcPolicy::Lenient
    }
}

/// Device operating mode, as inferred from the commands issued by this driver
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Mode {
    Idle,
    PeriodicMeasuring,
    LowPowerMeasuring,
    Asleep,
}

/// Scd4x measurement object
#[derive(PartialEq, Clone, Debug)]
pub struct Measurement {
    /// CO2 concentration in parts-per-million (PPM)
    /// Range: 0 - 40,000
    pub co2: u16,
    /// Temperature in degrees celsius
    /// Range: -10 - 60 C
    pub temp: f32,
    /// Relative Humidity (%)
    /// Range: 0 - 100
    pub rh: f32,
}

/// Convert a raw temperature word to degrees celsius
pub fn decode_temperature(raw: u16) -> f32 {
    -45.0 + 175.0 * raw as f32 / 65536.0
}

/// Convert a raw humidity word to %RH
pub fn decode_humidity(raw: u16) -> f32 {
    100.0 * raw as f32 / 65536.0
}

/// Convert a raw temperature offset word to degrees celsius
pub fn decode_temperature_offset(raw: u16) -> f32 {
    175.0 * raw as f32 / 65536.0
}

/// Convert a temperature offset in degrees celsius to a raw word
/// Out of range values saturate at the u16 bounds
pub fn encode_temperature_offset(offset: f32) -> u16 {
    (offset * 65536.0 / 175.0) as u16
}

/// Check a data ready status word
pub fn decode_data_ready(raw: u16) -> bool {
    raw & DATA_READY_MASK != 0
}

/// Convert a forced recalibration response word to a correction in ppm
/// A failed calibration (0xFFFF) maps to `i16::MAX`
pub fn decode_frc(raw: u16) -> i16 {
    raw.wrapping_sub(FRC_OFFSET) as i16
}

/// Assemble a 48-bit serial number from three big endian words
pub fn decode_serial(words: &[u16; 3]) -> u64 {
    (words[0] as u64) << 32 | (words[1] as u64) << 16 | (words[2] as u64)
}

impl <Conn, Delay, Err> Scd4x <Conn, Delay, Err> where
    Conn: i2c::Read<Error=Err> + i2c::Write<Error=Err> + i2c::WriteRead<Error=Err>,
    Delay: delay::DelayMs<u32>,
    Err: Debug,
{
    /// Create a new Scd4x sensor instance using the default address
    pub fn new(conn: Conn, delay: Delay) -> Self {
        Self::with_address(conn, delay, DEFAULT_ADDRESS)
    }

    /// Create a new Scd4x sensor instance with the provided 7-bit address
    pub fn with_address(conn: Conn, delay: Delay, address: u8) -> Self {
        Scd4x{ conn, delay, address, mode: Mode::Idle, crc_policy: CrcPolicy::default(), _err: PhantomData }
    }

    /// Stop any running measurement and check for device presence, returning the serial number
    /// An all-zero or all-ones serial number is treated as no device (`Error::NoDevice`)
    pub fn begin(&mut self) -> Result<u64, Error<Err>> {
        self.stop_periodic_measurement()?;

        // Check communication
        let serial = self.serial_number()?;
        if serial == 0 || serial == 0xFFFF_FFFF_FFFF {
            return Err(Error::NoDevice)
        }

        debug!("Found Scd4x with serial: {:#014x}", serial);

        Ok(serial)
    }

    /// Set the handling of received CRC mismatches
    pub fn set_crc_policy(&mut self, policy: CrcPolicy) {
        self.crc_policy = policy;
    }

    /// Fetch the current device mode (as tracked by the driver)
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Fetch the device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the underlying connector and delay
    pub fn release(self) -> (Conn, Delay) {
        (self.conn, self.delay)
    }

    /// Start periodic measurement mode (5s update interval)
    pub fn start_periodic_measurement(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::StartPeriodicMeasurement, None)?;
        self.set_mode(Mode::PeriodicMeasuring);
        Ok(())
    }

    /// Start low power periodic measurement mode (~30s update interval)
    pub fn start_low_power_periodic_measurement(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::StartLowPowerPeriodicMeasurement, None)?;
        self.set_mode(Mode::LowPowerMeasuring);
        Ok(())
    }

    /// Stop periodic measurement mode
    pub fn stop_periodic_measurement(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::StopPeriodicMeasurement, None)?;
        self.set_mode(Mode::Idle);
        Ok(())
    }

    /// Read measurement data from the buffer
    pub fn read_measurement(&mut self) -> Result<Measurement, Error<Err>> {
        let mut buff = [0u8; 9];

        self.read(Command::ReadMeasurement, &mut buff)?;

        let co2 = self.word(&buff[0..3])?;
        let temp = self.word(&buff[3..6])?;
        let rh = self.word(&buff[6..9])?;

        Ok(Measurement{ co2, temp: decode_temperature(temp), rh: decode_humidity(rh) })
    }

    /// Check whether measurement data is available in the buffer
    pub fn data_ready(&mut self) -> Result<bool, Error<Err>> {
        let v = self.read_word(Command::GetDataReadyStatus)?;
        Ok(decode_data_ready(v))
    }

    /// Set Temperature Offset in degrees celsius
    /// This is applied to temperature and humidity outputs, see datasheet for calculation
    pub fn set_temperature_offset(&mut self, offset: f32) -> Result<(), Error<Err>> {
        self.command(Command::SetTemperatureOffset, Some(encode_temperature_offset(offset)))
    }

    /// Fetch the current temperature offset in degrees celsius
    pub fn temperature_offset(&mut self) -> Result<f32, Error<Err>> {
        let v = self.read_word(Command::GetTemperatureOffset)?;
        Ok(decode_temperature_offset(v))
    }

    /// Set Altitude Compensation in meters above sea level
    pub fn set_sensor_altitude(&mut self, altitude: u16) -> Result<(), Error<Err>> {
        self.command(Command::SetSensorAltitude, Some(altitude))
    }

    /// Fetch the current altitude compensation in meters above sea level
    pub fn sensor_altitude(&mut self) -> Result<u16, Error<Err>> {
        self.read_word(Command::GetSensorAltitude)
    }

    /// Set Ambient Pressure compensation in pascal, overriding altitude compensation
    /// This may be called during periodic measurement
    pub fn set_ambient_pressure(&mut self, pressure: u32) -> Result<(), Error<Err>> {
        let v = (pressure / 100) as u16;
        self.command(Command::SetAmbientPressure, Some(v))
    }

    /// Perform Forced Recalibration against a reference CO2 concentration in ppm
    /// Returns the applied correction in ppm
    pub fn forced_recalibration(&mut self, target_ppm: u16) -> Result<i16, Error<Err>> {
        self.command(Command::PerformForcedRecalibration, Some(target_ppm))?;

        let mut buff = [0u8; 3];
        self.conn.read_response(self.address, &mut buff)?;

        let v = self.word(&buff)?;
        if v == FRC_FAILED {
            warn!("Forced recalibration failed");
            return Err(Error::CalibrationFailed);
        }

        Ok(decode_frc(v))
    }

    /// Enable or disable Automatic Self-Calibration
    pub fn set_automatic_self_calibration(&mut self, enabled: bool) -> Result<(), Error<Err>> {
        let v = match enabled {
            true => 1,
            false => 0,
        };

        self.command(Command::SetAutomaticSelfCalibration, Some(v))
    }

    /// Fetch whether Automatic Self-Calibration is enabled
    pub fn automatic_self_calibration(&mut self) -> Result<bool, Error<Err>> {
        let v = self.read_word(Command::GetAutomaticSelfCalibration)?;
        Ok(v != 0)
    }

    /// Persist settings to EEPROM
    /// This should only be called when configuration has actually changed to avoid EEPROM wear
    pub fn persist_settings(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::PersistSettings, None)
    }

    /// Fetch the 48-bit device serial number
    pub fn serial_number(&mut self) -> Result<u64, Error<Err>> {
        let mut buff = [0u8; 9];

        self.read(Command::GetSerialNumber, &mut buff)?;

        let words = [
            self.word(&buff[0..3])?,
            self.word(&buff[3..6])?,
            self.word(&buff[6..9])?,
        ];

        Ok(decode_serial(&words))
    }

    /// Run the on-chip self test, returning 0 on success or a device fault code
    pub fn self_test(&mut self) -> Result<u16, Error<Err>> {
        self.command(Command::PerformSelfTest, None)?;

        let mut buff = [0u8; 3];
        self.conn.read_response(self.address, &mut buff)?;

        let v = self.word(&buff)?;
        if v != 0 {
            warn!("Self test reported malfunction: {:#06x}", v);
        }

        Ok(v)
    }

    /// Reset EEPROM configuration and erase calibration history
    pub fn factory_reset(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::PerformFactoryReset, None)
    }

    /// Reinitialise the device, reloading user settings from EEPROM
    pub fn reinit(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::Reinit, None)
    }

    /// Measure CO2, temperature and humidity once (SCD41 only)
    /// Results are fetched with `read_measurement`
    pub fn measure_single_shot(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::MeasureSingleShot, None)
    }

    /// Measure temperature and humidity once, CO2 reads back as 0 (SCD41 only)
    pub fn measure_single_shot_rht_only(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::MeasureSingleShotRhtOnly, None)
    }

    /// Put the device to sleep (SCD41 only)
    pub fn power_down(&mut self) -> Result<(), Error<Err>> {
        self.command(Command::PowerDown, None)?;
        self.set_mode(Mode::Asleep);
        Ok(())
    }

    /// Wake the device from sleep (SCD41 only)
    pub fn wake_up(&mut self) -> Result<(), Error<Err>> {
        // The device does not acknowledge wake up, so bus errors are expected here
        if let Err(e) = self.conn.write_command(self.address, Command::WakeUp, None) {
            debug!("Ignoring wake up error: {:?}", e);
        }

        self.delay.delay_ms(Command::WakeUp.execution_ms());
        self.set_mode(Mode::Idle);

        Ok(())
    }

    /// Write a command with optional data word, then wait for its execution time
    fn command(&mut self, command: Command, data: Option<u16>) -> Result<(), Error<Err>> {
        self.check_mode(command);

        self.conn.write_command(self.address, command, data)?;

        self.delay.delay_ms(command.execution_ms());

        Ok(())
    }

    /// Issue a read command and fill the provided buffer
    fn read(&mut self, command: Command, buff: &mut [u8]) -> Result<(), Error<Err>> {
        self.check_mode(command);

        // Wait the command execution time between command and response
        self.conn.write_command(self.address, command, None)?;
        self.delay.delay_ms(command.execution_ms());

        // Short reads are reported by the connector as errors
        self.conn.read_response(self.address, buff)?;

        Ok(())
    }

    /// Issue a read command returning a single data word
    fn read_word(&mut self, command: Command) -> Result<u16, Error<Err>> {
        let mut buff = [0u8; 3];
        self.read(command, &mut buff)?;
        self.word(&buff)
    }

    /// Decode a received word, applying the configured CRC policy
    fn word(&self, buff: &[u8]) -> Result<u16, Error<Err>> {
        let (v, mismatch) = unpack(buff);

        match (mismatch, self.crc_policy) {
            (None, _) => Ok(v),
            (Some((expected, received)), CrcPolicy::Lenient) => {
                warn!("CRC mismatch (expected: {:#04x} received: {:#04x})", expected, received);
                Ok(v)
            },
            (Some((expected, received)), CrcPolicy::Strict) => {
                Err(Error::Crc(expected, received))
            },
        }
    }

    fn check_mode(&self, command: Command) {
        match self.mode {
            Mode::PeriodicMeasuring | Mode::LowPowerMeasuring if command.idle_only() => {
                warn!("Command {:?} issued during periodic measurement", command);
            },
            Mode::Asleep if command != Command::WakeUp => {
                warn!("Command {:?} issued while asleep", command);
            },
            _ => (),
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!("Mode transition: {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use std::vec;

    extern crate embedded_hal_mock;
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    extern crate assert_approx_eq;
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn test_start_periodic_measurement() {
        // Set up expectations
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x21, 0xb1]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        // Create sensor object
        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        // Start periodic mode
        sensor.start_periodic_measurement().unwrap();
        assert_eq!(sensor.mode(), Mode::PeriodicMeasuring);

        // Finalize expectations
        i2c.done();
    }

    #[test]
    fn test_low_power_and_stop() {
        // Set up expectations
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x21, 0xac]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x3f, 0x86]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        // Create sensor object
        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        sensor.start_low_power_periodic_measurement().unwrap();
        assert_eq!(sensor.mode(), Mode::LowPowerMeasuring);

        sensor.stop_periodic_measurement().unwrap();
        assert_eq!(sensor.mode(), Mode::Idle);

        // Finalize expectations
        i2c.done();
    }

    #[test]
    fn test_alternate_address() {
        let expectations = [
            I2cTransaction::write(0x10, vec![0x36, 0x46]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::with_address(i2c.clone(), MockNoop::new(), 0x10);
        assert_eq!(sensor.address(), 0x10);

        sensor.reinit().unwrap();

        i2c.done();
    }

    #[test]
    fn test_set_temperature_offset() {
        // Set up expectations
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x24, 0x1d, 0x05, 0xd9, 0x7a]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        // Create sensor object
        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        // Set temperature offset to 4 degrees
        sensor.set_temperature_offset(4.0).unwrap();

        // Finalize expectations
        i2c.done();
    }

    #[test]
    fn test_get_temperature_offset() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x23, 0x18]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x0e, 0xa6, 0xb6]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        let offset = sensor.temperature_offset().unwrap();
        assert_approx_eq!(offset, 10.0, 0.02);

        i2c.done();
    }

    #[test]
    fn test_sensor_altitude() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x24, 0x27, 0x03, 0xe8, 0xd4]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x23, 0x22]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x03, 0xe8, 0xd4]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        // Set altitude to 1000m and read back
        sensor.set_sensor_altitude(1000).unwrap();
        assert_eq!(sensor.sensor_altitude().unwrap(), 1000);

        i2c.done();
    }

    #[test]
    fn test_set_ambient_pressure() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xe0, 0x00, 0x03, 0xf5, 0xdb]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        // 101300 Pa -> 1013 hPa
        sensor.set_ambient_pressure(101_300).unwrap();

        i2c.done();
    }

    #[test]
    fn test_forced_recalibration() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x2f, 0x01, 0x90, 0x4c]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x80, 0x06, 0x04]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        // Recalibrate against 400ppm
        let correction = sensor.forced_recalibration(400).unwrap();
        assert_eq!(correction, 6);

        i2c.done();
    }

    #[test]
    fn test_forced_recalibration_failed() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x2f, 0x01, 0x90, 0x4c]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0xff, 0xff, 0xac]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        let res = sensor.forced_recalibration(400);
        assert_eq!(res, Err(Error::CalibrationFailed));

        i2c.done();
    }

    #[test]
    fn test_automatic_self_calibration() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x24, 0x16, 0x00, 0x01, 0xb0]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x24, 0x16, 0x00, 0x00, 0x81]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x23, 0x13]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x00, 0x01, 0xb0]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        sensor.set_automatic_self_calibration(true).unwrap();
        sensor.set_automatic_self_calibration(false).unwrap();
        assert!(sensor.automatic_self_calibration().unwrap());

        i2c.done();
    }

    #[test]
    fn test_simple_commands() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x15]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x32]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x46]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x21, 0x9d]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x21, 0x96]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        sensor.persist_settings().unwrap();
        sensor.factory_reset().unwrap();
        sensor.reinit().unwrap();
        sensor.measure_single_shot().unwrap();
        sensor.measure_single_shot_rht_only().unwrap();

        assert_eq!(sensor.mode(), Mode::Idle);

        i2c.done();
    }

    #[test]
    fn test_sleep_wake() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0xe0]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0xf6]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        sensor.power_down().unwrap();
        assert_eq!(sensor.mode(), Mode::Asleep);

        sensor.wake_up().unwrap();
        assert_eq!(sensor.mode(), Mode::Idle);

        i2c.done();
    }

    #[test]
    fn test_read_data_ready() {
        // Set up expectations
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xe4, 0xb8]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x00, 0x01, 0xb0]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xe4, 0xb8]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x08, 0x00, 0xb6]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        // Create sensor object
        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        // Read data ready
        assert!(sensor.data_ready().unwrap());

        // Bit 11 is outside the ready mask
        assert!(!sensor.data_ready().unwrap());

        // Finalize expectations
        i2c.done();
    }

    #[test]
    fn test_read_measurement() {
        // Set up expectations
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xec, 0x05]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![
                0x01, 0xf4, 0x33, // CO2: 500 ppm
                0x66, 0x67, 0xa2, // Temperature: 25.0 C
                0x5e, 0xb9, 0x3c, // Relative humidity, 37.0 %
            ]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        // Create sensor object
        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        // Read measurement
        let m = sensor.read_measurement().unwrap();

        assert_eq!(m.co2, 500);
        assert_approx_eq!(m.temp, 25.0, 0.01);
        assert_approx_eq!(m.rh, 37.0, 0.01);

        // Finalize expectations
        i2c.done();
    }

    #[test]
    fn test_read_measurement_crc_policy() {
        let frame = vec![
            0x01, 0xf4, 0x00, // Bad CRC
            0x66, 0x67, 0xa2,
            0x5e, 0xb9, 0x3c,
        ];
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xec, 0x05]),
            I2cTransaction::read(DEFAULT_ADDRESS, frame.clone()),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xec, 0x05]),
            I2cTransaction::read(DEFAULT_ADDRESS, frame),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        // Lenient by default, value is still returned
        let m = sensor.read_measurement().unwrap();
        assert_eq!(m.co2, 500);

        sensor.set_crc_policy(CrcPolicy::Strict);
        let res = sensor.read_measurement();
        assert_eq!(res, Err(Error::Crc(0x33, 0x00)));

        i2c.done();
    }

    #[test]
    fn test_serial_number() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x82]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![
                0xbe, 0x02, 0x1f,
                0x7f, 0x07, 0xb4,
                0x3b, 0xfb, 0x41,
            ]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        assert_eq!(sensor.serial_number().unwrap(), 0xbe02_7f07_3bfb);

        i2c.done();
    }

    #[test]
    fn test_begin() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x3f, 0x86]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x82]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![
                0xbe, 0x02, 0x1f,
                0x7f, 0x07, 0xb4,
                0x3b, 0xfb, 0x41,
            ]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        assert_eq!(sensor.begin().unwrap(), 0xbe02_7f07_3bfb);

        i2c.done();
    }

    #[test]
    fn test_begin_no_device() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x3f, 0x86]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x82]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![
                0x00, 0x00, 0x81,
                0x00, 0x00, 0x81,
                0x00, 0x00, 0x81,
            ]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        assert_eq!(sensor.begin(), Err(Error::NoDevice));

        i2c.done();
    }

    #[test]
    fn test_self_test() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x36, 0x39]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x00, 0x00, 0x81]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Scd4x::new(i2c.clone(), MockNoop::new());

        assert_eq!(sensor.self_test().unwrap(), 0);

        i2c.done();
    }

    #[test]
    fn test_decode_temperature() {
        assert_eq!(decode_temperature(0x0000), -45.0);
        assert_approx_eq!(decode_temperature(0xffff), 175.0 * 65535.0 / 65536.0 - 45.0, 0.001);
        assert!(decode_temperature(0xffff) < 130.0);
    }

    #[test]
    fn test_decode_humidity() {
        assert_eq!(decode_humidity(0x0000), 0.0);
        assert_approx_eq!(decode_humidity(0xffff), 100.0, 0.01);
        assert!(decode_humidity(0xffff) < 100.0);
    }

    #[test]
    fn test_decode_data_ready() {
        assert!(!decode_data_ready(0x0000));
        assert!(decode_data_ready(0x0001));
        assert!(!decode_data_ready(0x0800));
        assert!(decode_data_ready(0x8006));
    }

    #[test]
    fn test_decode_frc() {
        assert_eq!(decode_frc(0x8000), 0);
        assert_eq!(decode_frc(0x7fff), -1);
        assert_eq!(decode_frc(0x8006), 6);
        assert_eq!(decode_frc(FRC_FAILED), i16::MAX);
    }

    #[test]
    fn test_temperature_offset_encoding() {
        assert_eq!(encode_temperature_offset(4.0), 0x05d9);
        assert_eq!(encode_temperature_offset(0.0), 0);
        // Negative offsets saturate
        assert_eq!(encode_temperature_offset(-1.0), 0);

        let v = decode_temperature_offset(encode_temperature_offset(4.0));
        assert_approx_eq!(v, 4.0, 0.01);
    }
}
