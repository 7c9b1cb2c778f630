//! Scd4x command-line utility
//!
//! Copyright 2019 Ryan Kurte

extern crate embedded_hal;
extern crate linux_embedded_hal;
use linux_embedded_hal::{I2cdev, Delay};

extern crate structopt;
use structopt::StructOpt;

extern crate humantime;
use humantime::{Duration as HumanDuration};

#[macro_use] extern crate log;
extern crate simplelog;
use simplelog::{TermLogger, LevelFilter};

extern crate sensor_scd4x;
use sensor_scd4x::{Scd4x, CrcPolicy, Error};
use sensor_scd4x::device::DEFAULT_ADDRESS;

#[derive(StructOpt)]
#[structopt(name = "scd4x-util")]
/// A Command Line Interface (CLI) for interacting with a local Scd4x environmental sensor over I2C
pub struct Options {

    #[structopt(subcommand)]
    command: Option<Operation>,

    /// Specify the i2c interface to use to connect to the scd4x device
    #[structopt(short="d", long = "i2c", default_value = "/dev/i2c-1", env = "SCD4X_I2C")]
    i2c: String,

    /// Specify the i2c address of the scd4x device (hex)
    #[structopt(long = "address", default_value = "62", parse(try_from_str = "parse_hex"))]
    address: u8,

    /// Specify period for taking measurements
    #[structopt(short = "p", long = "sample-period", default_value="5s")]
    pub period: HumanDuration,

    /// Delay between sensor poll operations
    #[structopt(long = "poll-delay", default_value="100ms")]
    pub poll_delay: HumanDuration,

    /// Number of allowed I2C errors (per measurement attempt) prior to exiting
    #[structopt(long = "allowed-errors", default_value="3")]
    pub allowed_errors: usize,

    /// Reject responses with CRC mismatches instead of logging them
    #[structopt(long = "strict-crc")]
    pub strict_crc: bool,

    /// Enable verbose logging
    #[structopt(long = "log-level", default_value = "info")]
    level: LevelFilter,
}

#[derive(StructOpt, Clone, PartialEq, Debug)]
pub enum Operation {
    #[structopt(name = "measure")]
    /// Run periodic measurement and log readings (default)
    Measure {
        /// Use low power periodic measurement (~30s interval)
        #[structopt(long = "low-power")]
        low_power: bool,
    },

    #[structopt(name = "single-shot")]
    /// Take a single measurement (SCD41 only)
    SingleShot,

    #[structopt(name = "info")]
    /// Display serial number and configuration
    Info,

    #[structopt(name = "self-test")]
    /// Run the on-chip self test (takes 10s)
    SelfTest,

    #[structopt(name = "calibrate")]
    /// Perform forced recalibration against a reference CO2 concentration
    Calibrate {
        /// Reference CO2 concentration in ppm
        ppm: u16,
    },

    #[structopt(name = "set-altitude")]
    /// Set altitude compensation in meters above sea level
    SetAltitude {
        altitude: u16,
    },

    #[structopt(name = "set-pressure")]
    /// Set ambient pressure compensation in pascal
    SetPressure {
        pressure: u32,
    },

    #[structopt(name = "set-temp-offset")]
    /// Set temperature offset in degrees celsius
    SetTempOffset {
        offset: f32,
    },

    #[structopt(name = "enable-asc")]
    /// Enable automatic self-calibration
    EnableAsc,

    #[structopt(name = "disable-asc")]
    /// Disable automatic self-calibration
    DisableAsc,

    #[structopt(name = "persist")]
    /// Persist current settings to EEPROM
    Persist,

    #[structopt(name = "factory-reset")]
    /// Reset all settings and calibration history
    FactoryReset,
}

fn parse_hex(src: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(src.trim_start_matches("0x"), 16)
}

type I2cError = linux_embedded_hal::i2cdev::linux::LinuxI2CError;
type Sensor = Scd4x<I2cdev, Delay, I2cError>;

fn main() {
    // Load options
    let opts = Options::from_args();

    // Setup logging
    TermLogger::init(opts.level, simplelog::Config::default()).unwrap();

    debug!("Connecting to I2C device");
    let i2c = match I2cdev::new(&opts.i2c) {
        Ok(v) => v,
        Err(e) => {
            error!("Error opening I2C device '{}': {:?}", &opts.i2c, e);
            std::process::exit(-1);
        }
    };

    if opts.address != DEFAULT_ADDRESS {
        debug!("Using non-default address: {:#04x}", opts.address);
    }

    debug!("Connecting to SCD4x");
    let mut sensor = Scd4x::with_address(i2c, Delay, opts.address);

    if opts.strict_crc {
        sensor.set_crc_policy(CrcPolicy::Strict);
    }

    match sensor.begin() {
        Ok(serial) => info!("Connected to SCD4x, serial: {:#014x}", serial),
        Err(e) => {
            error!("Error connecting to SCD4x: {:?}", e);
            std::process::exit(-2);
        }
    }

    let command = opts.command.clone().unwrap_or(Operation::Measure{ low_power: false });

    let res = match command {
        Operation::Measure{ low_power } => measure(&mut sensor, &opts, low_power),
        Operation::SingleShot => {
            sensor.measure_single_shot()
                .and_then(|_| sensor.read_measurement())
                .map(|m| info!("CO2: {} ppm, Temperature: {:.2} C, Humidity: {:.2} %", m.co2, m.temp, m.rh))
        },
        Operation::Info => info(&mut sensor),
        Operation::SelfTest => {
            sensor.self_test().map(|v| match v {
                0 => info!("Self test passed"),
                _ => warn!("Self test failed: {:#06x}", v),
            })
        },
        Operation::Calibrate{ ppm } => {
            sensor.forced_recalibration(ppm).map(|c| info!("Applied correction: {} ppm", c))
        },
        Operation::SetAltitude{ altitude } => sensor.set_sensor_altitude(altitude),
        Operation::SetPressure{ pressure } => sensor.set_ambient_pressure(pressure),
        Operation::SetTempOffset{ offset } => sensor.set_temperature_offset(offset),
        Operation::EnableAsc => sensor.set_automatic_self_calibration(true),
        Operation::DisableAsc => sensor.set_automatic_self_calibration(false),
        Operation::Persist => sensor.persist_settings(),
        Operation::FactoryReset => sensor.factory_reset(),
    };

    if let Err(e) = res {
        error!("Operation failed: {:?}", e);
        std::process::exit(-3);
    }
}

fn info(sensor: &mut Sensor) -> Result<(), Error<I2cError>> {
    let serial = sensor.serial_number()?;
    let offset = sensor.temperature_offset()?;
    let altitude = sensor.sensor_altitude()?;
    let asc = sensor.automatic_self_calibration()?;

    info!("Serial: {:#014x}", serial);
    info!("Temperature offset: {:.2} C", offset);
    info!("Altitude: {} m", altitude);
    info!("Automatic self-calibration: {}", asc);

    Ok(())
}

fn measure(sensor: &mut Sensor, opts: &Options, low_power: bool) -> Result<(), Error<I2cError>> {
    debug!("Starting sensor polling");
    match low_power {
        true => sensor.start_low_power_periodic_measurement()?,
        false => sensor.start_periodic_measurement()?,
    }

    debug!("Waiting for sensor to initialise");
    std::thread::sleep(*opts.period);

    loop {
        debug!("Starting sensor read cycle");

        let mut ready = false;
        let mut errors = 0;

        // Poll for sensor ready
        for _i in 0..100 {
            match sensor.data_ready() {
                Ok(true) => {
                    ready = true;
                    break;
                },
                Ok(false) => {
                    std::thread::sleep(*opts.poll_delay);
                },
                Err(e) => {
                    warn!("Error polling for sensor ready: {:?}", e);
                    errors += 1;
                }
            };

            if errors > opts.allowed_errors {
                error!("Exceeded maximum allowed I2C errors");
                std::process::exit(-4);
            }
        }

        debug!("Sensor data ready state: {:?}", ready);

        if !ready {
            warn!("Sensor data ready timed-out");
            std::thread::sleep(*opts.period);
            continue;
        }

        // If we're ready, attempt to read the data
        for _i in 0..10 {
            match sensor.read_measurement() {
                Ok(m) => {
                    info!("CO2: {} ppm, Temperature: {:.2} C, Humidity: {:.2} %", m.co2, m.temp, m.rh);
                    break;
                },
                Err(e) => {
                    warn!("Error reading sensor data: {:?}", e);
                    errors += 1;
                },
            }

            if errors > opts.allowed_errors {
                error!("Exceeded maximum allowed I2C errors");
                std::process::exit(-5);
            }
        }

        // Wait for enough time for another sensor reading
        std::thread::sleep(*opts.period);
    }
}
