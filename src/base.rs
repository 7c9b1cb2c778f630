//! Base communication implementation for interacting with Scd4x device
//!
//! Copyright 2019 Ryan Kurte

use core::fmt::Debug;

use embedded_hal::blocking::i2c;

use crate::{Error};
use crate::device::*;

/// Base API for reading and writing to the device
/// This should not be required by consumers, but is exposed to support alternate use
pub trait Base<Err> {
    /// Write a command to the device with an optional data word, packed with its CRC
    fn write_command(&mut self, address: u8, command: Command, data: Option<u16>) -> Result<(), Error<Err>>;
    /// Read information from the device, returning the number of bytes received
    fn read_command(&mut self, address: u8, command: Command, data: &mut [u8]) -> Result<usize, Error<Err>>;
    /// Read a response without issuing a command, for commands with a delayed response
    fn read_response(&mut self, address: u8, data: &mut [u8]) -> Result<usize, Error<Err>>;
}

/// Helper for device CRC-8 calculation
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;

    // For each byte
    for v in data {
        // XOR with current byte
        crc ^= v;

        // For each bit, MSB first
        for _bit in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    // Apply final xor
    crc ^ CRC_XOR
}

/// Pack a u16 into a 3-byte wire word (MSB, LSB, CRC)
pub fn pack(value: u16) -> [u8; 3] {
    let b = value.to_be_bytes();
    [b[0], b[1], crc8(&b)]
}

/// Unpack a 3-byte wire word (MSB, LSB, CRC)
/// Returns the value and, on checksum mismatch, the (expected, received) CRC pair
pub fn unpack(word: &[u8]) -> (u16, Option<(u8, u8)>) {
    // Words MUST be 3 bytes long
    assert_eq!(word.len(), 3);

    let v = u16::from_be_bytes([word[0], word[1]]);

    let crc = crc8(&word[..2]);
    let mismatch = match crc == word[2] {
        true => None,
        false => Some((crc, word[2])),
    };

    (v, mismatch)
}

/// Base implementation for I2C devices
impl <Conn, Err> Base<Err> for Conn where
    Conn: i2c::Read<Error=Err> + i2c::Write<Error=Err> + i2c::WriteRead<Error=Err>,
    Err: Debug,
{
    fn write_command(&mut self, address: u8, command: Command, data: Option<u16>) -> Result<(), Error<Err>> {
        let c = command as u16;

        let mut buff = [0u8; 5];
        buff[..2].copy_from_slice(&c.to_be_bytes());

        let len = match data {
            Some(d) => {
                buff[2..].copy_from_slice(&pack(d));
                5
            },
            None => 2,
        };

        trace!("Writing command: {:?} ({:#06x}) data: {:x?}", command, c, data);

        self.write(address, &buff[..len]).map_err(Error::Conn)
    }

    fn read_command(&mut self, address: u8, command: Command, data: &mut [u8]) -> Result<usize, Error<Err>> {
        // Write command to initialise read
        let c = command as u16;
        let cmd = c.to_be_bytes();

        trace!("Writing command: {:x?}", cmd);

        // First write the read command, ending the transaction
        self.write(address, &cmd)
            .map_err(Error::Conn)?;

        // Then, read the data back
        self.read_response(address, data)
    }

    fn read_response(&mut self, address: u8, data: &mut [u8]) -> Result<usize, Error<Err>> {
        self.read(address, data)
            .map_err(Error::Conn)?;

        trace!("Read data: {:x?}", data);

        Ok(data.len())
    }
}
