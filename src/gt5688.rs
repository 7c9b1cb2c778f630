//! GT5688 touch controller configuration table
//!
//! The table is a 6-byte header followed by the register payload:
//!
//! | Offset | Field |
//! |---|---|
//! | 0 | register width in bytes (2, 16-bit register addresses) |
//! | 1 | value width in bytes (1, 8-bit register values) |
//! | 2..4 | start register address, big endian (0x8050) |
//! | 4..6 | payload length, big endian (0x00EF) |
//! | 6.. | 236 register values (0x8050..=0x813B), 2-byte checksum (0x813C), update flag (0x813E) |
//!
//! Copyright 2019 Ryan Kurte

/// Header length in bytes
pub const HEADER_LEN: usize = 6;

/// Number of configuration registers covered by the checksum
pub const REGISTER_COUNT: usize = 236;

/// Configuration table for an 800x480 panel
pub static CONFIG_TABLE: [u8; HEADER_LEN + 239] = [
    // Register width, value width
    0x02, 0x01,
    // Start address
    0x80, 0x50,
    // Payload length
    0x00, 0xef,
    0x42, 0x20, 0x03, 0xe0, 0x01, 0x05, 0x3d, 0x10, 0x01, 0x00, 0x08, 0x08,
    0x50, 0x3c, 0x53, 0x11, 0x00, 0x00, 0x00, 0x00, 0x14, 0x14, 0x14, 0x22,
    0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x3c, 0x00, 0x53, 0x00, 0x14, 0x00,
    0x00, 0x84, 0x00, 0x00, 0x00, 0x00, 0x00, 0x64, 0x1e, 0x1e, 0x8a, 0x2a,
    0x0c, 0x3c, 0x3e, 0xf4, 0x0a, 0x20, 0x33, 0x60, 0x12, 0x02, 0x24, 0x00,
    0x00, 0x32, 0x64, 0x00, 0x14, 0x02, 0x00, 0x00, 0x54, 0x80, 0x35, 0x7f,
    0x3d, 0x7f, 0x46, 0x7f, 0x51, 0x7f, 0x5d, 0x7f, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0xf0, 0x50, 0x3c, 0xbb, 0xbb, 0x07, 0x00, 0x00, 0x00,
    0x02, 0x0f, 0x14, 0x03, 0x04, 0x10, 0x42, 0xf8, 0x0f, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0x20,
    0x50, 0x3c, 0x3c, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0d, 0x06, 0x0c, 0x05,
    0x0b, 0x04, 0x0a, 0x03, 0x09, 0x02, 0x08, 0x01, 0xff, 0xff, 0x00, 0x01,
    0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
    0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x3c, 0x00, 0x05, 0x1e, 0x00, 0x02, 0x2a, 0x1e, 0x19, 0x14,
    0x02, 0x00, 0x03, 0x0a, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0x04, 0x22, 0x03, 0x00, 0x00, 0x33, 0x00, 0x14, 0x00,
    0x00, 0x28, 0x46, 0x32, 0x50, 0x00, 0x00, 0x00, 0xf9, 0xbd, 0x01,
];

/// Read-only view over a GT5688 configuration table
#[derive(Clone, Copy, Debug)]
pub struct ConfigTable<'a> {
    data: &'a [u8],
}

impl Default for ConfigTable<'static> {
    fn default() -> Self {
        ConfigTable{ data: &CONFIG_TABLE }
    }
}

impl <'a> ConfigTable<'a> {
    /// Wrap a raw table, returning None if it is shorter than its header declares
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < HEADER_LEN {
            return None;
        }

        let t = ConfigTable{ data };
        if data.len() < HEADER_LEN + t.len() || t.len() < REGISTER_COUNT + 3 {
            return None;
        }

        Some(t)
    }

    /// Register address width in bytes
    pub fn register_width(&self) -> u8 {
        self.data[0]
    }

    /// Register value width in bytes
    pub fn value_width(&self) -> u8 {
        self.data[1]
    }

    /// First register address written
    pub fn start_address(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Payload length in bytes (registers, checksum and update flag)
    pub fn len(&self) -> usize {
        u16::from_be_bytes([self.data[4], self.data[5]]) as usize
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full payload, as written starting at `start_address`
    pub fn payload(&self) -> &'a [u8] {
        &self.data[HEADER_LEN..HEADER_LEN + self.len()]
    }

    /// Configuration register values
    pub fn registers(&self) -> &'a [u8] {
        &self.payload()[..REGISTER_COUNT]
    }

    /// Stored configuration checksum
    pub fn checksum(&self) -> u16 {
        let p = self.payload();
        u16::from_be_bytes([p[REGISTER_COUNT], p[REGISTER_COUNT + 1]])
    }

    /// Configuration update flag
    pub fn update_flag(&self) -> u8 {
        self.payload()[REGISTER_COUNT + 2]
    }

    /// Maximum X and Y output coordinates (little endian, registers 0x8051..=0x8054)
    pub fn resolution(&self) -> (u16, u16) {
        let r = self.registers();
        (u16::from_le_bytes([r[1], r[2]]), u16::from_le_bytes([r[3], r[4]]))
    }

    /// Compute the checksum over the registers
    /// This is the two's complement of the sum of big endian 16-bit register pairs
    pub fn compute_checksum(&self) -> u16 {
        let sum = self.registers()
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .fold(0u16, |a, v| a.wrapping_add(v));

        0u16.wrapping_sub(sum)
    }

    /// Check the stored checksum matches the registers
    pub fn is_valid(&self) -> bool {
        let valid = self.compute_checksum() == self.checksum();
        if !valid {
            warn!("GT5688 config checksum mismatch (computed: {:#06x} stored: {:#06x})",
                self.compute_checksum(), self.checksum());
        }
        valid
    }
}
