// SPDX-License-Identifier: MIT

//! Reading and writing field values in a raw HID report.
//!
//! The `report` buffer is the report payload *without* a leading
//! report ID byte: [Location::bit_offset] counts from the first bit
//! after the report ID, matching the offsets the [Parser](crate::Parser)
//! produces. Fields are little-endian and may start at any bit.
//!
//! ```
//! # use hidparse::{data, Location};
//! // a 4-bit field starting at bit 6
//! let location = Location { bit_offset: 6, bit_size: 4, count: 1 };
//! let report = [0b1100_0000, 0b0000_0010];
//! assert_eq!(data::get_unsigned(&report, &location).unwrap(), 0b1011);
//! assert_eq!(data::get_signed(&report, &location).unwrap(), -5);
//! ```

use crate::{ensure, Location};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DataError {
    #[error("Report of {len} bytes is too short, field needs {needed} bytes")]
    OutOfBounds { needed: usize, len: usize },
    #[error("Unsupported field size of {bits} bits")]
    InvalidSize { bits: usize },
}

type Result<T> = std::result::Result<T, DataError>;

/// The byte range covering the location, after checking it against the
/// report length. The range is never longer than 5 bytes.
fn byte_range(report_len: usize, location: &Location) -> Result<std::ops::Range<usize>> {
    let bits = location.bit_size;
    ensure!(bits <= 32, DataError::InvalidSize { bits });
    let start = location.bit_offset / 8;
    let end = location
        .bit_offset
        .checked_add(bits)
        .ok_or(DataError::OutOfBounds {
            needed: usize::MAX,
            len: report_len,
        })?
        .div_ceil(8);
    ensure!(
        end <= report_len,
        DataError::OutOfBounds {
            needed: end,
            len: report_len
        }
    );
    Ok(start..end)
}

fn mask(bits: usize) -> u64 {
    (1u64 << bits) - 1
}

/// Extracts the unsigned value of the field at `location`.
/// A field of size zero always reads as 0.
pub fn get_unsigned(report: &[u8], location: &Location) -> Result<u32> {
    if location.bit_size == 0 {
        return Ok(0);
    }
    let range = byte_range(report.len(), location)?;
    let data = report[range]
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, b)| acc | (u64::from(*b) << (i * 8)));
    let value = (data >> (location.bit_offset % 8)) & mask(location.bit_size);
    Ok(value as u32)
}

/// Extracts the value of the field at `location` as two's complement
/// number of `bit_size` bits.
pub fn get_signed(report: &[u8], location: &Location) -> Result<i32> {
    let value = i64::from(get_unsigned(report, location)?);
    let bits = location.bit_size;
    if bits == 0 || value < (1i64 << (bits - 1)) {
        return Ok(value as i32);
    }
    Ok((value - (1i64 << bits)) as i32)
}

/// Writes the lower `bit_size` bits of `value` into the field at
/// `location`. Bits outside the field are left untouched.
pub fn set_unsigned(report: &mut [u8], location: &Location, value: u32) -> Result<()> {
    if location.bit_size == 0 {
        return Ok(());
    }
    let range = byte_range(report.len(), location)?;
    let shift = location.bit_offset % 8;
    let field_mask = mask(location.bit_size) << shift;
    let value = (u64::from(value) << shift) & field_mask;
    for (i, b) in report[range].iter_mut().enumerate() {
        let m = (field_mask >> (i * 8)) as u8;
        let v = (value >> (i * 8)) as u8;
        *b = (*b & !m) | v;
    }
    Ok(())
}

/// Writes `value` into the field at `location` as two's complement
/// number of `bit_size` bits.
pub fn set_signed(report: &mut [u8], location: &Location, value: i32) -> Result<()> {
    set_unsigned(report, location, value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(bit_offset: usize, bit_size: usize) -> Location {
        Location {
            bit_offset,
            bit_size,
            count: 1,
        }
    }

    #[test]
    fn unsigned_byte_aligned() {
        let report = [0x01, 0x80, 0x34, 0x12];
        assert_eq!(get_unsigned(&report, &loc(0, 8)).unwrap(), 0x01);
        assert_eq!(get_unsigned(&report, &loc(8, 8)).unwrap(), 0x80);
        assert_eq!(get_unsigned(&report, &loc(16, 16)).unwrap(), 0x1234);
        assert_eq!(get_unsigned(&report, &loc(0, 32)).unwrap(), 0x12348001);
    }

    #[test]
    fn unsigned_unaligned() {
        // three buttons, 5 bit padding
        let report = [0b1111_1101];
        assert_eq!(get_unsigned(&report, &loc(0, 1)).unwrap(), 1);
        assert_eq!(get_unsigned(&report, &loc(1, 1)).unwrap(), 0);
        assert_eq!(get_unsigned(&report, &loc(2, 1)).unwrap(), 1);
        assert_eq!(get_unsigned(&report, &loc(3, 5)).unwrap(), 0b11111);

        // 12 bits spanning a byte boundary
        let report = [0xab, 0xcd, 0xef];
        assert_eq!(get_unsigned(&report, &loc(4, 12)).unwrap(), 0xcda);
        assert_eq!(get_unsigned(&report, &loc(12, 12)).unwrap(), 0xefc);
    }

    #[test]
    fn unsigned_32_bits_unaligned() {
        // 32 bits starting at bit 7 need 5 bytes
        let report = [0x80, 0xff, 0xff, 0xff, 0x7f];
        assert_eq!(get_unsigned(&report, &loc(7, 32)).unwrap(), u32::MAX);
        assert_eq!(get_signed(&report, &loc(7, 32)).unwrap(), -1);
    }

    #[test]
    fn zero_size() {
        assert_eq!(get_unsigned(&[], &loc(100, 0)).unwrap(), 0);
        assert_eq!(get_signed(&[], &loc(100, 0)).unwrap(), 0);
        let mut report = [0xff];
        set_unsigned(&mut report, &loc(0, 0), 0).unwrap();
        assert_eq!(report, [0xff]);
    }

    #[test]
    fn signed() {
        let report = [0b1000];
        assert_eq!(get_signed(&report, &loc(0, 4)).unwrap(), -8);
        let report = [0b0111];
        assert_eq!(get_signed(&report, &loc(0, 4)).unwrap(), 7);
        let report = [0xff];
        assert_eq!(get_signed(&report, &loc(0, 8)).unwrap(), -1);
        assert_eq!(get_signed(&report, &loc(0, 1)).unwrap(), -1);
        let report = [0x00, 0x80];
        assert_eq!(get_signed(&report, &loc(0, 16)).unwrap(), i16::MIN as i32);
        let report = [0x00, 0x00, 0x00, 0x80];
        assert_eq!(get_signed(&report, &loc(0, 32)).unwrap(), i32::MIN);
    }

    #[test]
    fn out_of_bounds() {
        let report = [0u8; 2];
        assert_eq!(
            get_unsigned(&report, &loc(12, 8)),
            Err(DataError::OutOfBounds { needed: 3, len: 2 })
        );
        assert_eq!(
            get_unsigned(&report, &loc(0, 33)),
            Err(DataError::InvalidSize { bits: 33 })
        );
        let mut report = [0u8; 1];
        assert!(set_unsigned(&mut report, &loc(4, 8), 1).is_err());
    }

    #[test]
    fn offset_at_end_of_address_space() {
        let report = [0u8; 4];
        let location = loc(usize::MAX - 2, 8);
        assert!(matches!(
            get_unsigned(&report, &location),
            Err(DataError::OutOfBounds { len: 4, .. })
        ));
        assert!(matches!(
            get_signed(&report, &location),
            Err(DataError::OutOfBounds { .. })
        ));
        let mut report = [0u8; 4];
        assert!(set_signed(&mut report, &location, -1).is_err());
        assert_eq!(report, [0u8; 4]);
    }

    #[test]
    fn set_preserves_neighbours() {
        let mut report = [0xff, 0xff, 0xff];
        set_unsigned(&mut report, &loc(5, 10), 0).unwrap();
        assert_eq!(report, [0b0001_1111, 0b1000_0000, 0xff]);

        let mut report = [0u8; 3];
        set_unsigned(&mut report, &loc(5, 10), 0xffff_ffff).unwrap();
        assert_eq!(report, [0b1110_0000, 0b0111_1111, 0x00]);
    }

    #[test]
    fn write_then_read() {
        for bits in 1..=32usize {
            for offset in 0..8usize {
                let location = loc(offset + 8, bits);
                let value = 0xa5c3_5a3cu32;
                let masked = (u64::from(value) & mask(bits)) as u32;

                let mut report = [0u8; 6];
                set_unsigned(&mut report, &location, value).unwrap();
                assert_eq!(
                    get_unsigned(&report, &location).unwrap(),
                    masked,
                    "{bits} bits at offset {offset}"
                );
                // everything outside the field is still zero
                set_unsigned(&mut report, &location, 0).unwrap();
                assert_eq!(report, [0u8; 6]);
            }
        }
    }

    #[test]
    fn signed_write_then_read() {
        let location = loc(3, 6);
        let mut report = [0u8; 2];
        for value in -32..32 {
            set_signed(&mut report, &location, value).unwrap();
            assert_eq!(get_signed(&report, &location).unwrap(), value);
        }
    }
}
