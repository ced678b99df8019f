//! Intel HEX loader and writer
//!
//! Record layout: `:LLAAAATT<data>CC` where `LL` is the data length, `AAAA`
//! the 16-bit offset, `TT` the record type and `CC` the two's complement
//! checksum of all preceding bytes.

use crate::error::{IsaError, Result};
use crate::image::FirmwareImage;
use crate::MAX_FLASH_BYTES;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::char;
use nom::combinator::{all_consuming, map_res};
use nom::multi::many1;
use nom::sequence::preceded;
use nom::IResult;
use std::fmt::Write as _;

/// Data bytes per emitted record
const RECORD_DATA_LEN: usize = 16;

/// Intel HEX record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Data,
    EndOfFile,
    ExtendedSegmentAddress,
    StartSegmentAddress,
    ExtendedLinearAddress,
    StartLinearAddress,
}

impl RecordKind {
    fn from_u8(kind: u8) -> Option<Self> {
        match kind {
            0x00 => Some(RecordKind::Data),
            0x01 => Some(RecordKind::EndOfFile),
            0x02 => Some(RecordKind::ExtendedSegmentAddress),
            0x03 => Some(RecordKind::StartSegmentAddress),
            0x04 => Some(RecordKind::ExtendedLinearAddress),
            0x05 => Some(RecordKind::StartLinearAddress),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            RecordKind::Data => 0x00,
            RecordKind::EndOfFile => 0x01,
            RecordKind::ExtendedSegmentAddress => 0x02,
            RecordKind::StartSegmentAddress => 0x03,
            RecordKind::ExtendedLinearAddress => 0x04,
            RecordKind::StartLinearAddress => 0x05,
        }
    }
}

/// One validated record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub offset: u16,
    pub data: Vec<u8>,
}

fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |digits: &str| u8::from_str_radix(digits, 16),
    )(input)
}

fn record_bytes(input: &str) -> IResult<&str, Vec<u8>> {
    all_consuming(preceded(char(':'), many1(hex_byte)))(input)
}

/// Parse and validate a single record line (1-based `line` for errors)
pub fn parse_record(text: &str, line: usize) -> Result<Record> {
    let (_, bytes) = record_bytes(text).map_err(|_| IsaError::MalformedRecord { line })?;

    // count + offset(2) + type + checksum
    if bytes.len() < 5 {
        return Err(IsaError::MalformedRecord { line });
    }

    let expected = bytes[0] as usize + 5;
    if bytes.len() != expected {
        return Err(IsaError::ByteCountMismatch {
            line,
            expected: bytes[0] as usize,
            found: bytes.len().saturating_sub(5),
        });
    }

    let (body, checksum) = bytes.split_at(bytes.len() - 1);
    let computed = checksum_of(body);
    if computed != checksum[0] {
        return Err(IsaError::ChecksumMismatch {
            line,
            expected: computed,
            found: checksum[0],
        });
    }

    let kind = RecordKind::from_u8(bytes[3])
        .ok_or(IsaError::UnknownRecordType { line, kind: bytes[3] })?;

    Ok(Record {
        kind,
        offset: u16::from_be_bytes([bytes[1], bytes[2]]),
        data: body[4..].to_vec(),
    })
}

fn checksum_of(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
        .wrapping_neg()
}

fn address_word(record: &Record, line: usize) -> Result<u32> {
    match record.data.as_slice() {
        [hi, lo] => Ok(u32::from(u16::from_be_bytes([*hi, *lo]))),
        other => Err(IsaError::ByteCountMismatch {
            line,
            expected: 2,
            found: other.len(),
        }),
    }
}

impl FirmwareImage {
    /// Populate an image from Intel HEX text
    pub fn from_ihex(text: &str) -> Result<Self> {
        let mut image = FirmwareImage::new();
        let mut base: u32 = 0;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let record = parse_record(raw, line)?;
            match record.kind {
                RecordKind::Data => {
                    let addr = u64::from(base) + u64::from(record.offset);
                    let end = addr + record.data.len() as u64;
                    if end > u64::from(MAX_FLASH_BYTES) {
                        return Err(IsaError::AddressOutOfRange { line, end });
                    }
                    image.write(addr as u32, &record.data);
                }
                RecordKind::EndOfFile => return Ok(image),
                RecordKind::ExtendedSegmentAddress => {
                    base = address_word(&record, line)? << 4;
                }
                RecordKind::ExtendedLinearAddress => {
                    base = address_word(&record, line)? << 16;
                }
                // Start addresses do not affect memory contents
                RecordKind::StartSegmentAddress | RecordKind::StartLinearAddress => {}
            }
        }

        Err(IsaError::MissingEndOfFile)
    }

    /// Render the image as Intel HEX with 16-byte data records
    pub fn to_ihex(&self) -> String {
        let mut out = String::new();
        let mut upper: u32 = 0;

        for (i, chunk) in self.as_bytes().chunks(RECORD_DATA_LEN).enumerate() {
            let addr = (i * RECORD_DATA_LEN) as u32;
            if addr >> 16 != upper {
                upper = addr >> 16;
                push_record(
                    &mut out,
                    RecordKind::ExtendedLinearAddress,
                    0,
                    &(upper as u16).to_be_bytes(),
                );
            }
            push_record(&mut out, RecordKind::Data, addr as u16, chunk);
        }

        push_record(&mut out, RecordKind::EndOfFile, 0, &[]);
        out
    }
}

fn push_record(out: &mut String, kind: RecordKind, offset: u16, data: &[u8]) {
    let mut bytes = Vec::with_capacity(data.len() + 4);
    bytes.push(data.len() as u8);
    bytes.extend_from_slice(&offset.to_be_bytes());
    bytes.push(kind.to_u8());
    bytes.extend_from_slice(data);
    bytes.push(checksum_of(&bytes));

    out.push(':');
    for b in &bytes {
        let _ = write!(out, "{:02X}", b);
    }
    out.push('\n');
}
