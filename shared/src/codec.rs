//! Integer width negotiation and fixed-width unsigned decoding.
//!
//! A session picks one width from the first byte the server sends and keeps
//! it, together with the byte order, for every coordinate that follows.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Byte order used for width-encoded payload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Classify the first in-memory byte of the pattern `0xABCD`.
    pub fn from_probe(first_byte: u8) -> Option<Self> {
        match first_byte {
            0xCD => Some(Endianness::Little),
            0xAB => Some(Endianness::Big),
            _ => None,
        }
    }

    /// Byte order of the running host.
    pub fn native() -> Self {
        let probe = 0xABCD_u16.to_ne_bytes();
        match Self::from_probe(probe[0]) {
            Some(order) => order,
            None => unreachable!("host is neither little- nor big-endian"),
        }
    }
}

/// Byte length of one scalar coordinate on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerWidth {
    One,
    Two,
    Four,
    Eight,
}

impl IntegerWidth {
    /// Map the handshake indicator (bits per coordinate) to a width. The
    /// byte count is `indicator / 8`; any remainder is discarded.
    pub fn negotiate(indicator: u8) -> ProtocolResult<Self> {
        match indicator / 8 {
            1 => Ok(IntegerWidth::One),
            2 => Ok(IntegerWidth::Two),
            4 => Ok(IntegerWidth::Four),
            8 => Ok(IntegerWidth::Eight),
            _ => Err(ProtocolError::UnsupportedWidth { indicator }),
        }
    }

    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            IntegerWidth::One => 1,
            IntegerWidth::Two => 2,
            IntegerWidth::Four => 4,
            IntegerWidth::Eight => 8,
        }
    }

    /// Indicator byte a server sends for this width.
    pub fn indicator(self) -> u8 {
        (self.bytes() * 8) as u8
    }

    /// Largest unsigned value representable in this width.
    pub fn max_value(self) -> u64 {
        match self {
            IntegerWidth::Eight => u64::MAX,
            w => (1u64 << (8 * w.bytes())) - 1,
        }
    }
}

/// Negotiated width plus byte order. Fixed for the life of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthCodec {
    pub width: IntegerWidth,
    pub endianness: Endianness,
}

impl WidthCodec {
    pub fn new(width: IntegerWidth, endianness: Endianness) -> Self {
        Self { width, endianness }
    }

    /// Decode one unsigned integer. The slice must be exactly one width long.
    #[inline]
    pub fn decode_unsigned(&self, bytes: &[u8]) -> ProtocolResult<u64> {
        let expected = self.width.bytes();
        if bytes.len() != expected {
            return Err(ProtocolError::ShortRead {
                expected,
                actual: bytes.len(),
            });
        }

        let value = match (self.width, self.endianness) {
            (IntegerWidth::One, _) => bytes[0] as u64,
            (IntegerWidth::Two, order) => {
                let mut b = [0u8; 2];
                b.copy_from_slice(bytes);
                match order {
                    Endianness::Little => u16::from_le_bytes(b) as u64,
                    Endianness::Big => u16::from_be_bytes(b) as u64,
                }
            }
            (IntegerWidth::Four, order) => {
                let mut b = [0u8; 4];
                b.copy_from_slice(bytes);
                match order {
                    Endianness::Little => u32::from_le_bytes(b) as u64,
                    Endianness::Big => u32::from_be_bytes(b) as u64,
                }
            }
            (IntegerWidth::Eight, order) => {
                let mut b = [0u8; 8];
                b.copy_from_slice(bytes);
                match order {
                    Endianness::Little => u64::from_le_bytes(b),
                    Endianness::Big => u64::from_be_bytes(b),
                }
            }
        };
        Ok(value)
    }

    /// Append `value`, truncated to the negotiated width, to `out`.
    pub fn encode_unsigned(&self, value: u64, out: &mut Vec<u8>) {
        let n = self.width.bytes();
        match self.endianness {
            Endianness::Little => out.extend_from_slice(&value.to_le_bytes()[..n]),
            Endianness::Big => out.extend_from_slice(&value.to_be_bytes()[8 - n..]),
        }
    }
}
