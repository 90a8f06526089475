//! Base data types shared by the packet model and the shadow state.

use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::error::ProtoError;

/// Scale of fixed-point wire positions (`value * 32`).
pub const FIXED_POINT_SCALE: f64 = 32.0;

/// Convert a fixed-point wire coordinate to a float.
#[inline]
pub fn from_fixed_point(value: i32) -> f64 {
    value as f64 / FIXED_POINT_SCALE
}

/// Convert a protocol angle byte (1/256 of a turn) to degrees.
#[inline]
pub fn angle_to_degrees(value: i8) -> f32 {
    value as f32 * 360.0 / 256.0
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VarIntError {
    #[error("buffer too short")]
    BufferTooShort,
    #[error("VarInt is too long (more than {max_bytes} bytes)")]
    TooManyBytes { max_bytes: usize },
}

// ---------------------------------------------------------------------------
// VarInt (i32, LEB128 over the two's complement bits, no ZigZag)
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Maximum number of bytes a VarInt can occupy.
    pub const MAX_BYTES: usize = 5;

    /// Encode into `buf`, returning the number of bytes written.
    pub fn encode(&self, buf: &mut impl BufMut) -> usize {
        let mut value = self.0 as u32;
        let mut written = 0;
        loop {
            written += 1;
            if value & !0x7F == 0 {
                buf.put_u8(value as u8);
                return written;
            }
            buf.put_u8((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
    }

    /// Decode from the front of `buf`, returning the value and bytes consumed.
    ///
    /// Returns [`VarIntError::BufferTooShort`] when `buf` ends mid-value so
    /// callers reading from a stream can wait for more data.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), VarIntError> {
        let mut result: u32 = 0;
        for (i, byte) in buf.iter().enumerate() {
            if i >= Self::MAX_BYTES {
                return Err(VarIntError::TooManyBytes {
                    max_bytes: Self::MAX_BYTES,
                });
            }
            result |= ((byte & 0x7F) as u32) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok((Self(result as i32), i + 1));
            }
        }
        if buf.len() >= Self::MAX_BYTES {
            return Err(VarIntError::TooManyBytes {
                max_bytes: Self::MAX_BYTES,
            });
        }
        Err(VarIntError::BufferTooShort)
    }

    /// Decode and advance a [`Buf`].
    pub fn read(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let (value, len) = Self::decode(buf.chunk())?;
        buf.advance(len);
        Ok(value)
    }

    /// Number of bytes this value occupies when encoded.
    pub fn encoded_len(&self) -> usize {
        let value = self.0 as u32;
        match value {
            0..=0x7F => 1,
            0x80..=0x3FFF => 2,
            0x4000..=0x1F_FFFF => 3,
            0x20_0000..=0x0FFF_FFFF => 4,
            _ => 5,
        }
    }
}

impl From<i32> for VarInt {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

impl From<VarInt> for i32 {
    fn from(v: VarInt) -> Self {
        v.0
    }
}

impl fmt::Debug for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarInt({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Vec3 (f64 x, y, z)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a position from fixed-point wire coordinates.
    pub fn from_fixed_point(x: i32, y: i32, z: i32) -> Self {
        Self::new(from_fixed_point(x), from_fixed_point(y), from_fixed_point(z))
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &Vec3) -> f64 {
        (*self - *other).length()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Uuid (serialized as a hyphenated hex string)
// ---------------------------------------------------------------------------

/// Stable player identity. Decoded fields carry it as a hyphenated string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uuid(pub u128);

impl Uuid {
    pub const NIL: Self = Self(0);
}

#[derive(Debug, Error)]
#[error("invalid UUID: {0}")]
pub struct UuidParseError(String);

impl FromStr for Uuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 {
            return Err(UuidParseError(s.to_string()));
        }
        u128::from_str_radix(&hex, 16)
            .map(Self)
            .map_err(|_| UuidParseError(s.to_string()))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = format!("{:032x}", self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

impl Serialize for Uuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
