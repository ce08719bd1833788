//! Fixed-width bit vectors and their signed/unsigned views.
//!
//! Every net in a running circuit stores exactly one [`Bits`]. The unsigned
//! and two's-complement signed readings of a pin are both derived from that
//! single vector, so they are always bit-identical reinterpretations of each
//! other.

use std::fmt;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("value {value} does not fit in {width} bits as {kind} integer")]
    OutOfRange {
        value: String,
        width: usize,
        kind: &'static str,
    },
    #[error("{width}-bit value does not fit in a 64-bit integer")]
    TooWide { width: usize },
    #[error("bit vectors must be at least 1 bit wide")]
    ZeroWidth,
}

/// All-ones mask of the given width.
pub(crate) fn mask(width: usize) -> BigUint {
    (BigUint::one() << width) - 1u32
}

/// A bit vector of a fixed width. The stored value is always `< 2^width`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bits {
    value: BigUint,
    width: usize,
}

impl Bits {
    pub fn zero(width: usize) -> Self {
        Self {
            value: BigUint::zero(),
            width,
        }
    }

    /// Builds a vector from an unsigned payload, truncating bits at and above `width`.
    pub(crate) fn truncate(value: BigUint, width: usize) -> Self {
        let value = if value.bits() > width as u64 {
            value & mask(width)
        } else {
            value
        };
        Self { value, width }
    }

    pub(crate) fn from_bool(bit: bool) -> Self {
        Self {
            value: if bit { BigUint::one() } else { BigUint::zero() },
            width: 1,
        }
    }

    pub fn from_biguint(value: BigUint, width: usize) -> Result<Self, ValueError> {
        if width == 0 {
            return Err(ValueError::ZeroWidth);
        }
        if value.bits() > width as u64 {
            return Err(ValueError::OutOfRange {
                value: value.to_string(),
                width,
                kind: "an unsigned",
            });
        }
        Ok(Self { value, width })
    }

    pub fn from_unsigned(value: u64, width: usize) -> Result<Self, ValueError> {
        Self::from_biguint(BigUint::from(value), width)
    }

    pub fn from_signed(value: i64, width: usize) -> Result<Self, ValueError> {
        Self::from_bigint(&BigInt::from(value), width)
    }

    /// Encodes a signed integer as a `width`-bit two's-complement vector.
    pub fn from_bigint(value: &BigInt, width: usize) -> Result<Self, ValueError> {
        if width == 0 {
            return Err(ValueError::ZeroWidth);
        }
        let half = BigInt::one() << (width - 1);
        let min = -half.clone();
        let max = half - BigInt::one();
        if *value < min || *value > max {
            return Err(ValueError::OutOfRange {
                value: value.to_string(),
                width,
                kind: "a signed",
            });
        }
        let encoded = if value.sign() == Sign::Minus {
            value + (BigInt::one() << width)
        } else {
            value.clone()
        };
        Ok(Self {
            value: encoded.magnitude().clone(),
            width,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn into_value(self) -> BigUint {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn bit(&self, index: usize) -> bool {
        index < self.width && self.value.bit(index as u64)
    }

    /// Most significant bit, i.e. the sign bit of the signed view.
    pub fn is_negative(&self) -> bool {
        self.width > 0 && self.bit(self.width - 1)
    }

    pub fn to_u64(&self) -> Result<u64, ValueError> {
        if self.width > 64 {
            return Err(ValueError::TooWide { width: self.width });
        }
        self.value
            .to_u64()
            .ok_or(ValueError::TooWide { width: self.width })
    }

    pub fn to_i64(&self) -> Result<i64, ValueError> {
        if self.width > 64 {
            return Err(ValueError::TooWide { width: self.width });
        }
        self.to_bigint()
            .to_i64()
            .ok_or(ValueError::TooWide { width: self.width })
    }

    /// Two's-complement reading of the vector.
    pub fn to_bigint(&self) -> BigInt {
        let unsigned = BigInt::from(self.value.clone());
        if self.is_negative() {
            unsigned - (BigInt::one() << self.width)
        } else {
            unsigned
        }
    }

    /// Bits `lsb..=msb` as a new vector of width `msb - lsb + 1`.
    pub fn slice(&self, lsb: usize, msb: usize) -> Bits {
        let width = msb - lsb + 1;
        Bits::truncate(&self.value >> lsb, width)
    }

    /// Overwrites bits `lsb..lsb + bits.width()` with `bits`.
    pub(crate) fn write_slice(&mut self, lsb: usize, bits: &Bits) {
        let width = bits.width.min(self.width.saturating_sub(lsb));
        if width == 0 {
            return;
        }
        let hole = mask(self.width) ^ (mask(width) << lsb);
        let incoming = (&bits.value & mask(width)) << lsb;
        self.value = (&self.value & hole) | incoming;
    }

    /// Zero-extends or truncates to `width`.
    pub fn resize(&self, width: usize) -> Bits {
        Bits::truncate(self.value.clone(), width)
    }

    /// Sign-extends (or truncates) to `width`.
    pub fn sign_extend(&self, width: usize) -> Bits {
        if width <= self.width || !self.is_negative() {
            return self.resize(width);
        }
        let fill = mask(width) ^ mask(self.width);
        Bits {
            value: &self.value | fill,
            width,
        }
    }

    /// MSB-first binary digits, padded to the full width.
    pub fn to_binary_string(&self) -> String {
        format!("{:0>width$}", self.value.to_str_radix(2), width = self.width)
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'h{:x}", self.width, self.value)
    }
}
