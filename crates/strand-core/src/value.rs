// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed values and the canonical payload byte encoding.
//!
//! Proc state and channel payloads are built from two shapes: fixed-width bit
//! vectors and tuples of values. The hook boundary sees only bytes, so the
//! encoding here is the contract between typed dataflow values and queue
//! payloads.
//!
//! Canonical encoding (little-endian):
//! - a `Bits { width }` leaf encodes as `ceil(width / 8)` little-endian
//!   bytes; bits above `width` in the final byte are zero.
//! - a tuple encodes as its fields' encodings concatenated in declared
//!   order, depth-first.
//!
//! The layout is deliberately explicit: changing it is a breaking change to
//! every payload crossing the hook boundary.

use bytes::Bytes;
use thiserror::Error;

/// Maximum width of a single `Bits` leaf. Wider payloads are tuples.
pub const MAX_BITS_WIDTH: u32 = 64;

/// Errors produced while constructing, encoding, or decoding values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    /// A `Bits` width of zero or above [`MAX_BITS_WIDTH`] was requested.
    #[error("invalid bits width: {width}")]
    InvalidWidth {
        /// The rejected width.
        width: u32,
    },
    /// A bits value had bits set above its declared width.
    #[error("value {bits:#x} does not fit in {width} bits")]
    ExcessBits {
        /// Declared width.
        width: u32,
        /// Offending raw value.
        bits: u64,
    },
    /// A byte buffer's length did not match the type's encoded width.
    #[error("payload length mismatch: expected {expected} bytes, got {got}")]
    LengthMismatch {
        /// Encoded byte width of the target type.
        expected: usize,
        /// Actual buffer length.
        got: usize,
    },
}

/// Type of a dataflow value: a bit vector or a tuple of types.
///
/// Types are plain shapes and may be written down freely; the codec and the
/// [`Value`] constructors validate leaf widths wherever a type meets data,
/// so a malformed type surfaces as [`ValueError::InvalidWidth`] rather than
/// producing an ill-formed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// Fixed-width bit vector, `1..=64` bits.
    Bits {
        /// Width in bits.
        width: u32,
    },
    /// Ordered, fixed-arity composite.
    Tuple(Vec<ValueType>),
}

impl ValueType {
    /// Shorthand for `ValueType::Bits { width }`.
    #[must_use]
    pub const fn bits(width: u32) -> Self {
        Self::Bits { width }
    }

    /// The empty tuple type, used for stateless procs.
    #[must_use]
    pub const fn unit() -> Self {
        Self::Tuple(Vec::new())
    }

    /// Total canonical-encoding width of this type in bytes.
    #[must_use]
    pub fn byte_width(&self) -> usize {
        match self {
            Self::Bits { width } => width.div_ceil(8) as usize,
            Self::Tuple(fields) => fields.iter().map(Self::byte_width).sum(),
        }
    }
}

impl core::fmt::Display for ValueType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bits { width } => write!(f, "bits[{width}]"),
            Self::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A typed dataflow value.
///
/// The representation is private so the leaf invariants — `1 <= width <= 64`
/// and no bits set at or above `width` — hold for every reachable value.
/// Construction goes through [`Value::bits`], [`Value::tuple`],
/// [`Value::zero`], or [`Value::from_bytes`], all of which validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value(Repr);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr {
    Bits { width: u32, bits: u64 },
    Tuple(Vec<Value>),
}

impl Value {
    /// Constructs a bits value, checking width bounds and excess bits.
    ///
    /// # Errors
    /// Returns [`ValueError::InvalidWidth`] for widths outside `1..=64` and
    /// [`ValueError::ExcessBits`] if `bits` does not fit in `width` bits.
    pub fn bits(width: u32, bits: u64) -> Result<Self, ValueError> {
        if width == 0 || width > MAX_BITS_WIDTH {
            return Err(ValueError::InvalidWidth { width });
        }
        if width < 64 && bits >> width != 0 {
            return Err(ValueError::ExcessBits { width, bits });
        }
        Ok(Self(Repr::Bits { width, bits }))
    }

    /// Assembles a tuple value from already-validated fields.
    #[must_use]
    pub fn tuple(fields: Vec<Value>) -> Self {
        Self(Repr::Tuple(fields))
    }

    /// The empty tuple value.
    #[must_use]
    pub const fn unit() -> Self {
        Self(Repr::Tuple(Vec::new()))
    }

    /// The all-zero value of a type.
    ///
    /// Predicate-false receives synthesize this so downstream computation
    /// always has a well-defined operand.
    ///
    /// # Errors
    /// Returns [`ValueError::InvalidWidth`] if the type carries a malformed
    /// leaf width.
    pub fn zero(ty: &ValueType) -> Result<Self, ValueError> {
        match ty {
            ValueType::Bits { width } => Self::bits(*width, 0),
            ValueType::Tuple(fields) => Ok(Self(Repr::Tuple(
                fields.iter().map(Self::zero).collect::<Result<_, _>>()?,
            ))),
        }
    }

    /// Returns the type of this value.
    #[must_use]
    pub fn type_of(&self) -> ValueType {
        match &self.0 {
            Repr::Bits { width, .. } => ValueType::Bits { width: *width },
            Repr::Tuple(fields) => ValueType::Tuple(fields.iter().map(Self::type_of).collect()),
        }
    }

    /// Returns true when this value has exactly the given type.
    #[must_use]
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (&self.0, ty) {
            (Repr::Bits { width, .. }, ValueType::Bits { width: w }) => width == w,
            (Repr::Tuple(vs), ValueType::Tuple(ts)) => {
                vs.len() == ts.len() && vs.iter().zip(ts).all(|(v, t)| v.conforms_to(t))
            }
            _ => false,
        }
    }

    /// Encodes this value into the canonical little-endian byte layout.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = Vec::with_capacity(self.type_of().byte_width());
        self.encode_into(&mut buf);
        Bytes::from(buf)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        match &self.0 {
            // Leaf widths are 1..=64 by construction, so the byte count
            // never exceeds the u64's eight bytes.
            Repr::Bits { width, bits } => {
                let nbytes = width.div_ceil(8) as usize;
                buf.extend_from_slice(&bits.to_le_bytes()[..nbytes]);
            }
            Repr::Tuple(fields) => {
                for field in fields {
                    field.encode_into(buf);
                }
            }
        }
    }

    /// Decodes a canonical payload into a value of the given type.
    ///
    /// # Errors
    /// Returns [`ValueError::LengthMismatch`] if `bytes` is not exactly the
    /// type's encoded width, [`ValueError::InvalidWidth`] for malformed
    /// types, and [`ValueError::ExcessBits`] if padding bits are set.
    pub fn from_bytes(ty: &ValueType, bytes: &[u8]) -> Result<Self, ValueError> {
        let expected = ty.byte_width();
        if bytes.len() != expected {
            return Err(ValueError::LengthMismatch {
                expected,
                got: bytes.len(),
            });
        }
        let mut cursor = bytes;
        Self::decode_from(ty, &mut cursor)
    }

    fn decode_from(ty: &ValueType, cursor: &mut &[u8]) -> Result<Self, ValueError> {
        match ty {
            ValueType::Bits { width } => {
                // Gate the width before any slicing: a type is caller input
                // and may carry a leaf wider than the u64 backing store.
                if *width == 0 || *width > MAX_BITS_WIDTH {
                    return Err(ValueError::InvalidWidth { width: *width });
                }
                let nbytes = width.div_ceil(8) as usize;
                let remaining: &[u8] = *cursor;
                let (head, rest) = remaining.split_at(nbytes);
                *cursor = rest;
                let mut raw = [0u8; 8];
                raw[..nbytes].copy_from_slice(head);
                Self::bits(*width, u64::from_le_bytes(raw))
            }
            ValueType::Tuple(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    values.push(Self::decode_from(field, cursor)?);
                }
                Ok(Self(Repr::Tuple(values)))
            }
        }
    }

    /// Returns `(width, bits)` of a bits value, or `None` for tuples.
    #[must_use]
    pub const fn as_bits(&self) -> Option<(u32, u64)> {
        match &self.0 {
            Repr::Bits { width, bits } => Some((*width, *bits)),
            Repr::Tuple(_) => None,
        }
    }

    /// Returns the tuple fields, or `None` for bits values.
    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match &self.0 {
            Repr::Bits { .. } => None,
            Repr::Tuple(fields) => Some(fields),
        }
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.0 {
            Repr::Bits { width, bits } => write!(f, "bits[{width}]:{bits}"),
            Repr::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
        }
    }
}
