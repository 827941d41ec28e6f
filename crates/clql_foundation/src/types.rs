//! Scalar type tags.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The tag of a [`Value`](crate::Value).
///
/// Fact attributes are dynamically typed; comparison operators dispatch on
/// this tag and fail (rather than error) when the tags are incompatible.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScalarType {
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// String type.
    String,
}

impl ScalarType {
    /// Returns true for the numeric tags (`Int` and `Float`).
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Returns true if values of the two tags can be ordered against each other.
    ///
    /// Only numeric pairs are ordered; mixed int/float pairs are coerced.
    #[must_use]
    pub const fn orderable_with(self, other: Self) -> bool {
        self.is_numeric() && other.is_numeric()
    }
}

impl fmt::Debug for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
