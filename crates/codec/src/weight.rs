use std::fmt::{Display, Formatter, Result as FmtResult};
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// The reserved directory name for images that have never been rated.
pub const NOT_SHOWN: &str = "not-shown";

/// Selection weight of a category bucket.
///
/// A directory's weight is derived solely from its name; files never carry a
/// weight of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weight {
    /// Fresh content that hasn't been rated yet. Excluded from weighted
    /// selection, but eligible for a separate low-probability draw.
    NotShown,
    /// Relative probability mass contributed by every file in the bucket.
    Weighted(NonZeroU32),
}
impl Weight {
    /// Convenience constructor, returning [`ErrorKind::InvalidWeight`] for zero.
    pub fn weighted(n: u32) -> Result<Self, Error> {
        NonZeroU32::new(n)
            .map(Self::Weighted)
            .ok_or_else(|| Error::from(ErrorKind::InvalidWeight(n.to_string())))
    }

    /// The numeric weight, or `None` for [`Weight::NotShown`].
    pub fn get(&self) -> Option<u32> {
        match self {
            Self::NotShown => None,
            Self::Weighted(n) => Some(n.get()),
        }
    }

    pub fn is_not_shown(&self) -> bool {
        matches!(self, Self::NotShown)
    }
}
impl Default for Weight {
    /// Files outside a decodable category are treated as weight 1.
    fn default() -> Self {
        Self::Weighted(NonZeroU32::MIN)
    }
}
impl From<NonZeroU32> for Weight {
    fn from(value: NonZeroU32) -> Self {
        Self::Weighted(value)
    }
}
impl FromStr for Weight {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == NOT_SHOWN {
            return Ok(Self::NotShown);
        }
        // `u32::from_str` accepts a leading '+', which would never round-trip.
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            exn::bail!(ErrorKind::InvalidWeight(s.to_string()));
        }
        match s.parse::<NonZeroU32>() {
            Ok(n) => Ok(Self::Weighted(n)),
            Err(_) => exn::bail!(ErrorKind::InvalidWeight(s.to_string())),
        }
    }
}
impl Display for Weight {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotShown => f.write_str(NOT_SHOWN),
            Self::Weighted(n) => write!(f, "{n}"),
        }
    }
}
