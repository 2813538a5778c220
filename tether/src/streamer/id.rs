//! Stream identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one registered stdout/stderr channel pair.
///
/// Only meaningful while the stream is registered: identifiers are handed
/// out again once a stopped stream has been cleaned up, so numeric order
/// carries no information.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StreamId(u32);

impl StreamId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for StreamId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<StreamId> for u32 {
    fn from(id: StreamId) -> Self {
        id.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StreamId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_only() {
        assert_eq!("42".parse::<StreamId>().unwrap(), StreamId::new(42));
        assert!("".parse::<StreamId>().is_err());
        assert!("-1".parse::<StreamId>().is_err());
        assert!("0x10".parse::<StreamId>().is_err());
        assert!("4294967296".parse::<StreamId>().is_err());
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&StreamId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: StreamId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StreamId::new(7));
    }
}
