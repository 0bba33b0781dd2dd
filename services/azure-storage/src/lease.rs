use std::fmt::{Display, Formatter};

use storwire_core::{Error, Result};

/// Duration of a blob lease.
///
/// Either infinite or between 15 and 60 seconds; anything else is rejected
/// before a request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseDuration(i32);

impl LeaseDuration {
    /// A lease that never expires, sent as `-1`.
    pub const INFINITE: LeaseDuration = LeaseDuration(-1);

    /// Build a lease duration from its wire value in seconds.
    pub fn new(seconds: i32) -> Result<Self> {
        match seconds {
            -1 | 15..=60 => Ok(Self(seconds)),
            v => Err(Error::request_invalid(format!(
                "lease duration must be -1 or between 15 and 60 seconds, got {v}"
            ))),
        }
    }

    /// Wire value in seconds.
    pub fn seconds(&self) -> i32 {
        self.0
    }

    /// Whether the lease never expires.
    pub fn is_infinite(&self) -> bool {
        self.0 == -1
    }
}

impl Display for LeaseDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for LeaseDuration {
    type Error = Error;

    fn try_from(seconds: i32) -> Result<Self> {
        Self::new(seconds)
    }
}
