use std::fmt;

use serde::{Deserialize, Serialize};

/// A strictly positive money amount, stored as **integer minor units**
/// (paise, cents).
///
/// Built only by [`crate::validators::parse_amount`], so a value of this type
/// is always `>= 1` minor unit and never needs rounding on its way to the
/// ledger.
///
/// # Examples
///
/// ```rust
/// use engine::validators::parse_amount;
///
/// let amount = parse_amount("₹1,250.50").unwrap();
/// assert_eq!(amount.minor(), 125_050);
/// assert_eq!(amount.to_string(), "1250.50");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Number of decimal places the minor unit carries.
    pub const SCALE: u32 = 2;

    /// Wraps a raw minor-unit value; `None` unless it is positive.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Option<Self> {
        if minor > 0 { Some(Self(minor)) } else { None }
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}
