use chrono::{DateTime, Utc};
use std::fmt;
use std::fmt::{Display, Formatter};

/// A calendar year, usable wherever a period is expected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Year(pub i32);

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// A calendar month as `(year, month)`, month in `1..=12`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Month(pub i32, pub u32);

impl Month {
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

/// Inclusive UTC bounds a period value resolves to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateTimeBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
