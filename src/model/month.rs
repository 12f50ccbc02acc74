use anyhow::{bail, Context};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Selects the calendar month that all time-scoped queries are made for. `id` is the month
/// number, `1` for January through `12` for December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    id: u32,
    year: i32,
}

impl Month {
    pub fn new(id: u32, year: i32) -> crate::Result<Self> {
        if !(1..=12).contains(&id) {
            bail!("Month must be between 1 and 12, got {id}");
        }
        Ok(Self { id, year })
    }

    /// The month containing today's local date.
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            id: date.month(),
            year: date.year(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

impl Default for Month {
    fn default() -> Self {
        Self::current()
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.id)
    }
}

/// Parses `YYYY-MM`.
impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .with_context(|| format!("Expected a month like 2025-10, got '{s}'"))?;
        let year = year
            .parse::<i32>()
            .with_context(|| format!("Invalid year in '{s}'"))?;
        let month = month
            .parse::<u32>()
            .with_context(|| format!("Invalid month in '{s}'"))?;
        Month::new(month, year)
    }
}
