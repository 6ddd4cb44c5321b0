//! Surgery weekday selector.
//!
//! "All days" and individual days are mutually exclusive: switching the
//! shortcut sets every day flag to its new value, and touching a single day
//! while the shortcut is on narrows the selection to that day alone.

use serde::{Deserialize, Serialize};

/// Tag sent in place of the individual days when the shortcut is active.
pub const ALL_DAYS_TAG: &str = "allDays";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::str::FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.tag() == s)
            .ok_or_else(|| format!("Unknown weekday: {s}"))
    }
}

/// Checkbox state of the weekday selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySelection {
    all_days: bool,
    days: [bool; 7],
}

impl DaySelection {
    pub fn all_days(&self) -> bool {
        self.all_days
    }

    pub fn is_checked(&self, day: Weekday) -> bool {
        self.days[day.index()]
    }

    /// Flip the "all days" shortcut; every individual flag follows it.
    pub fn toggle_all_days(&mut self) {
        self.all_days = !self.all_days;
        self.days = [self.all_days; 7];
    }

    /// Flip a single day. While the shortcut is on, this leaves only `day`
    /// selected.
    pub fn toggle_day(&mut self, day: Weekday) {
        if self.all_days {
            self.all_days = false;
            self.days = [false; 7];
            self.days[day.index()] = true;
        } else {
            self.days[day.index()] = !self.days[day.index()];
        }
    }

    /// Tags sent with the lead: `["allDays"]` or the checked days in week order.
    pub fn derived(&self) -> Vec<&'static str> {
        if self.all_days {
            return vec![ALL_DAYS_TAG];
        }
        Weekday::ALL
            .into_iter()
            .filter(|d| self.is_checked(*d))
            .map(|d| d.tag())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.derived().is_empty()
    }
}
