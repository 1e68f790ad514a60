use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Counts the days in `[start, end]` (both inclusive) that fall on Monday to Friday.
/// Returns 0 when `end < start`.
pub fn count_business_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }

    let total = (end - start).num_days() + 1;
    let full_weeks = total / 7;
    let mut count = full_weeks * 5;

    // Walk the leftover days (fewer than seven) one by one.
    let mut day = start + Days::new((full_weeks * 7) as u64);
    while day <= end {
        if !is_weekend(day) {
            count += 1;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    count
}

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn first_day_of_year(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// A half-open span of days, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Number of calendar days covered.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    /// Weekdays in the range, excluding `end` itself.
    pub fn business_days(&self) -> i64 {
        match self.end.pred_opt() {
            Some(last) => count_business_days(self.start, last),
            None => 0,
        }
    }

    /// True when `other` collides with this range. A candidate collides with an existing
    /// booking when it starts inside it, ends inside it, or swallows it whole; together these
    /// mean the two half-open ranges intersect.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        let starts_inside = self.start >= other.start && self.start < other.end;
        let ends_inside = self.end > other.start && self.end <= other.end;
        let contains = self.start < other.start && self.end > other.end;

        starts_inside || ends_inside || contains
    }

    /// Every calendar year the range touches, in order.
    pub fn years(&self) -> Vec<i32> {
        if self.is_empty() {
            return vec![self.start.year()];
        }
        let last = self.end.pred_opt().unwrap_or(self.end);
        (self.start.year()..=last.year()).collect()
    }

    /// The part of the range that falls inside `year`, if any.
    pub fn clip_to_year(&self, year: i32) -> Option<DateRange> {
        let year_start = first_day_of_year(year)?;
        let next_year_start = first_day_of_year(year + 1)?;

        let start = self.start.max(year_start);
        let end = self.end.min(next_year_start);

        (start < end).then(|| DateRange::new(start, end))
    }
}
