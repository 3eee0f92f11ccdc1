use chrono::{
    DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeZone, Weekday,
};

use super::{Frequency, RecurrenceError, parse_weekday, weekday_code};
use crate::db::entities::recurrence_rule;

const MAX_DAY_OF_MONTH: i64 = 31;

/// A validated recurrence rule.
///
/// Every computation keeps the time of day and UTC offset of the date it
/// starts from, and each step yields a date strictly later than its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrencePattern {
    frequency: Frequency,
    interval: u32,
    days_of_week: Vec<Weekday>,
    day_of_month: Option<u32>,
    end_date: Option<DateTime<FixedOffset>>,
    occurrences: Option<u32>,
}

/// The next instance of a series produced by completing the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Successor {
    pub due_date: DateTime<FixedOffset>,
    /// Remaining count to store on the successor's rule.
    pub occurrences: Option<u32>,
}

impl RecurrencePattern {
    pub fn new<S: AsRef<str>>(
        frequency: Frequency,
        interval: i64,
        days_of_week: &[S],
        day_of_month: Option<i64>,
        end_date: Option<DateTime<FixedOffset>>,
        occurrences: Option<i64>,
    ) -> Result<Self, RecurrenceError> {
        let interval = u32::try_from(interval)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or(RecurrenceError::InvalidInterval(interval))?;

        let mut days = days_of_week
            .iter()
            .map(|day| parse_weekday(day.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        days.sort_by_key(|day| day.num_days_from_monday());
        days.dedup();
        if !days.is_empty() && frequency != Frequency::Weekly {
            return Err(RecurrenceError::DaysOfWeekNotWeekly(frequency.as_str()));
        }

        let day_of_month = match day_of_month {
            None => None,
            Some(_) if !matches!(frequency, Frequency::Monthly | Frequency::Yearly) => {
                return Err(RecurrenceError::DayOfMonthNotMonthly(frequency.as_str()));
            }
            Some(day) if (1..=MAX_DAY_OF_MONTH).contains(&day) => Some(day as u32),
            Some(day) => return Err(RecurrenceError::InvalidDayOfMonth(day)),
        };

        let occurrences = match occurrences {
            None => None,
            Some(count) => Some(
                u32::try_from(count)
                    .ok()
                    .filter(|value| *value >= 1)
                    .ok_or(RecurrenceError::InvalidOccurrences(count))?,
            ),
        };

        Ok(Self {
            frequency,
            interval,
            days_of_week: days,
            day_of_month,
            end_date,
            occurrences,
        })
    }

    pub fn from_rule(rule: &recurrence_rule::Model) -> Result<Self, RecurrenceError> {
        Self::new(
            rule.frequency.parse()?,
            i64::from(rule.interval),
            &rule.day_codes(),
            rule.day_of_month.map(i64::from),
            rule.end_date,
            rule.occurrences.map(i64::from),
        )
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn days_of_week(&self) -> &[Weekday] {
        &self.days_of_week
    }

    /// Comma separated storage form of [`Self::days_of_week`].
    pub fn day_codes(&self) -> String {
        self.days_of_week
            .iter()
            .map(|day| weekday_code(*day))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn day_of_month(&self) -> Option<u32> {
        self.day_of_month
    }

    pub fn end_date(&self) -> Option<DateTime<FixedOffset>> {
        self.end_date
    }

    pub fn occurrences(&self) -> Option<u32> {
        self.occurrences
    }

    /// Pins monthly and yearly series to the day of `due`, so short months
    /// clamp without moving later months (Jan 31, Feb 28, Mar 31).
    pub fn anchored_to(mut self, due: DateTime<FixedOffset>) -> Self {
        if self.day_of_month.is_none()
            && matches!(self.frequency, Frequency::Monthly | Frequency::Yearly)
        {
            self.day_of_month = Some(due.day());
        }
        self
    }

    /// First occurrence strictly after `current`, or `None` once the series
    /// passes its end date. The occurrence cap is not consulted here.
    pub fn next_after(&self, current: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let candidate = self.candidate_after(current)?;
        match self.end_date {
            Some(end) if candidate > end => None,
            _ => Some(candidate),
        }
    }

    /// What completing the instance due at `current` produces, honouring
    /// both the end date and the remaining-occurrence count.
    pub fn successor(&self, current: DateTime<FixedOffset>) -> Option<Successor> {
        let occurrences = match self.occurrences {
            Some(remaining) if remaining <= 1 => return None,
            Some(remaining) => Some(remaining - 1),
            None => None,
        };
        self.next_after(current).map(|due_date| Successor {
            due_date,
            occurrences,
        })
    }

    /// The series starting at `first` (inclusive).
    pub fn occurrences_from(&self, first: DateTime<FixedOffset>) -> Occurrences<'_> {
        Occurrences {
            pattern: self,
            next: Some(first),
            remaining: self.occurrences,
        }
    }

    fn candidate_after(&self, current: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let local = current.naive_local();
        let date = local.date();
        let next_date = match self.frequency {
            Frequency::Daily => date.checked_add_days(Days::new(u64::from(self.interval)))?,
            Frequency::Weekly => self.next_weekly_date(date)?,
            Frequency::Monthly => self.next_monthly_date(date)?,
            Frequency::Yearly => self.next_yearly_date(date)?,
        };
        with_date(current, next_date)
    }

    fn next_weekly_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let weeks = u64::from(self.interval) * 7;
        if self.days_of_week.is_empty() {
            return date.checked_add_days(Days::new(weeks));
        }

        let today = date.weekday().num_days_from_monday();
        if let Some(later) = self
            .days_of_week
            .iter()
            .map(|day| day.num_days_from_monday())
            .find(|offset| *offset > today)
        {
            return date.checked_add_days(Days::new(u64::from(later - today)));
        }

        let week_start = date.checked_sub_days(Days::new(u64::from(today)))?;
        let first = self.days_of_week.first()?.num_days_from_monday();
        week_start.checked_add_days(Days::new(weeks + u64::from(first)))
    }

    fn next_monthly_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let anchor = self.day_of_month.unwrap_or_else(|| date.day());
        let this_month = clamped_date(date.year(), date.month(), anchor)?;
        if this_month > date {
            return Some(this_month);
        }
        let first_of_month = date.with_day(1)?;
        let target = first_of_month.checked_add_months(Months::new(self.interval))?;
        clamped_date(target.year(), target.month(), anchor)
    }

    fn next_yearly_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let anchor = self.day_of_month.unwrap_or_else(|| date.day());
        let this_year = clamped_date(date.year(), date.month(), anchor)?;
        if this_year > date {
            return Some(this_year);
        }
        let year = date.year().checked_add(i32::try_from(self.interval).ok()?)?;
        clamped_date(year, date.month(), anchor)
    }
}

/// Iterator over a series, strictly increasing and bounded by the
/// occurrence cap and end date. Unbounded series need `take`.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    pattern: &'a RecurrencePattern,
    next: Option<DateTime<FixedOffset>>,
    remaining: Option<u32>,
}

impl Iterator for Occurrences<'_> {
    type Item = DateTime<FixedOffset>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        let current = self.next.take()?;
        if let Some(end) = self.pattern.end_date {
            if current > end {
                return None;
            }
        }
        self.next = self.pattern.next_after(current);
        self.remaining = self.remaining.map(|count| count - 1);
        Some(current)
    }
}

fn with_date(current: DateTime<FixedOffset>, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    let local = NaiveDateTime::new(date, current.naive_local().time());
    current.offset().from_local_datetime(&local).single()
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;
    next_first.pred_opt().map(|day| day.day())
}
