//! Processed-date calendar.
//!
//! Groups stored dates by calendar month for the most recent months so an
//! operator can see which trade dates already have reconciled output.

use std::fmt;

use chrono::{Datelike, NaiveDate};

/// Processed days of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthActivity {
    pub year: i32,
    /// Month number, 1-12.
    pub month: u32,
    /// Processed days of the month, ascending.
    pub days: Vec<u32>,
}

impl MonthActivity {
    /// First day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for MonthActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_day() {
            Some(first) => write!(f, "{}:", first.format("%B %Y"))?,
            None => write!(f, "{}-{:02}:", self.year, self.month)?,
        }
        if self.days.is_empty() {
            return write!(f, " -");
        }
        for day in &self.days {
            write!(f, " {day}")?;
        }
        Ok(())
    }
}

/// The last `months` calendar months up to and including `today`'s month,
/// oldest first, each with the days found in `processed`.
pub fn recent_months(today: NaiveDate, months: u32, processed: &[NaiveDate]) -> Vec<MonthActivity> {
    (0..months)
        .rev()
        .map(|back| {
            let (year, month) = months_before(today.year(), today.month(), back);
            let mut days: Vec<u32> = processed
                .iter()
                .filter(|d| d.year() == year && d.month() == month)
                .map(|d| d.day())
                .collect();
            days.sort_unstable();
            days.dedup();
            MonthActivity { year, month, days }
        })
        .collect()
}

fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_recent_months_across_year_end() {
        let processed = vec![
            date(2025, 1, 14),
            date(2024, 12, 2),
            date(2024, 12, 31),
            date(2024, 10, 1),
            date(2025, 1, 3),
            date(2025, 1, 14),
        ];
        let months = recent_months(date(2025, 1, 20), 3, &processed);

        assert_eq!(
            months,
            vec![
                MonthActivity { year: 2024, month: 11, days: vec![] },
                MonthActivity { year: 2024, month: 12, days: vec![2, 31] },
                MonthActivity { year: 2025, month: 1, days: vec![3, 14] },
            ]
        );
    }

    #[test]
    fn test_zero_months_is_empty() {
        assert!(recent_months(date(2025, 1, 20), 0, &[]).is_empty());
    }

    #[test]
    fn test_display() {
        let month = MonthActivity { year: 2025, month: 3, days: vec![3, 14] };
        assert_eq!(month.to_string(), "March 2025: 3 14");
        let empty = MonthActivity { year: 2025, month: 2, days: vec![] };
        assert_eq!(empty.to_string(), "February 2025: -");
    }

    #[test]
    fn test_months_before() {
        assert_eq!(months_before(2025, 3, 0), (2025, 3));
        assert_eq!(months_before(2025, 3, 2), (2025, 1));
        assert_eq!(months_before(2025, 3, 3), (2024, 12));
        assert_eq!(months_before(2025, 1, 13), (2023, 12));
    }
}
