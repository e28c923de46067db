//! Start instants for runs on consecutive days.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone};

use crate::{GenerationError, OptionExt, Result};

/// `times` runs at `hour:minute`, one per day, going backwards from
/// `start_date` in the given UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSchedule {
    pub start_date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
    pub times: u32,
    pub offset: FixedOffset,
}

impl RunSchedule {
    pub fn validate(&self) -> Result<()> {
        if self.hour >= 24 {
            return Err(GenerationError::config(format!(
                "hour must be 0-23, got {}",
                self.hour
            )));
        }
        if self.minute >= 60 {
            return Err(GenerationError::config(format!(
                "minute must be 0-59, got {}",
                self.minute
            )));
        }
        if self.times == 0 {
            return Err(GenerationError::config("times must be at least 1"));
        }
        Ok(())
    }

    /// Start instants, newest first.
    pub fn start_instants(&self) -> Result<Vec<DateTime<FixedOffset>>> {
        self.validate()?;

        (0..self.times)
            .map(|day| {
                let date = self
                    .start_date
                    .checked_sub_days(Days::new(u64::from(day)))
                    .ok_or_config("schedule runs past the earliest representable date")?;
                let local = date
                    .and_hms_opt(self.hour, self.minute, 0)
                    .ok_or_config("invalid time of day")?;
                self.offset
                    .from_local_datetime(&local)
                    .single()
                    .ok_or_config("ambiguous local start time")
            })
            .collect()
    }

    /// Start instants as epoch milliseconds, newest first.
    pub fn start_times_ms(&self) -> Result<Vec<i64>> {
        Ok(self
            .start_instants()?
            .iter()
            .map(DateTime::timestamp_millis)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(times: u32) -> RunSchedule {
        RunSchedule {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            hour: 8,
            minute: 30,
            times,
            offset: FixedOffset::east_opt(8 * 3600).unwrap(),
        }
    }

    #[test]
    fn test_counts_backwards_across_month() {
        let instants = schedule(3).start_instants().unwrap();
        let dates: Vec<String> = instants
            .iter()
            .map(|t| t.date_naive().to_string())
            .collect();
        assert_eq!(dates, vec!["2024-03-02", "2024-03-01", "2024-02-29"]);
    }

    #[test]
    fn test_offset_applied() {
        let ms = schedule(1).start_times_ms().unwrap();
        // 2024-03-02 08:30 +08:00 = 2024-03-02 00:30 UTC
        assert_eq!(ms, vec![1_709_339_400_000]);
    }

    #[test]
    fn test_consecutive_runs_one_day_apart() {
        let ms = schedule(4).start_times_ms().unwrap();
        assert!(ms.windows(2).all(|w| w[0] - w[1] == 86_400_000));
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let mut bad = schedule(1);
        bad.hour = 24;
        assert!(bad.start_instants().is_err());

        let mut bad = schedule(1);
        bad.minute = 60;
        assert!(bad.start_instants().is_err());

        assert!(schedule(0).start_instants().is_err());
    }
}
