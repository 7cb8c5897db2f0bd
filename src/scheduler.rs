use crate::cancel::CancellationToken;
use crate::error::Error;
use chrono::{DateTime, Duration as ChronoDuration, Local, LocalResult, NaiveTime, TimeZone};
use std::time::Duration;
use tracing::{error, info};

/// Longest single wait between clock checks.
const MAX_WAIT_SLICE: Duration = Duration::from_secs(60);

/// Parse a 24-hour `HH:MM` time of day.
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        Error::InvalidConfig(format!(
            "Invalid schedule_time format: {}. Expected HH:MM (24-hour format)",
            value
        ))
    })
}

/// Runs a job once a day at a fixed local time until cancelled.
pub struct DailyScheduler {
    at: NaiveTime,
}

impl DailyScheduler {
    pub fn new(schedule_time: &str) -> Result<Self, Error> {
        let at = parse_schedule_time(schedule_time)?;
        info!("Scheduled daily job at {}", at.format("%H:%M"));
        Ok(Self { at })
    }

    /// First occurrence of the scheduled time strictly after `now`.
    pub fn next_run_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut date = now.date_naive();
        loop {
            let candidate = match tz.from_local_datetime(&date.and_time(self.at)) {
                LocalResult::Single(t) => Some(t),
                LocalResult::Ambiguous(earliest, _) => Some(earliest),
                // The wall-clock time is skipped by a DST jump; run an hour later.
                LocalResult::None => tz
                    .from_local_datetime(&(date.and_time(self.at) + ChronoDuration::hours(1)))
                    .earliest(),
            };
            if let Some(candidate) = candidate {
                if candidate > *now {
                    return candidate;
                }
            }
            date = date.succ_opt().unwrap_or(date);
        }
    }

    /// Wait for each scheduled slot and run `job`. A failing run is logged and
    /// the scheduler moves on to the next day; `Error::Cancelled` or a
    /// cancelled token ends the loop.
    pub fn run<F>(&self, cancel: &CancellationToken, mut job: F) -> Result<(), Error>
    where
        F: FnMut() -> Result<(), Error>,
    {
        info!("Scheduler started. Waiting for scheduled time...");
        while !cancel.is_cancelled() {
            let next = self.next_run_after(&Local::now());
            info!("Next run at {}", next.format("%Y-%m-%d %H:%M"));

            if !wait_until(cancel, next) {
                break;
            }

            info!("Starting scheduled job execution");
            match job() {
                Ok(()) => info!("Scheduled job completed successfully"),
                Err(Error::Cancelled) => break,
                Err(err) => error!("Scheduled job failed: {}", err),
            }
        }
        info!("Scheduler stopped");
        Ok(())
    }
}

/// Sleep until `deadline`, returning false if cancelled first.
fn wait_until(cancel: &CancellationToken, deadline: DateTime<Local>) -> bool {
    loop {
        let remaining = match (deadline - Local::now()).to_std() {
            Ok(remaining) if !remaining.is_zero() => remaining,
            _ => return !cancel.is_cancelled(),
        };
        if cancel.wait_timeout(remaining.min(MAX_WAIT_SLICE)) {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_parse_schedule_time() {
        assert_eq!(
            parse_schedule_time("03:15").unwrap(),
            NaiveTime::from_hms_opt(3, 15, 0).unwrap()
        );
        assert!(parse_schedule_time("3pm").is_err());
        assert!(parse_schedule_time("24:00").is_err());
        assert!(parse_schedule_time("").is_err());
    }

    #[test]
    fn test_next_run_later_today() {
        let scheduler = DailyScheduler::new("02:00").unwrap();
        let next = scheduler.next_run_after(&utc(2026, 10, 15, 1, 30));
        assert_eq!(next, utc(2026, 10, 15, 2, 0));
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let scheduler = DailyScheduler::new("02:00").unwrap();
        assert_eq!(
            scheduler.next_run_after(&utc(2026, 10, 15, 2, 0)),
            utc(2026, 10, 16, 2, 0)
        );
        assert_eq!(
            scheduler.next_run_after(&utc(2026, 12, 31, 23, 59)),
            utc(2027, 1, 1, 2, 0)
        );
    }

    #[test]
    fn test_cancelled_scheduler_never_runs_job() {
        let scheduler = DailyScheduler::new("02:00").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut runs = 0;
        scheduler
            .run(&cancel, || {
                runs += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(runs, 0);
    }
}
