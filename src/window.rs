//! inclusive time windows and the date formats accepted on the command line
use {
    crate::error::{ExportError, Result},
    chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc},
};

/// Where a timestamp falls relative to a [`TimeWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// older than the window start
    Before,
    /// inside the window (both ends inclusive)
    Within,
    /// newer than the window end
    After,
}

/// An inclusive `[start, end]` range of UTC timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// the first second in the window
    start: DateTime<Utc>,
    /// the last second in the window
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// make a new window, rejecting `start > end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(ExportError::InvalidWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        Ok(Self { start, end })
    }

    /// parse a window from two user supplied dates
    ///
    /// a bare `YYYY-MM-DD` end date covers that whole day
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_bound(start, Bound::Start)?, parse_bound(end, Bound::End)?)
    }

    /// the window start
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// the window end
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// place a timestamp relative to the window
    pub fn place(&self, at: DateTime<Utc>) -> Placement {
        if at < self.start {
            Placement::Before
        } else if at > self.end {
            Placement::After
        } else {
            Placement::Within
        }
    }

    /// whether a timestamp is inside the window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.place(at) == Placement::Within
    }
}

/// Which end of a window a date is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// dates mean midnight
    Start,
    /// dates mean the last second of the day
    End,
}

/// parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` (UTC) or RFC 3339
pub fn parse_bound(input: &str, bound: Bound) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ExportError::InvalidDate(input.to_string()))?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
    };

    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_end_date_covers_whole_day() {
        let window = TimeWindow::parse("2024-11-01", "2024-11-30").unwrap();

        assert_eq!(window.start(), utc(2024, 11, 1, 0, 0, 0));
        assert_eq!(window.end(), utc(2024, 11, 30, 23, 59, 59));
        assert!(window.contains(utc(2024, 11, 30, 18, 0, 0)));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let window = TimeWindow::new(utc(2024, 11, 1, 0, 0, 0), utc(2024, 11, 2, 0, 0, 0)).unwrap();

        assert_eq!(window.place(utc(2024, 11, 1, 0, 0, 0)), Placement::Within);
        assert_eq!(window.place(utc(2024, 11, 2, 0, 0, 0)), Placement::Within);
        assert_eq!(window.place(utc(2024, 10, 31, 23, 59, 59)), Placement::Before);
        assert_eq!(window.place(utc(2024, 11, 2, 0, 0, 1)), Placement::After);
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let err = TimeWindow::parse("2024-12-01", "2024-11-01").unwrap_err();
        assert!(matches!(err, ExportError::InvalidWindow { .. }));
    }

    #[test]
    fn test_single_day_window() {
        let window = TimeWindow::parse("2024-11-15", "2024-11-15").unwrap();
        assert!(window.contains(utc(2024, 11, 15, 12, 30, 0)));
    }

    #[test]
    fn test_other_formats() {
        assert_eq!(
            parse_bound("2024-11-05 08:30:00", Bound::End).unwrap(),
            utc(2024, 11, 5, 8, 30, 0)
        );
        assert_eq!(
            parse_bound("2024-11-05T08:30:00+02:00", Bound::Start).unwrap(),
            utc(2024, 11, 5, 6, 30, 0)
        );
        assert!(matches!(
            parse_bound("05/11/2024", Bound::Start),
            Err(ExportError::InvalidDate(_))
        ));
    }
}
