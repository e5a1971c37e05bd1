//! Rollback selectors.
//!
//! A selector picks one recorded run: the latest one, the Nth most recent,
//! or the one recorded at a given date (optionally narrowed by time of day).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use super::history::GenerationRun;
use crate::diagnostic::GenError;

const MOST_RECENT_LITERALS: [&str; 4] = ["most recent", "most-recent", "last", "latest"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted date-time layouts, with whether they carry seconds.
const DATE_TIME_FORMATS: [(&str, bool); 5] = [
    ("%Y-%m-%d %H:%M:%S", true),
    ("%Y-%m-%dT%H:%M:%S", true),
    ("%Y-%m-%d_%H%M%S", true),
    ("%Y-%m-%d %H:%M", false),
    ("%Y-%m-%dT%H:%M", false),
];

/// Which past run a rollback regenerates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackSelector {
    /// The latest run.
    MostRecent,
    /// The Nth most recent run; `1` is the latest.
    Steps(usize),
    /// The latest run recorded on a day.
    Date(NaiveDate),
    /// The latest run recorded at a time of day, to the minute or second.
    At { at: NaiveDateTime, with_seconds: bool },
}

impl RollbackSelector {
    /// Picks the matching run from `runs`, which must be ordered most recent first.
    pub fn select<'r>(&self, runs: &'r [GenerationRun]) -> Option<&'r GenerationRun> {
        match self {
            RollbackSelector::MostRecent => runs.first(),
            RollbackSelector::Steps(n) => n.checked_sub(1).and_then(|i| runs.get(i)),
            RollbackSelector::Date(date) => runs.iter().find(|r| r.created_at.date() == *date),
            RollbackSelector::At { at, with_seconds } => runs.iter().find(|r| {
                let created = if *with_seconds {
                    r.created_at
                } else {
                    r.created_at.with_second(0).unwrap_or(r.created_at)
                };
                created == *at
            }),
        }
    }
}

impl FromStr for RollbackSelector {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || GenError::InvalidRollbackSelector {
            selector: s.to_string(),
        };

        if MOST_RECENT_LITERALS.contains(&trimmed.to_lowercase().as_str()) {
            return Ok(RollbackSelector::MostRecent);
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) && !trimmed.is_empty() {
            return match trimmed.parse::<usize>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(n) => Ok(RollbackSelector::Steps(n)),
            };
        }

        for (format, with_seconds) in DATE_TIME_FORMATS {
            if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(RollbackSelector::At { at, with_seconds });
            }
        }

        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(RollbackSelector::Date)
            .map_err(|_| invalid())
    }
}

impl fmt::Display for RollbackSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackSelector::MostRecent => f.write_str("most recent"),
            RollbackSelector::Steps(n) => write!(f, "{}", n),
            RollbackSelector::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            RollbackSelector::At { at, with_seconds: true } => {
                write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S"))
            }
            RollbackSelector::At { at, with_seconds: false } => {
                write!(f, "{}", at.format("%Y-%m-%d %H:%M"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn run(stamp: &str) -> GenerationRun {
        GenerationRun {
            id: stamp.to_string(),
            created_at: NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d_%H%M%S").unwrap(),
            sequence: 0,
            dir: PathBuf::from(stamp),
        }
    }

    fn runs() -> Vec<GenerationRun> {
        vec![
            run("2024-05-02_090000"),
            run("2024-05-01_184512"),
            run("2024-05-01_120000"),
        ]
    }

    #[test]
    fn test_parse_literals_and_steps() {
        assert_eq!("most recent".parse::<RollbackSelector>().unwrap(), RollbackSelector::MostRecent);
        assert_eq!(" Last ".parse::<RollbackSelector>().unwrap(), RollbackSelector::MostRecent);
        assert_eq!("3".parse::<RollbackSelector>().unwrap(), RollbackSelector::Steps(3));
        assert!(matches!(
            "0".parse::<RollbackSelector>(),
            Err(GenError::InvalidRollbackSelector { .. })
        ));
        assert!("yesterday".parse::<RollbackSelector>().is_err());
    }

    #[test]
    fn test_parse_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            "2024-05-01".parse::<RollbackSelector>().unwrap(),
            RollbackSelector::Date(date)
        );
        assert_eq!(
            "2024-05-01 18:45".parse::<RollbackSelector>().unwrap(),
            RollbackSelector::At {
                at: date.and_hms_opt(18, 45, 0).unwrap(),
                with_seconds: false,
            }
        );
    }

    #[test]
    fn test_select() {
        let runs = runs();

        assert_eq!(RollbackSelector::MostRecent.select(&runs).unwrap().id, "2024-05-02_090000");
        assert_eq!(RollbackSelector::Steps(2).select(&runs).unwrap().id, "2024-05-01_184512");
        assert!(RollbackSelector::Steps(4).select(&runs).is_none());

        let by_date: RollbackSelector = "2024-05-01".parse().unwrap();
        assert_eq!(by_date.select(&runs).unwrap().id, "2024-05-01_184512");

        let by_minute: RollbackSelector = "2024-05-01 18:45".parse().unwrap();
        assert_eq!(by_minute.select(&runs).unwrap().id, "2024-05-01_184512");

        let by_second: RollbackSelector = "2024-05-01 12:00:00".parse().unwrap();
        assert_eq!(by_second.select(&runs).unwrap().id, "2024-05-01_120000");

        let missing: RollbackSelector = "2023-01-01".parse().unwrap();
        assert!(missing.select(&runs).is_none());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for text in ["most recent", "2", "2024-05-01", "2024-05-01 18:45"] {
            let selector: RollbackSelector = text.parse().unwrap();
            assert_eq!(selector.to_string(), text);
        }
    }
}
