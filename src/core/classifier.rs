//! Release-date classification of catalog entries.
//!
//! Every monitored, not-yet-downloaded entry with a usable release date is
//! placed in exactly one bucket:
//! - future: local release date in `(today, cutoff]`
//! - released: local release date `<= today` (unless `future_only`)
//!
//! Everything else is dropped.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::{CatalogEntry, ClassifiedMovie, ReleaseType};

/// Knobs for a classification pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifyOptions {
    /// How many days ahead counts as "upcoming"
    pub horizon_days: f64,

    /// Hours added to UTC to get local time (fractional allowed)
    pub utc_offset_hours: f64,

    /// Drop already-released movies instead of bucketing them
    pub future_only: bool,

    /// Consider theatrical dates too (earliest date wins)
    pub include_in_cinemas: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            horizon_days: 30.0,
            utc_offset_hours: 0.0,
            future_only: false,
            include_in_cinemas: false,
        }
    }
}

/// `at` shifted by `hours`, as a calendar date.
///
/// Shifts past chrono's range saturate to the first/last representable date.
fn shifted_date(at: DateTime<Utc>, hours: f64) -> NaiveDate {
    let secs = (hours * 3600.0).round();
    let shifted = if secs.is_finite() {
        Duration::try_seconds(secs as i64).and_then(|delta| at.checked_add_signed(delta))
    } else {
        None
    };

    match shifted {
        Some(at) => at.date_naive(),
        None if hours < 0.0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

/// Result of a classification pass
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Releasing within the horizon
    pub future: Vec<ClassifiedMovie>,

    /// Released but not downloaded
    pub released: Vec<ClassifiedMovie>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.future.is_empty() && self.released.is_empty()
    }

    pub fn len(&self) -> usize {
        self.future.len() + self.released.len()
    }

    /// Future movies followed by released movies
    pub fn all(&self) -> impl Iterator<Item = &ClassifiedMovie> {
        self.future.iter().chain(self.released.iter())
    }
}

/// Pick the release timestamp used for classification.
///
/// With cinema dates included the earliest of digital/physical/cinema wins,
/// ties going to the earlier field in that order. Without them digital always
/// wins over physical when present, regardless of which is earlier.
pub fn resolve_release(
    entry: &CatalogEntry,
    include_in_cinemas: bool,
) -> Option<(DateTime<Utc>, ReleaseType)> {
    if include_in_cinemas {
        let candidates = [
            (entry.digital_release, ReleaseType::Digital),
            (entry.physical_release, ReleaseType::Physical),
            (entry.in_cinemas, ReleaseType::Cinema),
        ];

        // min_by_key returns the first minimum, which keeps field order on ties
        candidates
            .into_iter()
            .filter_map(|(at, kind)| at.map(|at| (at, kind)))
            .min_by_key(|(at, _)| *at)
    } else if let Some(at) = entry.digital_release {
        Some((at, ReleaseType::Digital))
    } else {
        entry.physical_release.map(|at| (at, ReleaseType::Physical))
    }
}

/// Convert a UTC timestamp to the local calendar date
pub fn local_date(at: DateTime<Utc>, utc_offset_hours: f64) -> NaiveDate {
    shifted_date(at, utc_offset_hours)
}

/// Split catalog entries into future and released buckets
pub fn classify(
    entries: &[CatalogEntry],
    options: &ClassifyOptions,
    now: DateTime<Utc>,
) -> Classification {
    let today = local_date(now, options.utc_offset_hours);
    let cutoff = shifted_date(now, options.horizon_days * 24.0);

    debug!(
        %today,
        %cutoff,
        future_only = options.future_only,
        include_in_cinemas = options.include_in_cinemas,
        "Classifying catalog"
    );

    let mut result = Classification::default();

    for entry in entries {
        if !entry.is_monitored() {
            debug!(title = %entry.title, "Skipping unmonitored movie");
            continue;
        }

        if entry.has_file != Some(false) {
            debug!(title = %entry.title, "Skipping downloaded movie");
            continue;
        }

        let Some((at, release_type)) = resolve_release(entry, options.include_in_cinemas) else {
            debug!(title = %entry.title, "No suitable release date");
            continue;
        };

        let release_date = local_date(at, options.utc_offset_hours);
        let movie = ClassifiedMovie::from_entry(entry, release_date, release_type);

        if release_date > today && release_date <= cutoff {
            debug!(title = %entry.title, %release_date, %release_type, "Upcoming");
            result.future.push(movie);
        } else if release_date <= today && !options.future_only {
            debug!(
                title = %entry.title,
                %release_date,
                %release_type,
                "Released, not yet available"
            );
            result.released.push(movie);
        } else {
            debug!(title = %entry.title, %release_date, "Outside the classification window");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn wanted(title: &str) -> CatalogEntry {
        CatalogEntry::new(title).with_flags(true, false)
    }

    #[test]
    fn test_digital_wins_without_cinema_dates() {
        let entry = wanted("A")
            .with_digital_release(at(2025, 6, 1, 0))
            .with_physical_release(at(2025, 5, 1, 0));

        let (when, kind) = resolve_release(&entry, false).unwrap();
        assert_eq!(kind, ReleaseType::Digital);
        assert_eq!(when, at(2025, 6, 1, 0));
    }

    #[test]
    fn test_physical_used_when_no_digital() {
        let entry = wanted("A")
            .with_physical_release(at(2025, 5, 1, 0))
            .with_in_cinemas(at(2025, 1, 1, 0));

        let (_, kind) = resolve_release(&entry, false).unwrap();
        assert_eq!(kind, ReleaseType::Physical);
    }

    #[test]
    fn test_cinema_only_ignored_without_flag() {
        let entry = wanted("A").with_in_cinemas(at(2025, 1, 1, 0));
        assert!(resolve_release(&entry, false).is_none());
        assert_eq!(
            resolve_release(&entry, true).map(|(_, k)| k),
            Some(ReleaseType::Cinema)
        );
    }

    #[test]
    fn test_earliest_wins_with_cinema_dates() {
        let entry = wanted("A")
            .with_digital_release(at(2025, 6, 1, 0))
            .with_physical_release(at(2025, 5, 1, 0))
            .with_in_cinemas(at(2025, 3, 1, 0));

        let (when, kind) = resolve_release(&entry, true).unwrap();
        assert_eq!(kind, ReleaseType::Cinema);
        assert_eq!(when, at(2025, 3, 1, 0));
    }

    #[test]
    fn test_exact_tie_keeps_field_order() {
        let same = at(2025, 5, 1, 0);
        let entry = wanted("A")
            .with_physical_release(same)
            .with_in_cinemas(same)
            .with_digital_release(same);

        assert_eq!(
            resolve_release(&entry, true).map(|(_, k)| k),
            Some(ReleaseType::Digital)
        );

        let entry = wanted("B").with_physical_release(same).with_in_cinemas(same);
        assert_eq!(
            resolve_release(&entry, true).map(|(_, k)| k),
            Some(ReleaseType::Physical)
        );
    }

    #[test]
    fn test_local_date_applies_offset() {
        // 22:00 UTC + 3h = next day
        assert_eq!(local_date(at(2025, 5, 1, 22), 3.0), date(2025, 5, 2));
        // 02:00 UTC - 5h = previous day
        assert_eq!(local_date(at(2025, 5, 1, 2), -5.0), date(2025, 4, 30));
        // half-hour offsets
        assert_eq!(local_date(at(2025, 5, 1, 23), 0.5), date(2025, 5, 1));
        assert_eq!(local_date(at(2025, 5, 1, 23), 1.5), date(2025, 5, 2));
    }

    #[test]
    fn test_filters_unmonitored_and_downloaded() {
        let now = at(2025, 5, 1, 12);
        let entries = vec![
            CatalogEntry::new("Unmonitored")
                .with_flags(false, false)
                .with_digital_release(at(2025, 5, 10, 0)),
            CatalogEntry::new("Downloaded")
                .with_flags(true, true)
                .with_digital_release(at(2025, 5, 10, 0)),
            wanted("Kept").with_digital_release(at(2025, 5, 10, 0)),
        ];

        let result = classify(&entries, &ClassifyOptions::default(), now);
        assert_eq!(result.future.len(), 1);
        assert_eq!(result.future[0].title, "Kept");
        assert!(result.released.is_empty());
    }

    #[test]
    fn test_absent_flags_are_excluded() {
        let now = at(2025, 5, 1, 12);
        let mut no_monitor =
            CatalogEntry::new("NoMonitor").with_digital_release(at(2025, 5, 10, 0));
        no_monitor.has_file = Some(false);
        let mut no_has_file =
            CatalogEntry::new("NoHasFile").with_digital_release(at(2025, 5, 10, 0));
        no_has_file.monitored = Some(true);

        let result = classify(&[no_monitor, no_has_file], &ClassifyOptions::default(), now);
        assert!(result.is_empty());
    }

    #[test]
    fn test_release_today_is_released_not_future() {
        let now = at(2025, 5, 1, 12);
        let entries = vec![wanted("Today").with_digital_release(at(2025, 5, 1, 0))];

        let result = classify(&entries, &ClassifyOptions::default(), now);
        assert!(result.future.is_empty());
        assert_eq!(result.released.len(), 1);
        assert_eq!(result.released[0].release_date, date(2025, 5, 1));
    }

    #[test]
    fn test_horizon_upper_bound_is_inclusive() {
        let now = at(2025, 5, 1, 12);
        let options = ClassifyOptions {
            horizon_days: 10.0,
            ..Default::default()
        };
        let entries = vec![
            wanted("Edge").with_digital_release(at(2025, 5, 11, 0)),
            wanted("Beyond").with_digital_release(at(2025, 5, 12, 0)),
        ];

        let result = classify(&entries, &options, now);
        let titles: Vec<_> = result.future.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Edge"]);
        assert!(result.released.is_empty());
    }

    #[test]
    fn test_future_only_drops_released() {
        let now = at(2025, 5, 1, 12);
        let options = ClassifyOptions {
            future_only: true,
            ..Default::default()
        };
        let entries = vec![
            wanted("Past").with_digital_release(at(2025, 4, 1, 0)),
            wanted("Soon").with_digital_release(at(2025, 5, 3, 0)),
        ];

        let result = classify(&entries, &options, now);
        assert_eq!(result.future.len(), 1);
        assert!(result.released.is_empty());
    }

    #[test]
    fn test_offset_moves_today() {
        // 23:00 UTC on the 1st is already the 2nd at UTC+2
        let now = at(2025, 5, 1, 23);
        let options = ClassifyOptions {
            utc_offset_hours: 2.0,
            ..Default::default()
        };
        let entries = vec![wanted("Tomorrow UTC").with_digital_release(at(2025, 5, 2, 0))];

        let result = classify(&entries, &options, now);
        assert_eq!(result.released.len(), 1);
        assert_eq!(result.released[0].release_date, date(2025, 5, 2));
    }

    #[test]
    fn test_every_classified_movie_lands_in_one_bucket() {
        let now = at(2025, 5, 15, 12);
        let entries: Vec<_> = (1..=28)
            .map(|day| wanted(&format!("Movie {day}")).with_digital_release(at(2025, 5, day, 6)))
            .collect();

        let result = classify(&entries, &ClassifyOptions::default(), now);
        assert_eq!(result.len(), entries.len());
        for movie in &result.future {
            assert!(!result.released.iter().any(|m| m.title == movie.title));
        }
    }

    #[test]
    fn test_no_date_is_dropped() {
        let now = at(2025, 5, 1, 12);
        let result = classify(&[wanted("Undated")], &ClassifyOptions::default(), now);
        assert!(result.is_empty());
    }

    #[test]
    fn test_out_of_range_shifts_saturate() {
        let now = at(2025, 5, 1, 12);
        let entries = vec![
            wanted("Soon").with_digital_release(at(2025, 6, 1, 0)),
            wanted("Past").with_digital_release(at(2025, 4, 1, 0)),
        ];

        let huge_horizon = ClassifyOptions {
            horizon_days: 100_000_000.0,
            ..Default::default()
        };
        let result = classify(&entries, &huge_horizon, now);
        assert_eq!(result.future.len(), 1);
        assert_eq!(result.released.len(), 1);

        let infinite_horizon = ClassifyOptions {
            horizon_days: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(classify(&entries, &infinite_horizon, now).future.len(), 1);

        let huge_offset = ClassifyOptions {
            utc_offset_hours: 1e15,
            ..Default::default()
        };
        // "today" saturates to the last representable date, so everything has released
        let result = classify(&entries, &huge_offset, now);
        assert_eq!(result.released.len(), 2);

        assert_eq!(local_date(now, -1e15), NaiveDate::MIN);
        assert_eq!(local_date(now, f64::NAN), NaiveDate::MAX);
    }
}
