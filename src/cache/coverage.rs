use chrono::{DateTime, Duration, Utc};

/// Range of event data fetched so far and when it was last refreshed.
///
/// `date_start` only moves earlier and `date_end` only moves later until the
/// window is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageWindow {
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub date_fetch: Option<DateTime<Utc>>,
    pub max_age: Option<Duration>,
}

impl CoverageWindow {
    pub fn new(max_age: Option<Duration>) -> Self {
        Self {
            date_start: None,
            date_end: None,
            date_fetch: None,
            max_age,
        }
    }

    /// Whether `[start, end]` can be answered from data already fetched.
    ///
    /// An open `end` asks only for data from `start` onwards.
    pub fn has_coverage(&self, start: DateTime<Utc>, end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let (Some(date_start), Some(date_end), Some(date_fetch)) =
            (self.date_start, self.date_end, self.date_fetch)
        else {
            return false;
        };

        if let Some(max_age) = self.max_age {
            if now - date_fetch > max_age {
                return false;
            }
        }
        if start < date_start {
            return false;
        }
        let Some(end) = end else {
            return true;
        };
        if end < date_end {
            return true;
        }
        let Some(max_age) = self.max_age else {
            return false;
        };
        // Range events ending this far back may have closed since the last fetch
        if end < now - max_age {
            return false;
        }
        end - max_age <= date_end
    }

    /// Grow the window to include `[start, end]`.
    pub fn widen(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.date_start = Some(self.date_start.map_or(start, |current| current.min(start)));
        self.date_end = Some(self.date_end.map_or(end, |current| current.max(end)));
    }

    pub fn mark_fetched(&mut self, now: DateTime<Utc>) {
        self.date_fetch = Some(now);
    }

    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.date_start?, self.date_end?))
    }

    /// Forget everything fetched; the staleness threshold is configuration and survives.
    pub fn clear(&mut self) {
        self.date_start = None;
        self.date_end = None;
        self.date_fetch = None;
    }
}
