use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Camera event model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub camera: String,
    pub label: String,
    #[serde(with = "unix_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "unix_seconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub top_score: Option<f64>,
    #[serde(default)]
    pub has_clip: bool,
    #[serde(default)]
    pub has_snapshot: bool,
    #[serde(default)]
    pub zones: Vec<String>,
}

impl Event {
    /// End of the event, or its start for point events.
    pub fn end_or_start(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(self.start_time)
    }
}

/// Fractional unix seconds, as the media server emits them.
pub(crate) mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.timestamp_millis() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        from_seconds(seconds).ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", seconds)))
    }

    pub fn from_seconds(seconds: f64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
    }
}

pub(crate) mod unix_seconds_option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => super::unix_seconds::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            Some(seconds) => super::unix_seconds::from_seconds(seconds)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", seconds))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_timestamps_and_open_events() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "id": "1686000000.5-abc",
            "camera": "front_door",
            "label": "person",
            "start_time": 1686000000.5,
            "end_time": null,
            "top_score": 0.82,
            "has_clip": true,
        }))
        .unwrap();

        assert_eq!(event.start_time.timestamp_millis(), 1_686_000_000_500);
        assert_eq!(event.end_time, None);
        assert_eq!(event.end_or_start(), event.start_time);
        assert!(!event.has_snapshot);
    }

    #[test]
    fn range_event_reports_its_end() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "camera": "yard",
            "label": "car",
            "start_time": 100,
            "end_time": 400,
        }))
        .unwrap();

        assert!(event.end_time.is_some());
        assert_eq!(event.end_or_start().timestamp(), 400);
    }
}
