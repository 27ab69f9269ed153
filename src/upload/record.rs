use crate::error::UploadError;
use crate::upload::timestamp::{self, DisplayZone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEvent {
    pub filename: String,
    pub stored_path: String,
    pub timestamp: String,
    pub uploader: Option<String>,
}

impl UploadEvent {
    pub fn new(
        filename: impl Into<String>,
        stored_path: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            stored_path: stored_path.into(),
            timestamp: timestamp.into(),
            uploader: None,
        }
    }

    pub fn with_uploader(mut self, uploader: Option<String>) -> Self {
        self.uploader = uploader.filter(|u| !u.trim().is_empty());
        self
    }
}

/// One accepted upload. Never mutated after it enters the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub filename: String,
    pub path: String,
    pub timestamp: String,
    #[serde(alias = "formatted_date")]
    pub formatted_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
}

impl UploadRecord {
    /// Validate `event` and derive its record. `batch` carries the shared
    /// batch timestamp, already normalized.
    pub fn from_event(
        event: &UploadEvent,
        zone: &DisplayZone,
        batch: Option<&str>,
        upload_time: &str,
    ) -> Result<Self, UploadError> {
        if event.filename.trim().is_empty() {
            return Err(UploadError::InvalidEvent("filename cannot be empty".into()));
        }
        if event.stored_path.trim().is_empty() {
            return Err(UploadError::InvalidEvent(format!(
                "path for `{}` cannot be empty",
                event.filename
            )));
        }
        let ts = timestamp::normalize(&event.timestamp)?;

        Ok(Self {
            filename: event.filename.trim().to_string(),
            path: event.stored_path.trim().to_string(),
            formatted_date: zone.format(&ts.parsed),
            timestamp: ts.text,
            batch_timestamp: batch.map(str::to_string),
            upload_time: Some(upload_time.to_string()),
            uploader: event.uploader.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> DisplayZone {
        DisplayZone::parse("UTC").expect("utc")
    }

    #[test]
    fn record_derives_formatted_date_from_timestamp() {
        let event = UploadEvent::new("report.pdf", "src/upload/assets/report.pdf", "2024-03-01T12:00:00Z");
        let record = UploadRecord::from_event(&event, &utc(), None, "2024-03-01 12:00:05")
            .expect("record");
        assert_eq!(record.timestamp, "2024-03-01T12:00:00+00:00");
        assert_eq!(record.formatted_date, "2024-03-01 12:00:00");
        assert_eq!(record.upload_time.as_deref(), Some("2024-03-01 12:00:05"));
        assert!(record.batch_timestamp.is_none());
    }

    #[test]
    fn empty_fields_are_rejected() {
        let event = UploadEvent::new(" ", "a/b.txt", "2024-03-01");
        let err = UploadRecord::from_event(&event, &utc(), None, "now").expect_err("filename");
        assert!(matches!(err, UploadError::InvalidEvent(_)));

        let event = UploadEvent::new("b.txt", "", "2024-03-01");
        let err = UploadRecord::from_event(&event, &utc(), None, "now").expect_err("path");
        assert!(matches!(err, UploadError::InvalidEvent(_)));
    }

    #[test]
    fn serialized_shape_uses_camel_case_and_omits_absent_fields() {
        let event = UploadEvent::new("a.txt", "src/upload/assets/a.txt", "2024-03-01T00:00:00Z")
            .with_uploader(Some("octocat".into()));
        let record = UploadRecord::from_event(&event, &utc(), Some("2024-03-01T00:00:00+00:00"), "t")
            .expect("record");
        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["formattedDate"], "2024-03-01 00:00:00");
        assert_eq!(value["batchTimestamp"], "2024-03-01T00:00:00+00:00");
        assert_eq!(value["uploader"], "octocat");

        let bare = UploadRecord {
            batch_timestamp: None,
            upload_time: None,
            uploader: None,
            ..record
        };
        let value = serde_json::to_value(&bare).expect("json");
        let keys: Vec<&str> = value
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["filename", "path", "timestamp", "formattedDate"]);
    }

    #[test]
    fn legacy_snake_case_date_is_read() {
        let raw = r#"{"filename":"a","path":"p/a","timestamp":"2024-01-01T00:00:00","formatted_date":"2024-01-01 00:00:00"}"#;
        let record: UploadRecord = serde_json::from_str(raw).expect("parse");
        assert_eq!(record.formatted_date, "2024-01-01 00:00:00");
    }
}
