use crate::error::UploadError;
use crate::logging;
use crate::upload::record::{UploadEvent, UploadRecord};
use crate::upload::timestamp::{self, DisplayZone};
use crate::upload::util::{FileLock, LockMode, ensure_parent_dir, write_atomic};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// JSON array of upload records, newest first.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    zone: DisplayZone,
}

fn read_history(path: &Path) -> Result<Vec<UploadRecord>, UploadError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            return Err(UploadError::CorruptStore {
                path: path.to_path_buf(),
                reason: "file is not valid UTF-8".to_string(),
            });
        }
        Err(err) => return Err(UploadError::io("failed to read", path, err)),
    };
    serde_json::from_str(&raw).map_err(|err| UploadError::CorruptStore {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

fn render_history(path: &Path, history: &[UploadRecord]) -> Result<String, UploadError> {
    let data = serde_json::to_string_pretty(history)
        .map_err(|err| UploadError::io("failed to encode", path, err.into()))?;
    Ok(format!("{data}\n"))
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, zone: DisplayZone) -> Self {
        Self {
            path: path.into(),
            zone,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<UploadRecord>, UploadError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let _lock = FileLock::acquire(&self.path, LockMode::Shared)?;
        read_history(&self.path)
    }

    pub fn append_one(&self, event: &UploadEvent) -> Result<UploadRecord, UploadError> {
        let upload_time = self.zone.format_now();
        let record = UploadRecord::from_event(event, &self.zone, None, &upload_time)?;
        self.prepend(std::slice::from_ref(&record))?;
        Ok(record)
    }

    /// Append every event under one shared batch timestamp. Records come back
    /// newest first, i.e. the last input event is at index 0.
    pub fn append_batch(
        &self,
        events: &[UploadEvent],
        batch_timestamp: &str,
    ) -> Result<Vec<UploadRecord>, UploadError> {
        if events.is_empty() {
            return Err(UploadError::InvalidBatchPayload(
                "batch contains no files".to_string(),
            ));
        }
        let batch = timestamp::normalize(batch_timestamp)?;
        let upload_time = self.zone.format_now();

        let mut records = Vec::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            let record =
                UploadRecord::from_event(event, &self.zone, Some(&batch.text), &upload_time)
                    .map_err(|err| match err {
                        UploadError::InvalidEvent(reason) => {
                            UploadError::InvalidBatchPayload(format!("entry {index}: {reason}"))
                        }
                        other => other,
                    })?;
            records.push(record);
        }
        records.reverse();

        self.prepend(&records)?;
        Ok(records)
    }

    /// Read-modify-write under the exclusive lock, persisted in one write.
    fn prepend(&self, newest_first: &[UploadRecord]) -> Result<(), UploadError> {
        ensure_parent_dir(&self.path)?;
        let lock = FileLock::acquire(&self.path, LockMode::Exclusive)?;
        log::debug!("holding store lock {}", lock.path().display());

        let existing = read_history(&self.path)?;
        logging::checkpoint(
            "store-loaded",
            &[
                ("path", self.path.display().to_string()),
                ("records", existing.len().to_string()),
            ],
        );

        let mut history = newest_first.to_vec();
        history.extend(existing);
        let data = render_history(&self.path, &history)?;
        write_atomic(&self.path, data.as_bytes())?;

        for record in newest_first {
            logging::checkpoint(
                "record-appended",
                &[
                    ("filename", record.filename.clone()),
                    ("timestamp", record.timestamp.clone()),
                    ("total", history.len().to_string()),
                ],
            );
        }
        Ok(())
    }
}
