use crate::error::UploadError;
use crate::logging;
use crate::upload::config::UploadConfig;
use crate::upload::fetch::Fetcher;
use crate::upload::front_matter::touch_last_modified;
use crate::upload::record::{UploadEvent, UploadRecord};
use crate::upload::store::RecordStore;
use crate::upload::table::TableRenderer;
use crate::upload::timestamp::DisplayZone;
use crate::upload::util::{FileLock, LockMode, ensure_parent_dir, write_atomic};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Newest first, as they now appear in the history and the table.
    pub records: Vec<UploadRecord>,
    pub records_file: PathBuf,
    pub document_file: PathBuf,
    pub document_created: bool,
    pub table_created: bool,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub target: PathBuf,
    pub bytes: usize,
    pub pipeline: PipelineOutcome,
}

#[derive(Debug, Deserialize)]
struct BatchEntry {
    name: String,
    path: String,
}

enum Submission<'a> {
    One(&'a UploadEvent),
    Batch {
        events: &'a [UploadEvent],
        timestamp: &'a str,
    },
}

fn batch_error(reason: impl Into<String>) -> UploadError {
    UploadError::InvalidBatchPayload(reason.into())
}

/// Decode `[{"name": ..., "path": ...}, ...]` into events sharing `timestamp`.
pub fn parse_batch_payload(payload: &str, timestamp: &str) -> Result<Vec<UploadEvent>, UploadError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|err| batch_error(format!("not valid JSON: {err}")))?;
    let items = value
        .as_array()
        .ok_or_else(|| batch_error("expected a JSON array of {name, path} objects"))?;
    if items.is_empty() {
        return Err(batch_error("batch contains no files"));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let entry: BatchEntry = serde_json::from_value(item.clone())
                .map_err(|err| batch_error(format!("entry {index}: {err}")))?;
            if entry.name.trim().is_empty() || entry.path.trim().is_empty() {
                return Err(batch_error(format!(
                    "entry {index}: name and path must be non-empty"
                )));
            }
            Ok(UploadEvent::new(entry.name, entry.path, timestamp))
        })
        .collect()
}

/// A fetched file name must be a single, ordinary path component.
pub fn validate_fetch_filename(filename: &str) -> Result<(), UploadError> {
    let trimmed = filename.trim();
    let unsafe_name = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(UploadError::InvalidEvent(format!(
            "`{filename}` is not a plain file name"
        )));
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<Option<String>, UploadError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(UploadError::io("failed to read", path, err)),
    }
}

pub struct UploadPipeline {
    config: UploadConfig,
    store: RecordStore,
    renderer: TableRenderer,
    zone: DisplayZone,
}

impl UploadPipeline {
    pub fn new(config: UploadConfig) -> Self {
        let zone = config.settings.zone();
        let store = RecordStore::new(config.paths.records_file.clone(), zone);
        let renderer = TableRenderer::new(config.settings.table.clone());
        Self {
            config,
            store,
            renderer,
            zone,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn renderer(&self) -> &TableRenderer {
        &self.renderer
    }

    pub fn record(&self, event: &UploadEvent) -> Result<PipelineOutcome, UploadError> {
        self.run(Submission::One(event))
    }

    pub fn record_batch(&self, payload: &str, timestamp: &str) -> Result<PipelineOutcome, UploadError> {
        let events = parse_batch_payload(payload, timestamp)?;
        self.run(Submission::Batch {
            events: &events,
            timestamp,
        })
    }

    /// Download `url` into the assets dir, then record it as a single event.
    /// Nothing is recorded unless the bytes were written.
    pub fn fetch_and_record(
        &self,
        fetcher: &dyn Fetcher,
        filename: &str,
        url: &str,
        uploader: Option<String>,
    ) -> Result<FetchOutcome, UploadError> {
        validate_fetch_filename(filename)?;
        let filename = filename.trim();
        let bytes = fetcher.fetch(url)?;

        let target = self.config.paths.assets_dir_on_disk().join(filename);
        write_atomic(&target, &bytes)?;
        logging::checkpoint(
            "fetch-complete",
            &[
                ("url", url.to_string()),
                ("target", target.display().to_string()),
                ("bytes", bytes.len().to_string()),
            ],
        );

        let event = UploadEvent::new(
            filename,
            self.config.paths.stored_path_for(filename),
            self.zone.now_iso(),
        )
        .with_uploader(uploader);
        let pipeline = self.record(&event)?;
        Ok(FetchOutcome {
            target,
            bytes: bytes.len(),
            pipeline,
        })
    }

    fn run(&self, submission: Submission<'_>) -> Result<PipelineOutcome, UploadError> {
        let document_file = self.config.paths.document_file.as_path();
        let locked = self.config.settings.document.lock;

        let _document_lock = if locked {
            ensure_parent_dir(document_file)?;
            Some(FileLock::acquire(document_file, LockMode::Exclusive)?)
        } else {
            None
        };
        let existing = read_document(document_file)?;

        let records = match submission {
            Submission::One(event) => vec![self.store.append_one(event)?],
            Submission::Batch { events, timestamp } => {
                self.store.append_batch(events, timestamp)?
            }
        };

        let now = self.zone.format_now();
        let document_created = existing.is_none();
        let base = existing.unwrap_or_else(|| self.renderer.new_document(&now));
        let table_created = self.renderer.find_header(&base).is_none();
        if table_created && !document_created {
            logging::notice(
                "table-created",
                &[
                    ("document", document_file.display().to_string()),
                    ("signature", self.renderer.signature()),
                ],
            );
        }
        let rendered = self.renderer.render(&base, &records);
        logging::checkpoint(
            "document-rendered",
            &[
                ("rows", records.len().to_string()),
                ("document_created", document_created.to_string()),
                ("table_created", table_created.to_string()),
            ],
        );

        let output = if self.config.settings.document.touch_lastmod {
            touch_last_modified(&rendered, &now)
        } else {
            rendered
        };

        if locked {
            write_atomic(document_file, output.as_bytes())?;
        } else {
            ensure_parent_dir(document_file)?;
            fs::write(document_file, output.as_bytes())
                .map_err(|err| UploadError::io("failed to write", document_file, err))?;
        }
        logging::checkpoint(
            "document-persisted",
            &[
                ("path", document_file.display().to_string()),
                ("bytes", output.len().to_string()),
            ],
        );

        Ok(PipelineOutcome {
            records,
            records_file: self.store.path().to_path_buf(),
            document_file: document_file.to_path_buf(),
            document_created,
            table_created,
        })
    }
}
