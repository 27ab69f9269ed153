pub mod fetch;
pub mod record;
pub mod record_batch;
pub mod status;

use crate::error::UploadError;
use crate::upload::pipeline::PipelineOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Attach the failing pipeline stage so the diagnostic names it.
pub fn staged(err: UploadError) -> anyhow::Error {
    let stage = err.stage();
    anyhow::Error::new(err).context(format!("stage={stage}"))
}

pub fn describe_outcome(report: &mut CommandReport, outcome: &PipelineOutcome) {
    report.detail(format!("records_file={}", outcome.records_file.display()));
    report.detail(format!("document_file={}", outcome.document_file.display()));
    report.detail(format!("document_created={}", outcome.document_created));
    report.detail(format!("table_created={}", outcome.table_created));
    for record in &outcome.records {
        report.detail(format!(
            "recorded filename={} path={} formatted_date={}",
            record.filename, record.path, record.formatted_date
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_marks_report_failed() {
        let mut report = CommandReport::new("status");
        report.detail("records=0");
        assert!(report.ok);
        report.issue("record store is corrupt");
        assert!(!report.ok);
        assert_eq!(report.details, vec!["records=0"]);
    }

    #[test]
    fn staged_error_names_stage() {
        let err = staged(UploadError::InvalidBatchPayload("empty".into()));
        assert_eq!(
            format!("{err:#}"),
            "stage=validate: invalid batch payload: empty"
        );
    }
}
