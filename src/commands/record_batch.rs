use anyhow::Result;

use crate::commands::{CommandReport, describe_outcome, staged};
use crate::upload::config::UploadConfig;
use crate::upload::pipeline::UploadPipeline;

#[derive(Debug, Clone)]
pub struct RecordBatchOptions {
    /// JSON array of `{"name", "path"}` objects.
    pub files: String,
    pub timestamp: String,
}

pub fn run(config: &UploadConfig, opts: &RecordBatchOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("record-batch");
    let pipeline = UploadPipeline::new(config.clone());

    let outcome = pipeline
        .record_batch(&opts.files, &opts.timestamp)
        .map_err(staged)?;
    report.detail(format!("batch_size={}", outcome.records.len()));
    describe_outcome(&mut report, &outcome);

    Ok(report)
}
