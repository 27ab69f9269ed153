use anyhow::Result;

use crate::commands::{CommandReport, describe_outcome, staged};
use crate::upload::config::UploadConfig;
use crate::upload::pipeline::UploadPipeline;
use crate::upload::record::UploadEvent;

#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub filename: String,
    pub path: String,
    pub timestamp: String,
    pub uploader: Option<String>,
}

pub fn run(config: &UploadConfig, opts: &RecordOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("record");
    let pipeline = UploadPipeline::new(config.clone());

    let event = UploadEvent::new(&opts.filename, &opts.path, &opts.timestamp)
        .with_uploader(opts.uploader.clone());
    let outcome = pipeline.record(&event).map_err(staged)?;
    describe_outcome(&mut report, &outcome);

    Ok(report)
}
