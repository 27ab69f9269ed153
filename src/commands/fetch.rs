use anyhow::Result;

use crate::commands::{CommandReport, describe_outcome, staged};
use crate::upload::config::UploadConfig;
use crate::upload::fetch::{HttpFetcher, gist_api_url};
use crate::upload::pipeline::UploadPipeline;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub filename: String,
    pub url: String,
    pub uploader: Option<String>,
}

pub fn run(config: &UploadConfig, opts: &FetchOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("fetch");
    let pipeline = UploadPipeline::new(config.clone());
    let fetcher = HttpFetcher::new(&config.settings.fetch).map_err(staged)?;

    report.detail(format!("url={}", opts.url));
    if let Some(api_url) = gist_api_url(&opts.url) {
        report.detail(format!("gist_api_url={api_url}"));
    }

    let outcome = pipeline
        .fetch_and_record(&fetcher, &opts.filename, &opts.url, opts.uploader.clone())
        .map_err(staged)?;
    report.detail(format!("saved={} bytes={}", outcome.target.display(), outcome.bytes));
    describe_outcome(&mut report, &outcome.pipeline);

    Ok(report)
}
