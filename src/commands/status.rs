use anyhow::Result;
use std::env;
use std::fs;

use crate::commands::CommandReport;
use crate::upload::config::UploadConfig;
use crate::upload::pipeline::UploadPipeline;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/env_allowlist.rs"));
}

pub fn run(config: &UploadConfig) -> Result<CommandReport> {
    let mut report = CommandReport::new("status");
    let paths = &config.paths;
    let settings = &config.settings;
    let pipeline = UploadPipeline::new(config.clone());

    report.detail(format!("build_id={}", env!("BUILD_ID")));
    report.detail(format!("root={}", paths.root.display()));
    report.detail(format!("records_file={}", paths.records_file.display()));
    report.detail(format!("document_file={}", paths.document_file.display()));
    report.detail(format!("assets_dir={}", paths.assets_dir_on_disk().display()));
    match &config.settings_file {
        Some(path) => report.detail(format!("settings_file={}", path.display())),
        None => report.detail("settings_file=<defaults>"),
    }
    report.detail(format!("timezone={}", settings.zone().name()));
    report.detail(format!("table.signature={}", pipeline.renderer().signature()));
    report.detail(format!("table.link_root={}", settings.table.link_root));
    report.detail(format!("document.lock={}", settings.document.lock));
    report.detail(format!("document.touch_lastmod={}", settings.document.touch_lastmod));

    match pipeline.store().load() {
        Ok(history) => {
            report.detail(format!("records={}", history.len()));
            if let Some(latest) = history.first() {
                report.detail(format!(
                    "latest={} at {}",
                    latest.filename, latest.formatted_date
                ));
            }
        }
        Err(err) => report.issue(format!("{err}")),
    }

    if paths.document_file.exists() {
        match fs::read_to_string(&paths.document_file) {
            Ok(text) => {
                let headers = pipeline.renderer().count_headers(&text);
                report.detail(format!("document.tables={headers}"));
                if headers > 1 {
                    report.issue(format!(
                        "document {} has {headers} upload tables; rows go under the first",
                        paths.document_file.display()
                    ));
                }
            }
            Err(err) => report.issue(format!(
                "failed to read {}: {err}",
                paths.document_file.display()
            )),
        }
    } else {
        report.detail("document.tables=0 (document will be created)");
    }

    for key in generated::GENERATED_ENV_ALLOWLIST {
        if env::var_os(key).is_some() {
            report.detail(format!("env.{key}=set"));
        }
    }

    Ok(report)
}
