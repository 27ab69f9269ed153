use crate::upload::paths::UploadPaths;
use crate::upload::timestamp::DisplayZone;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_LINK_ROOT: &str = "src/upload/";
const SETTINGS_FILE_NAME: &str = "upload-index.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub title: String,
    pub intro: String,
    /// Cells a header line must carry, in order. Pages started with other
    /// labels need them set here, e.g. `["文件名", "上传时间", "文件路径"]`;
    /// otherwise no header matches and a second table is appended.
    pub header_labels: Vec<String>,
    /// Prefix stripped from a record's `path` before it becomes a link target.
    pub link_root: String,
    /// Emit a `---` metadata block when the document has to be created.
    pub front_matter: bool,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            title: "Uploaded Files".to_string(),
            intro: "All uploaded files, newest first.".to_string(),
            header_labels: vec![
                "File Name".to_string(),
                "Upload Time".to_string(),
                "Link".to_string(),
            ],
            link_root: DEFAULT_LINK_ROOT.to_string(),
            front_matter: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub touch_lastmod: bool,
    /// Serialize Markdown rewrites behind the same lock discipline as the store.
    pub lock: bool,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            touch_lastmod: true,
            lock: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub timezone: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            timezone: "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("upload-index/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UploadSettings {
    pub table: TableSettings,
    pub document: DocumentSettings,
    pub display: DisplaySettings,
    pub fetch: FetchSettings,
}

impl UploadSettings {
    /// Display zone, already checked by `validate`.
    pub fn zone(&self) -> DisplayZone {
        DisplayZone::parse(&self.display.timezone).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialUploadSettings {
    table: Option<TableSettings>,
    document: Option<DocumentSettings>,
    display: Option<DisplaySettings>,
    fetch: Option<FetchSettings>,
}

/// Everything a pipeline run needs, passed explicitly into each component.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub paths: UploadPaths,
    pub settings: UploadSettings,
    pub settings_file: Option<PathBuf>,
}

impl UploadConfig {
    pub fn new(paths: UploadPaths, settings: UploadSettings) -> Self {
        Self {
            paths,
            settings,
            settings_file: None,
        }
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

pub fn validate(settings: &UploadSettings) -> Result<()> {
    if settings.table.header_labels.is_empty() {
        return Err(anyhow!("invalid table header: at least one label is required"));
    }
    if settings
        .table
        .header_labels
        .iter()
        .any(|label| label.trim().is_empty() || label.contains('|'))
    {
        return Err(anyhow!(
            "invalid table header: labels must be non-empty and must not contain `|`"
        ));
    }
    if settings.table.title.trim().is_empty() {
        return Err(anyhow!("invalid table title: cannot be empty"));
    }
    DisplayZone::parse(&settings.display.timezone)
        .map_err(|err| anyhow!("invalid display timezone: {err}"))?;
    if settings.fetch.timeout_secs == 0 {
        return Err(anyhow!("invalid fetch timeout: must be >= 1 second"));
    }
    Ok(())
}

fn resolve_settings_path(paths: &UploadPaths) -> Option<PathBuf> {
    if let Ok(custom) = env::var("UPLOAD_INDEX_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let local = paths.root.join(SETTINGS_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("upload-index").join("config.toml"))
}

fn merge_file_settings(base: &mut UploadSettings, path: &PathBuf) -> Result<()> {
    let raw = fs::read_to_string(path)
        .map_err(|err| anyhow!("failed to read settings {}: {err}", path.display()))?;
    let parsed: PartialUploadSettings = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse settings {}: {err}", path.display()))?;
    if let Some(table) = parsed.table {
        base.table = table;
    }
    if let Some(document) = parsed.document {
        base.document = document;
    }
    if let Some(display) = parsed.display {
        base.display = display;
    }
    if let Some(fetch) = parsed.fetch {
        base.fetch = fetch;
    }
    Ok(())
}

pub fn load_config(paths: UploadPaths) -> Result<UploadConfig> {
    let mut settings = UploadSettings::default();
    let settings_file = resolve_settings_path(&paths).filter(|path| path.exists());
    if let Some(path) = &settings_file {
        merge_file_settings(&mut settings, path)?;
    }

    settings.display.timezone = env_or_string("UPLOAD_INDEX_TIMEZONE", &settings.display.timezone);
    settings.table.link_root = env_or_string("UPLOAD_INDEX_LINK_ROOT", &settings.table.link_root);
    settings.document.lock = env_or_bool("UPLOAD_INDEX_LOCK_DOCUMENT", settings.document.lock);
    settings.document.touch_lastmod =
        env_or_bool("UPLOAD_INDEX_TOUCH_LASTMOD", settings.document.touch_lastmod);
    settings.fetch.timeout_secs =
        env_or_u64("UPLOAD_INDEX_FETCH_TIMEOUT_SECS", settings.fetch.timeout_secs);

    validate(&settings)?;
    Ok(UploadConfig {
        settings_file,
        ..UploadConfig::new(paths, settings)
    })
}
