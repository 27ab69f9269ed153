use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_RECORDS_FILE: &str = "upload_records.json";
pub const DEFAULT_DOCUMENT_FILE: &str = "src/upload.md";
pub const DEFAULT_ASSETS_DIR: &str = "src/upload/assets";

#[derive(Debug, Clone)]
pub struct UploadPaths {
    pub root: PathBuf,
    pub records_file: PathBuf,
    pub document_file: PathBuf,
    /// Repository-relative, `/`-separated. Recorded verbatim in `path` fields.
    pub assets_dir: String,
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub root: Option<PathBuf>,
    pub records_file: Option<PathBuf>,
    pub document_file: Option<PathBuf>,
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

fn under_root(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

impl UploadPaths {
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            records_file: root.join(DEFAULT_RECORDS_FILE),
            document_file: root.join(DEFAULT_DOCUMENT_FILE),
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
        }
    }

    /// Absolute location of the assets directory on disk.
    pub fn assets_dir_on_disk(&self) -> PathBuf {
        self.root.join(&self.assets_dir)
    }

    /// Repository-relative path recorded for a file stored in the assets dir.
    pub fn stored_path_for(&self, filename: &str) -> String {
        let dir = self.assets_dir.trim_end_matches('/');
        if dir.is_empty() {
            filename.to_string()
        } else {
            format!("{dir}/{filename}")
        }
    }
}

pub fn resolve_paths(overrides: &PathOverrides) -> UploadPaths {
    let root = overrides
        .root
        .clone()
        .or_else(|| env_path("UPLOAD_INDEX_ROOT"))
        .unwrap_or_else(|| PathBuf::from("."));
    let mut paths = UploadPaths::with_root(&root);

    if let Some(records_file) = overrides
        .records_file
        .clone()
        .or_else(|| env_path("UPLOAD_INDEX_RECORDS_FILE"))
    {
        paths.records_file = under_root(&root, records_file);
    }
    if let Some(document_file) = overrides
        .document_file
        .clone()
        .or_else(|| env_path("UPLOAD_INDEX_DOCUMENT_FILE"))
    {
        paths.document_file = under_root(&root, document_file);
    }
    if let Ok(v) = env::var("UPLOAD_INDEX_ASSETS_DIR") {
        if !v.trim().is_empty() {
            paths.assets_dir = v.trim().replace('\\', "/");
        }
    }
    paths
}
