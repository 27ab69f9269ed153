use crate::error::UploadError;
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Advisory lock on a `<target>.lock` sidecar. Released on drop.
///
/// The sidecar is locked rather than the target itself because writes replace
/// the target by rename, which would leave waiters holding a lock on a stale
/// inode.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("upload-index"));
    name.push(".lock");
    target.with_file_name(name)
}

/// `\r\n` when the text uses it anywhere, `\n` otherwise.
pub fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Split on `\n` keeping a final empty segment, with any `\r` terminator
/// removed. Joining with `line_ending` restores the document.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

impl FileLock {
    /// Block until the lock is held. No timeout.
    pub fn acquire(target: &Path, mode: LockMode) -> Result<Self, UploadError> {
        let path = lock_path_for(target);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| UploadError::io("failed to open lock file", &path, err))?;
        let locked = match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        };
        locked.map_err(|err| UploadError::io("failed to lock", &path, err))?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

pub fn ensure_parent_dir(path: &Path) -> Result<(), UploadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| UploadError::io("failed to create", parent, err))?;
    }
    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    fs::Permissions::from_mode(0o644)
}

fn write_and_sync(tmp: &mut NamedTempFile, bytes: &[u8]) -> std::io::Result<()> {
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()
}

/// Write `bytes` to a temp file beside `path`, fsync it and rename it over
/// `path`. Readers see either the old content or the new, never a prefix.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), UploadError> {
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = NamedTempFile::new_in(&dir)
        .map_err(|err| UploadError::io("failed to create temp file in", &dir, err))?;
    if let Err(err) = write_and_sync(&mut tmp, bytes) {
        return Err(UploadError::io("failed to write", tmp.path(), err));
    }

    let permissions = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        #[cfg(unix)]
        Err(_) => Some(default_permissions()),
        #[cfg(not(unix))]
        Err(_) => None,
    };
    if let Some(permissions) = permissions {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|err| UploadError::io("failed to set permissions on", tmp.path(), err))?;
    }

    tmp.persist(path)
        .map_err(|err| UploadError::io("failed to replace", path, err.error))?;
    Ok(())
}
