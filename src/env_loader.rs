use std::env;
use std::path::PathBuf;

fn fallback_dotenv_paths(root: Option<PathBuf>, config_dir: Option<PathBuf>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(root) = root {
        out.push(root.join(".env"));
    }
    if let Some(config_dir) = config_dir {
        out.push(config_dir.join("upload-index/.env"));
    }
    out
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let candidates = fallback_dotenv_paths(
        env::var_os("UPLOAD_INDEX_ROOT").map(PathBuf::from),
        dirs::config_dir(),
    );
    if let Some(path) = candidates.into_iter().find(|path| path.is_file()) {
        let _ = dotenvy::from_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::fallback_dotenv_paths;
    use std::path::PathBuf;

    #[test]
    fn fallback_prefers_repository_root() {
        let got = fallback_dotenv_paths(
            Some(PathBuf::from("/workspace/site")),
            Some(PathBuf::from("/home/alice/.config")),
        );
        let want = vec![
            PathBuf::from("/workspace/site/.env"),
            PathBuf::from("/home/alice/.config/upload-index/.env"),
        ];
        assert_eq!(got, want);
    }

    #[test]
    fn fallback_uses_config_dir_when_root_unset() {
        let got = fallback_dotenv_paths(None, Some(PathBuf::from("/home/alice/.config")));
        assert_eq!(got, vec![PathBuf::from("/home/alice/.config/upload-index/.env")]);
    }
}
