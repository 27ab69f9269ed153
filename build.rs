use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Opening of a string literal naming one of our variables.
const LITERAL_PREFIX: &str = "\"UPLOAD_INDEX_";

fn source_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Variable names quoted as complete string literals. Comments, doc text and
/// literals that only start with the prefix (format strings) are skipped.
fn env_literals(source: &str) -> impl Iterator<Item = &str> {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .flat_map(|line| line.match_indices(LITERAL_PREFIX).map(move |(at, _)| &line[at + 1..]))
        .filter_map(|rest| {
            let end = rest.find('"')?;
            let name = &rest[..end];
            let valid = name
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
            (valid && !name.ends_with('_')).then_some(name)
        })
}

fn write_env_allowlist(out_dir: &Path) -> std::io::Result<()> {
    let mut names = BTreeSet::new();
    for file in source_files(Path::new("src"))? {
        let source = fs::read_to_string(&file)?;
        names.extend(env_literals(&source).map(str::to_string));
    }

    let mut f = fs::File::create(out_dir.join("env_allowlist.rs"))?;
    writeln!(f, "pub const GENERATED_ENV_ALLOWLIST: &[&str] = &[")?;
    for name in &names {
        writeln!(f, "    {name:?},")?;
    }
    writeln!(f, "];")
}

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    write_env_allowlist(&out_dir).expect("failed to generate UPLOAD_INDEX env allowlist");

    let build_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| format!("{:x}", elapsed.as_secs()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=BUILD_ID={build_id}");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");
}
