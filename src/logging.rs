use env_logger::Env;

pub const LOG_ENV: &str = "UPLOAD_INDEX_LOG";

/// Leveled log on stderr. `UPLOAD_INDEX_LOG` wins over `-v`.
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, default_level))
        .format_target(false)
        .format_timestamp_secs()
        .try_init();
}

fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if !ch.is_control() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn format_event(stage: &str, fields: &[(&str, String)]) -> String {
    let mut line = format!("stage={}", sanitize_value(stage));
    for (key, value) in fields {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(&sanitize_value(value));
    }
    line
}

/// Pipeline checkpoint: one `stage=... key=value` line at info level.
pub fn checkpoint(stage: &str, fields: &[(&str, String)]) {
    log::info!("{}", format_event(stage, fields));
}

pub fn notice(stage: &str, fields: &[(&str, String)]) {
    log::warn!("{}", format_event(stage, fields));
}
