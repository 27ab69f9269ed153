use crate::error::UploadError;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Rendering format shared by `formattedDate`, `uploadTime` and `lastmod`.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
    Aware(DateTime<FixedOffset>),
    /// No offset given; taken to already be in the display zone.
    Naive(NaiveDateTime),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTimestamp {
    pub text: String,
    pub parsed: ParsedTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    #[default]
    Local,
    Named(Tz),
}

impl DisplayZone {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        trimmed
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| format!("unknown time zone `{trimmed}`"))
    }

    pub fn name(&self) -> String {
        match self {
            Self::Local => "local".to_string(),
            Self::Named(tz) => tz.name().to_string(),
        }
    }

    pub fn format(&self, ts: &ParsedTimestamp) -> String {
        match (ts, self) {
            (ParsedTimestamp::Naive(naive), _) => naive.format(DISPLAY_FORMAT).to_string(),
            (ParsedTimestamp::Aware(dt), Self::Local) => dt
                .with_timezone(&Local)
                .format(DISPLAY_FORMAT)
                .to_string(),
            (ParsedTimestamp::Aware(dt), Self::Named(tz)) => {
                dt.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
            }
        }
    }

    pub fn format_now(&self) -> String {
        self.format(&ParsedTimestamp::Aware(Utc::now().fixed_offset()))
    }

    /// Current time as an offset-carrying ISO-8601 string in this zone.
    pub fn now_iso(&self) -> String {
        match self {
            Self::Local => Local::now().to_rfc3339(),
            Self::Named(tz) => Utc::now().with_timezone(tz).to_rfc3339(),
        }
    }
}

fn invalid(value: &str, reason: &str) -> UploadError {
    UploadError::InvalidTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Replace a trailing `Z` designator with the explicit `+00:00` offset.
pub fn normalize_zulu(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => trimmed.to_string(),
    }
}

fn parse_normalized(text: &str) -> Option<ParsedTimestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedTimestamp::Aware(dt));
    }
    for fmt in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(ParsedTimestamp::Aware(dt));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ParsedTimestamp::Naive(naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(ParsedTimestamp::Naive)
}

pub fn normalize(raw: &str) -> Result<NormalizedTimestamp, UploadError> {
    if raw.trim().is_empty() {
        return Err(invalid(raw, "timestamp is missing"));
    }
    let text = normalize_zulu(raw);
    let parsed = parse_normalized(&text).ok_or_else(|| invalid(raw, "not an ISO-8601 date-time"))?;
    Ok(NormalizedTimestamp { text, parsed })
}
