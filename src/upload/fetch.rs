use crate::error::UploadError;
use crate::upload::config::FetchSettings;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

const GIST_HOST: &str = "gist.github.com";
const GIST_API: &str = "https://api.github.com/gists";

/// Remote download collaborator: `fetch(url) -> bytes`.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, UploadError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| UploadError::fetch("<client>", err.to_string()))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, UploadError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| UploadError::fetch(url, err.to_string()))?;
        if !response.status().is_success() {
            return Err(UploadError::fetch(
                url,
                format!("server returned status {}", response.status()),
            ));
        }
        Ok(response)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, UploadError> {
        if let Some(api_url) = gist_api_url(url) {
            let json: Value = self
                .get(&api_url)?
                .json()
                .map_err(|err| UploadError::fetch(&api_url, format!("invalid gist response: {err}")))?;
            let content = first_gist_file(&json).map_err(|reason| UploadError::fetch(&api_url, reason))?;
            return Ok(content.into_bytes());
        }

        let bytes = self
            .get(url)?
            .bytes()
            .map_err(|err| UploadError::fetch(url, err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// API endpoint for a gist page URL, keyed by the gist id (last path segment).
pub fn gist_api_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once(GIST_HOST)?;
    let path = rest.split(['?', '#']).next().unwrap_or_default();
    let id = path
        .trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())?;
    Some(format!("{GIST_API}/{id}"))
}

/// Text content of the first file listed in a gist API response.
pub fn first_gist_file(json: &Value) -> Result<String, String> {
    let files = json
        .get("files")
        .and_then(Value::as_object)
        .ok_or_else(|| "gist response missing `files`".to_string())?;
    let (name, file) = files
        .iter()
        .next()
        .ok_or_else(|| "gist has no files".to_string())?;
    file.get("content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("gist file `{name}` has no text content"))
}
