//! HTTP loading of the two published tables.

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::csv::CsvSource;
use crate::error::DataError;

/// Fetch a table as text. Non-2xx responses and bodies without a line break
/// are load errors.
pub async fn fetch_text(client: &Client, url: &Url, label: &str) -> Result<String, DataError> {
    debug!(%url, label, "fetching table");
    let response = client
        .get(url.clone())
        .header("Cache-Control", "no-store")
        .send()
        .await
        .map_err(|source| DataError::Request {
            label: label.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DataError::HttpStatus {
            label: label.to_string(),
            status: status.as_u16(),
        });
    }

    let text = response.text().await.map_err(|source| DataError::Request {
        label: label.to_string(),
        source,
    })?;
    if !text.contains('\n') {
        return Err(DataError::NotCsv {
            label: label.to_string(),
        });
    }
    Ok(text)
}

pub fn parse_url(raw: &str) -> Result<Url, DataError> {
    Url::parse(raw).map_err(|e| DataError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

/// The settings and exercises tables published at two URLs.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: Client,
    settings_url: Url,
    exercises_url: Url,
}

impl RemoteSource {
    pub fn new(settings_url: &str, exercises_url: &str) -> Result<Self, DataError> {
        Ok(Self {
            client: Client::new(),
            settings_url: parse_url(settings_url)?,
            exercises_url: parse_url(exercises_url)?,
        })
    }

    /// Fetch both tables concurrently. Either failure fails the load.
    pub async fn load(&self) -> Result<CsvSource, DataError> {
        let (settings, exercises) = tokio::join!(
            fetch_text(&self.client, &self.settings_url, "Settings"),
            fetch_text(&self.client, &self.exercises_url, "Exercises"),
        );
        let (settings, exercises) = (settings?, exercises?);
        info!(
            settings_bytes = settings.len(),
            exercises_bytes = exercises.len(),
            "tables loaded"
        );
        Ok(CsvSource::from_text(&settings, &exercises))
    }
}
