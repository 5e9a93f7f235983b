pub mod endpoint;
pub mod response;

use serde_json::Value;
use std::time::Duration;

use crate::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the inverter's local Solar API.
#[derive(Debug, Clone)]
pub struct Api {
    pub base_url: String,
    client: reqwest::Client,
}

pub fn api(base_url: String) -> Result<Api, Error> {
    let client = reqwest::ClientBuilder::new()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Api { base_url, client })
}

/// Map transport failures and non-2xx responses to Error
fn map_api_err(error: reqwest::Error) -> Error {
    if error.is_connect() || error.is_timeout() {
        Error::Connection(error.to_string())
    } else {
        Error::ApiError(error.to_string())
    }
}

impl Api {
    /// GET `url` and decode the body as JSON.
    pub async fn get(&self, url: &str) -> Result<Value, Error> {
        let text = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(map_api_err)?
            .text()
            .await
            .map_err(|e| Error::ApiError(format!("Error reading API response: {}", e)))?;

        log::trace!("url: {}, response_text: {}", url, text);

        serde_json::from_str::<Value>(&text).map_err(|e| Error::InvalidResponse(text, e.to_string()))
    }

    pub async fn inverter_info(&self) -> Result<Value, Error> {
        let url = endpoint::url(&self.base_url, endpoint::INVERTER_INFO);
        log::info!("update inverter map: {}", url);
        self.get(&url).await
    }
}
