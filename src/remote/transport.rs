//! Transport seam between the persistence adapter and the remote endpoint.

use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use url::Url;

use super::api_types::{ApiAppData, ApiSaveResponse};

/// Raw read/write of the aggregate resource.
///
/// Object-safe so the adapter can hold test doubles behind the same seam;
/// async methods are expressed as boxed futures for that reason.
pub trait DataTransport: Send + Sync {
  /// Read the full dataset.
  fn fetch(&self) -> BoxFuture<'_, Result<ApiAppData>>;

  /// Write the full dataset.
  fn store(&self, data: ApiAppData) -> BoxFuture<'_, Result<ApiSaveResponse>>;
}

/// HTTP implementation against the `data` resource under the base path.
pub struct HttpTransport {
  client: reqwest::Client,
  endpoint: Url,
}

impl HttpTransport {
  pub fn new(base_url: &str) -> Result<Self> {
    let base =
      Url::parse(base_url).map_err(|e| eyre!("Invalid base url {}: {}", base_url, e))?;

    let mut endpoint = base.clone();
    endpoint
      .path_segments_mut()
      .map_err(|_| eyre!("Base url cannot carry a path: {}", base_url))?
      .pop_if_empty()
      .push("data");

    Ok(Self {
      client: reqwest::Client::new(),
      endpoint,
    })
  }
}

impl DataTransport for HttpTransport {
  fn fetch(&self) -> BoxFuture<'_, Result<ApiAppData>> {
    Box::pin(async move {
      let response = self
        .client
        .get(self.endpoint.clone())
        .header(reqwest::header::ACCEPT, "application/json")
        .header(reqwest::header::CACHE_CONTROL, "no-cache")
        .send()
        .await
        .map_err(|e| eyre!("Request failed: {}", e))?;

      let status = response.status();
      if !status.is_success() {
        return Err(eyre!("HTTP error {}", status));
      }

      let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
      if !content_type.contains("application/json") {
        return Err(eyre!("Unexpected content type: {}", content_type));
      }

      response
        .json::<ApiAppData>()
        .await
        .map_err(|e| eyre!("Malformed response body: {}", e))
    })
  }

  fn store(&self, data: ApiAppData) -> BoxFuture<'_, Result<ApiSaveResponse>> {
    Box::pin(async move {
      let response = self
        .client
        .post(self.endpoint.clone())
        .header(reqwest::header::CACHE_CONTROL, "no-cache")
        .json(&data)
        .send()
        .await
        .map_err(|e| eyre!("Request failed: {}", e))?;

      let status = response.status();
      if !status.is_success() {
        return Err(eyre!("HTTP error {}", status));
      }

      // A 2xx with an unparseable body still counts as an accepted write.
      Ok(
        response
          .json::<ApiSaveResponse>()
          .await
          .unwrap_or_default(),
      )
    })
  }
}
