//! CRUD calls against `/productos`.
//!
//! Each call is independent and reads the token from session storage at call
//! time. Failures are returned unchanged; retry policy belongs to the caller.

use std::sync::Arc;

use reqwest::RequestBuilder;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ApiError, ApiResult, mask_token};
use crate::models::Product;
use crate::session::storage::{SessionStorage, TOKEN_KEY};

const JSON: &str = "application/json";

/// Stateless product client.
#[derive(Clone)]
pub struct ProductGateway {
    base_url: String,
    http: reqwest::Client,
    storage: Arc<dyn SessionStorage>,
}

impl ProductGateway {
    pub fn new(base_url: impl Into<String>, storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_client(base_url, reqwest::Client::new(), storage)
    }

    pub fn with_client(
        base_url: impl Into<String>,
        http: reqwest::Client,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            storage,
        }
    }

    /// True iff a non-empty token is currently stored.
    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Lists all products.
    ///
    /// With `with_credential`, only the bearer header is attached (no
    /// content negotiation, so browsers skip the CORS preflight). Without it
    /// the request carries no headers of ours at all.
    ///
    /// # Errors
    /// Returns the transport, status or decode failure unchanged.
    pub async fn list(&self, with_credential: bool) -> ApiResult<Vec<Product>> {
        let mut request = self.http.get(self.collection_url());
        if with_credential && let Some(token) = self.token() {
            debug!(token = %mask_token(&token), "listing products with credential");
            request = request.bearer_auth(token);
        } else {
            debug!(with_credential, "listing products without credential");
        }
        send_json(request).await
    }

    /// Fetches one product.
    ///
    /// # Errors
    /// Returns the transport, status or decode failure unchanged.
    pub async fn get(&self, id: i64) -> ApiResult<Product> {
        let request = self.with_full_headers(self.http.get(self.item_url(id)));
        send_json(request).await
    }

    /// Creates a product. Returns the stored record when the server echoes it.
    ///
    /// # Errors
    /// Returns the transport, status or decode failure unchanged.
    pub async fn create(&self, product: &Product) -> ApiResult<Option<Product>> {
        let request = self
            .with_full_headers(self.http.post(self.collection_url()))
            .json(product);
        send_optional_json(request).await
    }

    /// Replaces a product. Returns the stored record when the server echoes it.
    ///
    /// # Errors
    /// Returns the transport, status or decode failure unchanged.
    pub async fn update(&self, id: i64, product: &Product) -> ApiResult<Option<Product>> {
        let request = self
            .with_full_headers(self.http.put(self.item_url(id)))
            .json(product);
        send_optional_json(request).await
    }

    /// Deletes a product.
    ///
    /// # Errors
    /// Returns the transport or status failure unchanged.
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        debug!(id, has_token = self.has_token(), "deleting product");
        let request = self.with_full_headers(self.http.delete(self.item_url(id)));
        send(request).await.map(drop)
    }

    fn collection_url(&self) -> String {
        format!("{}/productos", self.base_url)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/productos/{id}", self.base_url)
    }

    fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                warn!(error = %err, "could not read stored token");
                None
            }
        }
    }

    fn with_full_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(CONTENT_TYPE, JSON).header(ACCEPT, JSON);
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn send(request: RequestBuilder) -> ApiResult<reqwest::Response> {
    let response = request.send().await?;
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "catalog response");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::http_status(status.as_u16(), &body));
    }
    Ok(response)
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<T> {
    let response = send(request).await?;
    Ok(response.json::<T>().await?)
}

/// Like [`send_json`], but an empty body is `None` rather than a decode error.
async fn send_optional_json<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<Option<T>> {
    let body = send(request).await?.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|err| ApiError::parse(format!("Failed to decode response: {err}")))
}
