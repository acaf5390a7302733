//! HTTP client for the portal API.
//!
//! Endpoints (relative to the configured base URL):
//! - `GET  product-rules`
//! - `GET  products/{id}`
//! - `POST cart/items` (with an `Idempotency-Key` header)

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use dealerdesk_cart::{CartGateway, CartLineRequest, CartLineResponse, GatewayError};
use dealerdesk_catalog::{CatalogError, CatalogSource, ProductDetail, ProductRule};
use dealerdesk_core::{IdempotencyKey, ProductId};

use crate::config::PortalConfig;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Error body shape the portal uses for non-2xx answers.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// reqwest-backed `CatalogSource` + `CartGateway`.
///
/// Cheap to clone (the inner client is reference counted).
#[derive(Debug, Clone)]
pub struct HttpPortalClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpPortalClient {
    pub fn new(config: &PortalConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            token: config.auth_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Config only accepts http(s) base URLs, which always have segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json(&self, url: Url) -> Result<(StatusCode, String), CatalogError> {
        let resp = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl CatalogSource for HttpPortalClient {
    async fn fetch_product_rules(&self) -> Result<Vec<ProductRule>, CatalogError> {
        let (status, body) = self.get_json(self.endpoint(&["product-rules"])).await?;
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!("status {status}: {body}")));
        }

        let raw: Vec<Value> =
            serde_json::from_str(&body).map_err(|e| CatalogError::Decode(e.to_string()))?;

        // One malformed rule must not take the whole catalog down.
        let rules = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<ProductRule>(value) {
                Ok(rule) => Some(rule),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed product rule");
                    None
                }
            })
            .collect();
        Ok(rules)
    }

    async fn fetch_product_detail(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductDetail, CatalogError> {
        let url = self.endpoint(&["products", product_id.as_str()]);
        let (status, body) = self.get_json(url).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::ProductNotFound(product_id.clone()));
        }
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!("status {status}: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CartGateway for HttpPortalClient {
    async fn submit_cart_line(
        &self,
        request: &CartLineRequest,
        key: IdempotencyKey,
    ) -> Result<CartLineResponse, GatewayError> {
        let resp = self
            .authorized(self.client.post(self.endpoint(&["cart", "items"])))
            .header(IDEMPOTENCY_KEY_HEADER, key.to_string())
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()));
        }

        // The portal reports refusals (stock, validation, connection limits)
        // as an error status with a `message` body; keep that message.
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => Ok(CartLineResponse::rejected(err.message)),
            Err(_) => Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }
}
