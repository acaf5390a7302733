//! In-memory collaborators for tests and offline runs.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use dealerdesk_cart::{CartGateway, CartLineRequest, CartLineResponse, GatewayError};
use dealerdesk_catalog::{CatalogError, CatalogSource, ProductDetail, ProductRule};
use dealerdesk_core::{IdempotencyKey, ProductId};

/// In-memory product catalog.
///
/// Not optimized; intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, ProductDetail>>,
    rules: RwLock<Vec<ProductRule>>,
    rules_unavailable: RwLock<bool>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, product: ProductDetail) -> Self {
        self.put_product(product);
        self
    }

    pub fn with_rule(self, rule: ProductRule) -> Self {
        self.put_rule(rule);
        self
    }

    pub fn put_product(&self, product: ProductDetail) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.id.clone(), product);
        }
    }

    pub fn put_rule(&self, rule: ProductRule) {
        if let Ok(mut rules) = self.rules.write() {
            rules.push(rule);
        }
    }

    /// Make `fetch_product_rules` fail until switched back.
    pub fn set_rules_unavailable(&self, unavailable: bool) {
        if let Ok(mut flag) = self.rules_unavailable.write() {
            *flag = unavailable;
        }
    }
}

fn poisoned() -> CatalogError {
    CatalogError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn fetch_product_rules(&self) -> Result<Vec<ProductRule>, CatalogError> {
        if *self.rules_unavailable.read().map_err(|_| poisoned())? {
            return Err(CatalogError::Unavailable(
                "rule service unavailable".to_string(),
            ));
        }
        Ok(self.rules.read().map_err(|_| poisoned())?.clone())
    }

    async fn fetch_product_detail(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductDetail, CatalogError> {
        self.products
            .read()
            .map_err(|_| poisoned())?
            .get(product_id)
            .cloned()
            .ok_or_else(|| CatalogError::ProductNotFound(product_id.clone()))
    }
}

/// One call seen by [`RecordingCartGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAttempt {
    pub request: CartLineRequest,
    pub key: IdempotencyKey,
}

#[derive(Debug, Default)]
struct CartState {
    attempts: Vec<RecordedAttempt>,
    /// Accepted lines with their idempotency key; a replayed key is not added twice.
    lines: Vec<(IdempotencyKey, CartLineRequest)>,
    scripted: Vec<Result<CartLineResponse, GatewayError>>,
}

/// Cart that records every attempt and accepts lines idempotently.
///
/// Outcomes can be scripted with [`RecordingCartGateway::push_outcome`];
/// unscripted calls are accepted.
#[derive(Debug, Default)]
pub struct RecordingCartGateway {
    state: Mutex<CartState>,
}

impl RecordingCartGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next call (FIFO).
    pub fn push_outcome(&self, outcome: Result<CartLineResponse, GatewayError>) {
        if let Ok(mut state) = self.state.lock() {
            state.scripted.push(outcome);
        }
    }

    pub fn attempts(&self) -> Vec<RecordedAttempt> {
        self.state
            .lock()
            .map(|s| s.attempts.clone())
            .unwrap_or_default()
    }

    /// Lines that made it into the cart, in acceptance order.
    pub fn lines(&self) -> Vec<CartLineRequest> {
        self.state
            .lock()
            .map(|s| s.lines.iter().map(|(_, line)| line.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CartGateway for RecordingCartGateway {
    async fn submit_cart_line(
        &self,
        request: &CartLineRequest,
        key: IdempotencyKey,
    ) -> Result<CartLineResponse, GatewayError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| GatewayError::Transport("lock poisoned".to_string()))?;

        state.attempts.push(RecordedAttempt {
            request: request.clone(),
            key,
        });

        let outcome = if state.scripted.is_empty() {
            Ok(CartLineResponse::accepted())
        } else {
            state.scripted.remove(0)
        };

        let accepted = matches!(outcome, Ok(CartLineResponse { success: true, .. }));
        if accepted && !state.lines.iter().any(|(k, _)| *k == key) {
            state.lines.push((key, request.clone()));
        }
        outcome
    }
}
