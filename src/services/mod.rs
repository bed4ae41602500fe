//! Per-resource facades. Each operation binds the dispatcher to one endpoint
//! and verb, logs what it is about to do and hands back the raw response.
//! Nothing here asserts; callers decide what a good answer looks like.

pub mod auth;
pub mod carts;
pub mod endpoints;
pub mod products;

use std::sync::Arc;

use crate::error::TransportError;
use crate::http::{ApiResponse, CallInput, Dispatcher, RequestSpec};

pub use auth::AuthService;
pub use carts::CartService;
pub use products::ProductService;

/// Shared handle the facades delegate to: one dispatcher plus the request
/// spec of one authentication context.
#[derive(Debug, Clone)]
pub struct ApiClient {
    dispatcher: Arc<Dispatcher>,
    spec: Arc<RequestSpec>,
}

impl ApiClient {
    pub fn new(dispatcher: Arc<Dispatcher>, spec: Arc<RequestSpec>) -> Self {
        Self { dispatcher, spec }
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    /// Same dispatcher, different authentication context.
    pub fn with_spec(&self, spec: RequestSpec) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            spec: Arc::new(spec),
        }
    }

    pub async fn call(&self, input: CallInput) -> Result<ApiResponse, TransportError> {
        self.dispatcher.perform(&self.spec, &input).await
    }
}

/// The three resource facades over one client.
#[derive(Debug, Clone)]
pub struct Services {
    pub products: ProductService,
    pub carts: CartService,
    pub auth: AuthService,
}

impl Services {
    pub fn new(client: ApiClient) -> Self {
        Self {
            products: ProductService::new(client.clone()),
            carts: CartService::new(client.clone()),
            auth: AuthService::new(client),
        }
    }
}
