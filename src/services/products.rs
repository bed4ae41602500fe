use std::fmt::Display;

use tracing::info;

use super::endpoints::{PRODUCTS, PRODUCT_BY_ID};
use super::ApiClient;
use crate::error::TransportError;
use crate::http::{ApiResponse, Body, CallInput};
use crate::models::ProductRequest;

#[derive(Debug, Clone)]
pub struct ProductService {
    client: ApiClient,
}

impl ProductService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Result<ApiResponse, TransportError> {
        info!(resource = "products", "getting all products");
        self.client.call(CallInput::get(PRODUCTS)).await
    }

    pub async fn get_all_with_limit(&self, limit: i64) -> Result<ApiResponse, TransportError> {
        info!(resource = "products", limit, "getting products with limit: {limit}");
        self.client
            .call(CallInput::get(PRODUCTS).query("limit", limit))
            .await
    }

    /// Accepts malformed ids too; validating them is the server's job.
    pub async fn get_by_id(&self, id: impl Display) -> Result<ApiResponse, TransportError> {
        info!(resource = "products", %id, "getting product by ID: {id}");
        self.client
            .call(CallInput::get(PRODUCT_BY_ID).path("id", id))
            .await
    }

    pub async fn create(&self, product: &ProductRequest) -> Result<ApiResponse, TransportError> {
        info!(resource = "products", title = %product.title, "creating new product");
        self.client
            .call(CallInput::post(PRODUCTS).body(Body::json(product)?))
            .await
    }

    pub async fn create_raw(&self, json: &str) -> Result<ApiResponse, TransportError> {
        info!(resource = "products", "creating product with JSON string");
        self.client
            .call(CallInput::post(PRODUCTS).body(Body::raw(json)))
            .await
    }

    pub async fn update(
        &self,
        id: impl Display,
        product: &ProductRequest,
    ) -> Result<ApiResponse, TransportError> {
        info!(resource = "products", %id, "updating product ID: {id}");
        self.client
            .call(
                CallInput::put(PRODUCT_BY_ID)
                    .path("id", id)
                    .body(Body::json(product)?),
            )
            .await
    }

    pub async fn update_raw(
        &self,
        id: impl Display,
        json: &str,
    ) -> Result<ApiResponse, TransportError> {
        info!(resource = "products", %id, "updating product ID: {id} with JSON string");
        self.client
            .call(CallInput::put(PRODUCT_BY_ID).path("id", id).body(Body::raw(json)))
            .await
    }

    pub async fn delete(&self, id: impl Display) -> Result<ApiResponse, TransportError> {
        info!(resource = "products", %id, "deleting product ID: {id}");
        self.client
            .call(CallInput::delete(PRODUCT_BY_ID).path("id", id))
            .await
    }
}
