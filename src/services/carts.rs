use std::fmt::Display;

use tracing::info;

use super::endpoints::{CARTS, CARTS_BY_USER, CART_BY_ID};
use super::ApiClient;
use crate::error::TransportError;
use crate::http::{ApiResponse, Body, CallInput};
use crate::models::CartRequest;

#[derive(Debug, Clone)]
pub struct CartService {
    client: ApiClient,
}

impl CartService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Result<ApiResponse, TransportError> {
        info!(resource = "carts", "getting all carts");
        self.client.call(CallInput::get(CARTS)).await
    }

    pub async fn get_by_id(&self, id: impl Display) -> Result<ApiResponse, TransportError> {
        info!(resource = "carts", %id, "getting cart by ID: {id}");
        self.client
            .call(CallInput::get(CART_BY_ID).path("id", id))
            .await
    }

    pub async fn get_by_user(&self, user_id: impl Display) -> Result<ApiResponse, TransportError> {
        info!(resource = "carts", %user_id, "getting carts for user ID: {user_id}");
        self.client
            .call(CallInput::get(CARTS_BY_USER).path("userId", user_id))
            .await
    }

    pub async fn create(&self, cart: &CartRequest) -> Result<ApiResponse, TransportError> {
        info!(resource = "carts", user_id = cart.user_id, "creating new cart for user ID: {}", cart.user_id);
        self.client
            .call(CallInput::post(CARTS).body(Body::json(cart)?))
            .await
    }

    pub async fn create_raw(&self, json: &str) -> Result<ApiResponse, TransportError> {
        info!(resource = "carts", "creating cart with JSON string");
        self.client
            .call(CallInput::post(CARTS).body(Body::raw(json)))
            .await
    }

    pub async fn update(
        &self,
        id: impl Display,
        cart: &CartRequest,
    ) -> Result<ApiResponse, TransportError> {
        info!(resource = "carts", %id, "updating cart ID: {id}");
        self.client
            .call(CallInput::put(CART_BY_ID).path("id", id).body(Body::json(cart)?))
            .await
    }

    pub async fn update_raw(
        &self,
        id: impl Display,
        json: &str,
    ) -> Result<ApiResponse, TransportError> {
        info!(resource = "carts", %id, "updating cart ID: {id} with JSON string");
        self.client
            .call(CallInput::put(CART_BY_ID).path("id", id).body(Body::raw(json)))
            .await
    }

    pub async fn delete(&self, id: impl Display) -> Result<ApiResponse, TransportError> {
        info!(resource = "carts", %id, "deleting cart ID: {id}");
        self.client
            .call(CallInput::delete(CART_BY_ID).path("id", id))
            .await
    }
}
