use tracing::info;

use super::endpoints::LOGIN;
use super::ApiClient;
use crate::error::TransportError;
use crate::http::{ApiResponse, Body, CallInput};
use crate::models::LoginRequest;

#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<ApiResponse, TransportError> {
        info!(resource = "auth", username = %credentials.username, "attempting login for user: {}", credentials.username);
        self.client
            .call(CallInput::post(LOGIN).body(Body::json(credentials)?))
            .await
    }

    pub async fn login_raw(&self, json: &str) -> Result<ApiResponse, TransportError> {
        info!(resource = "auth", "attempting login with JSON string");
        self.client
            .call(CallInput::post(LOGIN).body(Body::raw(json)))
            .await
    }

    pub async fn login_without_body(&self) -> Result<ApiResponse, TransportError> {
        info!(resource = "auth", "attempting login without body");
        self.client.call(CallInput::post(LOGIN)).await
    }
}
