//! In-process stand-in for the FakeStore API.
//!
//! Answers the way a well-behaved store would (strict validation, 400 for
//! malformed ids, 404 for unknown ones) and records every request it sees.
//! [`StubServer::start_accepting`] starts a careless variant that answers
//! 200 to every POST and PUT, whatever the body.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const USERNAME: &str = "mor_2314";
pub const PASSWORD: &str = "83r5^_";
pub const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.stub.signature";
pub const PRODUCT_COUNT: i64 = 20;
pub const SLOW_MS: u64 = 500;

/// One request as the stub received it.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub body: String,
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubServer {
    pub async fn start() -> Self {
        Self::serve(false).await
    }

    /// A store that validates nothing it is sent.
    pub async fn start_accepting() -> Self {
        Self::serve(true).await
    }

    async fn serve(accepts_anything: bool) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(handle).with_state(Shared {
            requests: Arc::clone(&requests),
            accepts_anything,
        });

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
        Self {
            base_url,
            requests,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().unwrap()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[derive(Clone)]
struct Shared {
    requests: Arc<Mutex<Vec<Recorded>>>,
    accepts_anything: bool,
}

async fn handle(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let body = String::from_utf8_lossy(&body).into_owned();
    shared.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: header(header::CONTENT_TYPE),
        authorization: header(header::AUTHORIZATION),
        user_agent: header(header::USER_AGENT),
        body: body.clone(),
    });

    let segments: Vec<&str> = uri.path().trim_matches('/').split('/').collect();
    if segments == ["slow"] {
        tokio::time::sleep(Duration::from_millis(SLOW_MS)).await;
        return reply(StatusCode::OK, json!({"slow": true}));
    }
    if shared.accepts_anything && (method == Method::POST || method == Method::PUT) {
        return reply(StatusCode::OK, json!({ "id": 1, "token": TOKEN }));
    }
    let (status, payload) = route(&method, &segments, uri.query().unwrap_or_default(), &body);
    reply(status, payload)
}

fn reply(status: StatusCode, payload: Value) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        payload.to_string(),
    )
        .into_response()
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Value) {
    (status, json!({ "error": message }))
}

fn route(method: &Method, segments: &[&str], query: &str, body: &str) -> (StatusCode, Value) {
    match (method.as_str(), segments) {
        ("GET", ["products"]) => list_products(query),
        ("POST", ["products"]) => match product_payload(body) {
            Ok(mut product) => {
                product.insert("id".into(), json!(PRODUCT_COUNT + 1));
                (StatusCode::CREATED, Value::Object(product))
            }
            Err(message) => error(StatusCode::BAD_REQUEST, message),
        },
        (verb, ["products", id]) => {
            let id = match known_id(id, PRODUCT_COUNT) {
                Ok(id) => id,
                Err(failure) => return failure,
            };
            match verb {
                "GET" | "DELETE" => (StatusCode::OK, product(id)),
                "PUT" => match product_payload(body) {
                    Ok(mut product) => {
                        product.insert("id".into(), json!(id));
                        (StatusCode::OK, Value::Object(product))
                    }
                    Err(message) => error(StatusCode::BAD_REQUEST, message),
                },
                _ => error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
            }
        }
        ("GET", ["carts"]) => (StatusCode::OK, Value::Array((1..=7).map(cart).collect())),
        ("POST", ["carts"]) => match cart_payload(body) {
            Ok(mut cart) => {
                cart.insert("id".into(), json!(8));
                (StatusCode::CREATED, Value::Object(cart))
            }
            Err(message) => error(StatusCode::BAD_REQUEST, message),
        },
        ("GET", ["carts", "user", user]) => match user.parse::<i64>() {
            Ok(user) => {
                let carts = (1..=7).map(cart).filter(|c| c["userId"] == user).collect();
                (StatusCode::OK, Value::Array(carts))
            }
            Err(_) => error(StatusCode::BAD_REQUEST, "invalid user id"),
        },
        (verb, ["carts", id]) => {
            let id = match known_id(id, 7) {
                Ok(id) => id,
                Err(failure) => return failure,
            };
            match verb {
                "GET" | "DELETE" => (StatusCode::OK, cart(id)),
                "PUT" => match cart_payload(body) {
                    Ok(mut cart) => {
                        cart.insert("id".into(), json!(id));
                        (StatusCode::OK, Value::Object(cart))
                    }
                    Err(message) => error(StatusCode::BAD_REQUEST, message),
                },
                _ => error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
            }
        }
        ("POST", ["auth", "login"]) => login(body),
        _ => error(StatusCode::NOT_FOUND, "not found"),
    }
}

fn known_id(raw: &str, count: i64) -> Result<i64, (StatusCode, Value)> {
    let id = raw
        .parse::<i64>()
        .map_err(|_| error(StatusCode::BAD_REQUEST, "id must be a number"))?;
    if (1..=count).contains(&id) {
        Ok(id)
    } else {
        Err(error(StatusCode::NOT_FOUND, "resource not found"))
    }
}

fn list_products(query: &str) -> (StatusCode, Value) {
    let limit = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("limit="));
    let take = match limit.map(str::parse::<i64>) {
        None => PRODUCT_COUNT,
        Some(Ok(n)) if n > 0 => n.min(PRODUCT_COUNT),
        Some(_) => return error(StatusCode::BAD_REQUEST, "limit must be a positive integer"),
    };
    (StatusCode::OK, Value::Array((1..=take).map(product).collect()))
}

fn product(id: i64) -> Value {
    let categories = ["electronics", "jewelery", "men's clothing", "women's clothing"];
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "price": 9.5 + id as f64,
        "description": format!("Description of product {id}"),
        "category": categories[(id as usize) % categories.len()],
        "image": format!("https://fakestoreapi.com/img/{id}.jpg"),
        "rating": { "rate": 3.9, "count": 120 + id }
    })
}

fn cart(id: i64) -> Value {
    let users = [1, 1, 2, 3, 3, 4, 5];
    json!({
        "id": id,
        "userId": users[(id as usize - 1) % users.len()],
        "date": "2020-03-02T00:00:00.000Z",
        "products": [
            { "productId": 1, "quantity": 4 },
            { "productId": id, "quantity": 1 }
        ]
    })
}

fn object(body: &str) -> Result<Map<String, Value>, &'static str> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("body must be a JSON object"),
        Err(_) => Err("malformed JSON body"),
    }
}

fn product_payload(body: &str) -> Result<Map<String, Value>, &'static str> {
    let product = object(body)?;
    for field in ["title", "description", "image", "category"] {
        if !product.get(field).is_some_and(Value::is_string) {
            return Err("title, description, image and category are required strings");
        }
    }
    if !product.get("price").is_some_and(Value::is_number) {
        return Err("price must be a number");
    }
    Ok(product)
}

fn cart_payload(body: &str) -> Result<Map<String, Value>, &'static str> {
    let cart = object(body)?;
    if !cart.get("userId").is_some_and(Value::is_number) {
        return Err("userId must be a number");
    }
    let lines = cart
        .get("products")
        .and_then(Value::as_array)
        .ok_or("products must be an array")?;
    if lines.is_empty() {
        return Err("products must not be empty");
    }
    let well_formed = lines.iter().all(|line| {
        line.get("productId").is_some_and(Value::is_number)
            && line.get("quantity").is_some_and(Value::is_number)
    });
    if !well_formed {
        return Err("every product needs a numeric productId and quantity");
    }
    Ok(cart)
}

fn login(body: &str) -> (StatusCode, Value) {
    if body.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "username and password are not provided in JSON format");
    }
    let credentials = match object(body) {
        Ok(credentials) => credentials,
        Err(message) => return error(StatusCode::BAD_REQUEST, message),
    };
    let field = |name: &str| credentials.get(name).and_then(Value::as_str).unwrap_or_default();
    let (username, password) = (field("username"), field("password"));
    if username.is_empty() || password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "username and password are required");
    }
    if username == USERNAME && password == PASSWORD {
        (StatusCode::OK, json!({ "token": TOKEN }))
    } else {
        error(StatusCode::UNAUTHORIZED, "username or password is incorrect")
    }
}
