use serde::{Deserialize, Serialize};

// ─── Request Payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRequest {
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub products: Vec<CartItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// ─── Response Views ───────────────────────────────────────────────────────────
//
// Every field is optional: a missing field must surface as an assertion
// failure, not as a decode error.

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub rate: Option<f64>,
    pub count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub date: Option<String>,
    pub products: Option<Vec<CartLine>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cart_request_uses_camel_case() {
        let cart = CartRequest {
            user_id: 3,
            date: Some("2020-02-03".into()),
            products: vec![CartItem {
                product_id: 5,
                quantity: 1,
            }],
        };
        assert_eq!(
            serde_json::to_value(&cart).unwrap(),
            json!({"userId": 3, "date": "2020-02-03", "products": [{"productId": 5, "quantity": 1}]})
        );
    }

    #[test]
    fn product_view_tolerates_missing_fields() {
        let product: Product = serde_json::from_value(json!({"id": 1, "title": "Bag"})).unwrap();
        assert_eq!(product.id, Some(1));
        assert!(product.price.is_none());
        assert!(product.rating.is_none());
    }

    #[test]
    fn login_request_defaults_missing_fields_to_empty() {
        let login: LoginRequest = serde_json::from_value(json!({"username": ""})).unwrap();
        assert_eq!(login.password, "");
    }
}
