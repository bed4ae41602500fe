//! Named dataset providers for the built-in catalog.

use serde::de::DeserializeOwned;

use crate::error::FixtureError;
use crate::models::{CartRequest, LoginRequest, ProductRequest};
use crate::testing::{Dataset, FixtureStore, Scenario};

type Provided<T> = Result<Dataset<T>, FixtureError>;

const VALID_CREDENTIALS: &str = "auth/valid-credentials.json";
const INVALID_CREDENTIALS: &str = "auth/invalid-credentials.json";
const VALID_PRODUCT: &str = "products/valid-product.json";
const INVALID_PRODUCT: &str = "products/invalid-product.json";
const UPDATE_PRODUCT: &str = "products/update-product.json";
const VALID_CART: &str = "carts/valid-cart.json";
const INVALID_CART: &str = "carts/invalid-cart.json";
const UPDATE_CART: &str = "carts/update-cart.json";

// ─── Inline ───────────────────────────────────────────────────────────────────

pub fn valid_product_ids() -> Provided<i64> {
    Dataset::inline("validProductIds", "200 with product", [1, 5, 10])
}

pub fn invalid_product_ids() -> Provided<&'static str> {
    Dataset::inline("invalidProductIds", "400 error", ["abc", "xyz123", "!@#"])
}

pub fn non_existent_product_ids() -> Provided<i64> {
    Dataset::inline("nonExistentProductIds", "400/404 error", [99999, 88888])
}

pub fn product_limits() -> Provided<i64> {
    Dataset::inline("productLimitParams", "exactly <limit> products", [5, 10, 1])
}

pub fn invalid_product_limits() -> Provided<i64> {
    Dataset::inline("invalidProductLimitParams", "400 error", [-1, 0, -100])
}

pub fn valid_cart_ids() -> Provided<i64> {
    Dataset::inline("validCartIds", "200 with cart", [1, 5, 7])
}

pub fn invalid_cart_ids() -> Provided<&'static str> {
    Dataset::inline("invalidCartIds", "400 error", ["xyz", "abc123", "!@#"])
}

pub fn non_existent_cart_ids() -> Provided<i64> {
    Dataset::inline("nonExistentCartIds", "400/404 error", [99999, 88888])
}

pub fn valid_user_ids() -> Provided<i64> {
    Dataset::inline("validUserIds", "200 with the user's carts", [1, 2, 3])
}

pub fn non_existent_user_ids() -> Provided<i64> {
    Dataset::inline("nonExistentUserIds", "empty list or 400/404", [99999, 88888])
}

/// Methods without parameters still run as one labeled scenario.
pub fn unparameterized(label: &str, expected: &str) -> Provided<()> {
    Ok(Dataset::single("none", label, (), expected))
}

// ─── Fixture-backed ───────────────────────────────────────────────────────────

fn whole<T: DeserializeOwned>(
    store: &FixtureStore,
    file: &str,
    name: &str,
    expected: &str,
) -> Provided<T> {
    let input = store.document(file)?.whole()?;
    Ok(Dataset::single(name, name, input, expected))
}

fn branch<T: DeserializeOwned>(
    store: &FixtureStore,
    file: &str,
    key: &str,
    name: &str,
    expected: &str,
) -> Provided<T> {
    let input = store.document(file)?.branch(key)?;
    Ok(Dataset::single(name, key, input, expected))
}

fn raw(store: &FixtureStore, file: &str, key: &str, name: &str, expected: &str) -> Provided<String> {
    let input = store.document(file)?.branch_raw(key)?;
    Ok(Dataset::single(name, key, input, expected))
}

pub fn valid_credentials(store: &FixtureStore) -> Provided<LoginRequest> {
    whole(store, VALID_CREDENTIALS, "validCredentials", "200 with token")
}

pub fn invalid_username(store: &FixtureStore) -> Provided<LoginRequest> {
    branch(store, INVALID_CREDENTIALS, "invalidUsername", "invalidUsername", "401")
}

pub fn invalid_password(store: &FixtureStore) -> Provided<LoginRequest> {
    branch(store, INVALID_CREDENTIALS, "invalidPassword", "invalidPassword", "401")
}

pub fn empty_credentials(store: &FixtureStore) -> Provided<LoginRequest> {
    branch(store, INVALID_CREDENTIALS, "emptyCredentials", "emptyCredentials", "400/401")
}

pub fn malformed_login_json(store: &FixtureStore) -> Provided<String> {
    raw(store, INVALID_CREDENTIALS, "malformedJson", "malformedJson", "400")
}

pub fn sql_injection_credentials(store: &FixtureStore) -> Provided<LoginRequest> {
    branch(
        store,
        INVALID_CREDENTIALS,
        "sqlInjection",
        "sqlInjectionCredentials",
        "401 without token",
    )
}

pub fn failed_login_credentials(store: &FixtureStore) -> Provided<LoginRequest> {
    branch(store, INVALID_CREDENTIALS, "failedLogin", "failedLoginCredentials", "401 every attempt")
}

/// Three rejected variants from one document, one labeled scenario each.
pub fn multiple_invalid_credentials(store: &FixtureStore) -> Provided<LoginRequest> {
    let document = store.document(INVALID_CREDENTIALS)?;
    let variants = [
        ("invalidUsername", "Invalid username"),
        ("invalidPassword", "Invalid password"),
        ("emptyCredentials", "Empty credentials"),
    ];
    let scenarios = variants
        .into_iter()
        .map(|(key, label)| -> Result<Scenario<LoginRequest>, FixtureError> {
            Ok(Scenario::new(label, document.branch(key)?, "400/401"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Dataset::new("multipleInvalidCredentials", scenarios)
}

pub fn valid_product(store: &FixtureStore) -> Provided<ProductRequest> {
    whole(store, VALID_PRODUCT, "validProductData", "200/201 echoing the product")
}

pub fn invalid_product_missing_fields(store: &FixtureStore) -> Provided<String> {
    raw(store, INVALID_PRODUCT, "missingFields", "invalidProductMissingFields", "400")
}

pub fn invalid_product_price(store: &FixtureStore) -> Provided<String> {
    raw(store, INVALID_PRODUCT, "invalidPrice", "invalidProductPriceFormat", "400")
}

pub fn valid_product_update(store: &FixtureStore) -> Provided<ProductRequest> {
    branch(store, UPDATE_PRODUCT, "validUpdate", "validProductUpdateData", "200 echoing the update")
}

pub fn invalid_product_update(store: &FixtureStore) -> Provided<String> {
    raw(store, UPDATE_PRODUCT, "invalidUpdate", "invalidProductUpdateData", "400")
}

pub fn valid_cart(store: &FixtureStore) -> Provided<CartRequest> {
    whole(store, VALID_CART, "validCartData", "200/201 echoing the cart")
}

pub fn invalid_cart_missing_fields(store: &FixtureStore) -> Provided<String> {
    raw(store, INVALID_CART, "missingFields", "invalidCartMissingFields", "400")
}

pub fn invalid_cart_empty_products(store: &FixtureStore) -> Provided<String> {
    raw(store, INVALID_CART, "emptyProducts", "invalidCartEmptyProducts", "400")
}

pub fn invalid_cart_structure(store: &FixtureStore) -> Provided<String> {
    raw(store, INVALID_CART, "invalidStructure", "invalidCartStructure", "400")
}

pub fn valid_cart_update(store: &FixtureStore) -> Provided<CartRequest> {
    branch(store, UPDATE_CART, "validUpdate", "validCartUpdateData", "200 echoing the update")
}

pub fn invalid_cart_update(store: &FixtureStore) -> Provided<String> {
    raw(store, UPDATE_CART, "invalidUpdate", "invalidCartUpdateData", "400")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bundled() -> FixtureStore {
        FixtureStore::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata"))
    }

    #[test]
    fn inline_providers_keep_declared_order() {
        let ids: Vec<i64> = valid_product_ids()
            .unwrap()
            .into_iter()
            .map(|s| s.input)
            .collect();
        assert_eq!(ids, [1, 5, 10]);
        let labels: Vec<String> = invalid_cart_ids()
            .unwrap()
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, ["xyz", "abc123", "!@#"]);
    }

    #[test]
    fn bundled_fixtures_all_load() {
        let store = bundled();
        assert!(!valid_credentials(&store).unwrap().scenarios()[0].input.username.is_empty());
        invalid_username(&store).unwrap();
        invalid_password(&store).unwrap();
        empty_credentials(&store).unwrap();
        sql_injection_credentials(&store).unwrap();
        failed_login_credentials(&store).unwrap();
        valid_product(&store).unwrap();
        invalid_product_missing_fields(&store).unwrap();
        invalid_product_price(&store).unwrap();
        valid_product_update(&store).unwrap();
        invalid_product_update(&store).unwrap();
        valid_cart(&store).unwrap();
        invalid_cart_missing_fields(&store).unwrap();
        invalid_cart_empty_products(&store).unwrap();
        invalid_cart_structure(&store).unwrap();
        valid_cart_update(&store).unwrap();
        invalid_cart_update(&store).unwrap();
    }

    #[test]
    fn malformed_json_branch_is_sent_verbatim() {
        let binding = malformed_login_json(&bundled()).unwrap();
        let body = &binding.scenarios()[0].input;
        assert!(serde_json::from_str::<serde_json::Value>(body).is_err());
    }

    #[test]
    fn multiple_invalid_credentials_are_labeled() {
        let dataset = multiple_invalid_credentials(&bundled()).unwrap();
        let labels: Vec<&str> = dataset.scenarios().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Invalid username", "Invalid password", "Empty credentials"]);
        assert_eq!(dataset.scenarios()[2].input.username, "");
    }

    #[test]
    fn missing_fixture_root_is_an_error_not_an_empty_dataset() {
        let store = FixtureStore::new("/definitely/not/here");
        assert!(matches!(valid_cart(&store), Err(FixtureError::Read { .. })));
    }
}
