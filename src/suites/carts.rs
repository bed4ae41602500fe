//! TC-CART: the `/carts` resource, including per-user lookups.

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use reqwest::StatusCode;
use tracing::info;

use super::{CaseContext, TestCase, datasets, method};
use crate::models::{Cart, CartRequest};
use crate::testing::assertions::{
    AssertionFailure, body_not_empty, decoded, each_has_fields, ensure, equals, error_response,
    field_equals, field_exists, is_array, status_code, status_in,
};
use crate::testing::{Access, ScenarioResult};

const GROUP: &str = "carts";

const CART_FIELDS: &[&str] = &["id", "userId", "date", "products"];
const UPDATED_CART_ID: i64 = 7;
const MALFORMED_UPDATE_CART_ID: i64 = 1;
const DELETED_CART_ID: i64 = 6;
const NON_EXISTENT_CART_ID: i64 = 99999;

const MISSING: &[StatusCode] = &[StatusCode::BAD_REQUEST, StatusCode::NOT_FOUND];
const CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];

pub fn cases() -> Vec<TestCase> {
    use Access::{Mutating, ReadOnly};
    vec![
        TestCase::new(
            method("TC-CART-001", GROUP, "Verify getting all carts successfully", ReadOnly),
            get_all,
        ),
        TestCase::new(
            method("TC-CART-002", GROUP, "Verify getting single cart by valid ID", ReadOnly),
            get_by_valid_id,
        ),
        TestCase::new(
            method("TC-CART-003", GROUP, "Verify getting single cart with non-existent ID", ReadOnly),
            get_by_non_existent_id,
        ),
        TestCase::new(
            method("TC-CART-004", GROUP, "Verify getting single cart with invalid ID format", ReadOnly),
            get_by_invalid_id,
        ),
        TestCase::new(
            method("TC-CART-005", GROUP, "Verify getting carts for specific user", ReadOnly),
            get_by_user,
        ),
        TestCase::new(
            method("TC-CART-006", GROUP, "Verify getting carts for non-existent user", ReadOnly),
            get_by_non_existent_user,
        ),
        TestCase::new(
            method("TC-CART-007", GROUP, "Verify adding new cart with valid data", Mutating),
            create_valid,
        ),
        TestCase::new(
            method("TC-CART-008", GROUP, "Verify adding cart with missing required fields", Mutating),
            create_missing_fields,
        ),
        TestCase::new(
            method("TC-CART-009", GROUP, "Verify adding cart with empty products array", Mutating),
            create_empty_products,
        ),
        TestCase::new(
            method("TC-CART-010", GROUP, "Verify adding cart with invalid product structure", Mutating),
            create_invalid_structure,
        ),
        TestCase::new(
            method("TC-CART-011", GROUP, "Verify updating cart with valid data using PUT", Mutating),
            update_valid,
        ),
        TestCase::new(
            method("TC-CART-012", GROUP, "Verify updating non-existent cart using PUT", Mutating),
            update_non_existent,
        ),
        TestCase::new(
            method(
                "TC-CART-013",
                GROUP,
                "Verify updating cart with invalid data format using PUT",
                Mutating,
            ),
            update_invalid,
        ),
        TestCase::new(
            method("TC-CART-014", GROUP, "Verify deleting cart with valid ID", Mutating),
            delete_valid,
        ),
        TestCase::new(
            method("TC-CART-015", GROUP, "Verify deleting cart with non-existent ID", Mutating),
            delete_non_existent,
        ),
    ]
}

/// Every line of every cart must name a product and a quantity.
fn lines_are_complete(carts: &[Cart]) -> ScenarioResult {
    for (index, cart) in carts.iter().enumerate() {
        let lines = cart.products.as_deref().unwrap_or_default();
        ensure(!lines.is_empty(), format!("Cart {index} products should not be empty!"))?;
        for line in lines {
            ensure(line.product_id.is_some(), format!("Cart {index}: product ID should not be null!"))?;
            ensure(line.quantity.is_some(), format!("Cart {index}: product quantity should not be null!"))?;
        }
    }
    Ok(())
}

// ─── GET ──────────────────────────────────────────────────────────────────────

fn get_all<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::unparameterized("all", "200 with carts"), move |()| verify_get_all(cx))
        .boxed_local()
}

async fn verify_get_all(cx: &CaseContext<'_>) -> ScenarioResult {
    let response = cx.services.carts.get_all().await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    is_array(&response)?;
    let carts: Vec<Cart> = decoded(&response)?;
    ensure(!carts.is_empty(), "Carts list should not be empty!")?;
    each_has_fields(&response, CART_FIELDS)?;
    lines_are_complete(&carts)?;
    info!(carts = carts.len(), "successfully validated all carts");
    Ok(())
}

fn get_by_valid_id<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_cart_ids(), move |id| verify_get_by_id(cx, id))
        .boxed_local()
}

async fn verify_get_by_id(cx: &CaseContext<'_>, id: i64) -> ScenarioResult {
    let response = cx.services.carts.get_by_id(id).await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    field_equals(&response, "id", id)?;
    for field in ["userId", "date", "products"] {
        field_exists(&response, field)?;
    }
    Ok(())
}

fn get_by_non_existent_id<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::non_existent_cart_ids(), move |id| verify_get_missing(cx, id))
        .boxed_local()
}

async fn verify_get_missing(cx: &CaseContext<'_>, id: i64) -> ScenarioResult {
    let response = cx.services.carts.get_by_id(id).await?;
    status_in(&response, MISSING)?;
    error_response(&response)?;
    Ok(())
}

fn get_by_invalid_id<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_cart_ids(), move |id| verify_get_invalid(cx, id))
        .boxed_local()
}

async fn verify_get_invalid(cx: &CaseContext<'_>, id: &str) -> ScenarioResult {
    let response = cx.services.carts.get_by_id(id).await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

fn get_by_user<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_user_ids(), move |user_id| verify_user_carts(cx, user_id))
        .boxed_local()
}

async fn verify_user_carts(cx: &CaseContext<'_>, user_id: i64) -> ScenarioResult {
    let response = cx.services.carts.get_by_user(user_id).await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    is_array(&response)?;
    let carts: Vec<Cart> = decoded(&response)?;
    for cart in &carts {
        equals("Cart user ID", cart.user_id, Some(user_id))?;
        ensure(cart.id.is_some(), "Cart ID should not be null!")?;
        ensure(cart.date.is_some(), "Cart date should not be null!")?;
        ensure(cart.products.is_some(), "Cart products should not be null!")?;
    }
    info!(user_id, carts = carts.len(), "user carts validated");
    Ok(())
}

fn get_by_non_existent_user<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::non_existent_user_ids(), move |user_id| {
        verify_unknown_user(cx, user_id)
    })
    .boxed_local()
}

/// Either an empty list or a 400/404 error is acceptable.
async fn verify_unknown_user(cx: &CaseContext<'_>, user_id: i64) -> ScenarioResult {
    let response = cx.services.carts.get_by_user(user_id).await?;
    if response.status() == StatusCode::OK.as_u16() {
        let carts: Vec<Cart> = decoded(&response)?;
        if !carts.is_empty() {
            return Err(AssertionFailure::mismatch(
                "Carts list should be empty for non-existent user!",
                0,
                carts.len(),
            )
            .into());
        }
        info!(user_id, "non-existent user returned an empty list");
    } else {
        status_in(&response, MISSING)?;
        error_response(&response)?;
    }
    Ok(())
}

// ─── POST ─────────────────────────────────────────────────────────────────────

fn create_valid<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_cart(cx.fixtures), move |request| verify_create(cx, request))
        .boxed_local()
}

async fn verify_create(cx: &CaseContext<'_>, request: CartRequest) -> ScenarioResult {
    let response = cx.services.carts.create(&request).await?;
    status_in(&response, CREATED)?;
    body_not_empty(&response)?;
    let created: Cart = decoded(&response)?;
    ensure(created.id.is_some(), "Created cart should have an ID!")?;
    equals("User ID", created.user_id, Some(request.user_id))?;
    let lines = created.products.as_ref().map(Vec::len);
    ensure(lines.is_some(), "Cart products should not be null!")?;
    equals("Products count", lines, Some(request.products.len()))?;
    info!(id = created.id, "cart created");
    Ok(())
}

fn create_missing_fields<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_cart_missing_fields(cx.fixtures), move |json| {
        verify_create_rejected(cx, json)
    })
    .boxed_local()
}

fn create_empty_products<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_cart_empty_products(cx.fixtures), move |json| {
        verify_create_rejected(cx, json)
    })
    .boxed_local()
}

fn create_invalid_structure<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_cart_structure(cx.fixtures), move |json| {
        verify_create_rejected(cx, json)
    })
    .boxed_local()
}

async fn verify_create_rejected(cx: &CaseContext<'_>, json: String) -> ScenarioResult {
    let response = cx.services.carts.create_raw(&json).await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

// ─── PUT ──────────────────────────────────────────────────────────────────────

fn update_valid<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_cart_update(cx.fixtures), move |request| {
        verify_update(cx, request)
    })
    .boxed_local()
}

async fn verify_update(cx: &CaseContext<'_>, request: CartRequest) -> ScenarioResult {
    let response = cx.services.carts.update(UPDATED_CART_ID, &request).await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    let updated: Cart = decoded(&response)?;
    equals("Cart ID", updated.id, Some(UPDATED_CART_ID))?;
    equals("User ID", updated.user_id, Some(request.user_id))?;
    ensure(updated.products.is_some(), "Updated cart products should not be null!")?;
    Ok(())
}

fn update_non_existent<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_cart_update(cx.fixtures), move |request| {
        verify_update_missing(cx, request)
    })
    .boxed_local()
}

async fn verify_update_missing(cx: &CaseContext<'_>, request: CartRequest) -> ScenarioResult {
    let response = cx
        .services
        .carts
        .update(NON_EXISTENT_CART_ID, &request)
        .await?;
    status_in(&response, MISSING)?;
    error_response(&response)?;
    Ok(())
}

fn update_invalid<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_cart_update(cx.fixtures), move |json| {
        verify_update_rejected(cx, json)
    })
    .boxed_local()
}

async fn verify_update_rejected(cx: &CaseContext<'_>, json: String) -> ScenarioResult {
    let response = cx
        .services
        .carts
        .update_raw(MALFORMED_UPDATE_CART_ID, &json)
        .await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

// ─── DELETE ───────────────────────────────────────────────────────────────────

fn delete_valid<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::unparameterized("6", "200 with the deleted cart"), move |()| {
        verify_delete(cx)
    })
    .boxed_local()
}

async fn verify_delete(cx: &CaseContext<'_>) -> ScenarioResult {
    let response = cx.services.carts.delete(DELETED_CART_ID).await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    info!("cart {DELETED_CART_ID} deleted");
    Ok(())
}

fn delete_non_existent<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::non_existent_cart_ids(), move |id| verify_delete_missing(cx, id))
        .boxed_local()
}

async fn verify_delete_missing(cx: &CaseContext<'_>, id: i64) -> ScenarioResult {
    let response = cx.services.carts.delete(id).await?;
    status_in(&response, MISSING)?;
    error_response(&response)?;
    Ok(())
}
