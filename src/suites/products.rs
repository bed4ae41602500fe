//! TC-PROD: the `/products` resource.

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use reqwest::StatusCode;
use tracing::{info, warn};

use super::{CaseContext, TestCase, datasets, method};
use crate::models::{Product, ProductRequest};
use crate::testing::assertions::{
    array_len, array_not_empty, body_not_empty, decoded, each_has_fields, ensure, equals,
    error_response, field_equals, field_exists, is_array, status_code, status_in,
};
use crate::testing::{Access, ScenarioResult};

const GROUP: &str = "products";

const PRODUCT_FIELDS: &[&str] = &["id", "title", "price", "description", "category", "image"];
const UPDATED_PRODUCT_ID: i64 = 7;
const MALFORMED_UPDATE_PRODUCT_ID: i64 = 1;
const DELETED_PRODUCT_ID: i64 = 6;
const NON_EXISTENT_PRODUCT_ID: i64 = 99999;

const MISSING: &[StatusCode] = &[StatusCode::BAD_REQUEST, StatusCode::NOT_FOUND];
const CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];

pub fn cases() -> Vec<TestCase> {
    use Access::{Mutating, ReadOnly};
    vec![
        TestCase::new(
            method("TC-PROD-001", GROUP, "Verify getting all products successfully", ReadOnly),
            get_all,
        ),
        TestCase::new(
            method("TC-PROD-002", GROUP, "Verify getting all products with limit parameter", ReadOnly),
            get_with_limit,
        ),
        TestCase::new(
            method(
                "TC-PROD-003",
                GROUP,
                "Verify getting all products with invalid limit parameter",
                ReadOnly,
            ),
            get_with_invalid_limit,
        ),
        TestCase::new(
            method("TC-PROD-004", GROUP, "Verify getting single product by valid ID", ReadOnly),
            get_by_valid_id,
        ),
        TestCase::new(
            method(
                "TC-PROD-005",
                GROUP,
                "Verify getting single product with non-existent ID",
                ReadOnly,
            ),
            get_by_non_existent_id,
        ),
        TestCase::new(
            method(
                "TC-PROD-006",
                GROUP,
                "Verify getting single product with invalid ID format",
                ReadOnly,
            ),
            get_by_invalid_id,
        ),
        TestCase::new(
            method("TC-PROD-007", GROUP, "Verify adding new product with valid data", Mutating),
            create_valid,
        ),
        TestCase::new(
            method(
                "TC-PROD-008",
                GROUP,
                "Verify adding new product with missing required fields",
                Mutating,
            ),
            create_missing_fields,
        ),
        TestCase::new(
            method("TC-PROD-009", GROUP, "Verify adding new product with invalid price format", Mutating),
            create_invalid_price,
        ),
        TestCase::new(
            method("TC-PROD-010", GROUP, "Verify updating product with valid data using PUT", Mutating),
            update_valid,
        ),
        TestCase::new(
            method("TC-PROD-011", GROUP, "Verify updating non-existent product using PUT", Mutating),
            update_non_existent,
        ),
        TestCase::new(
            method(
                "TC-PROD-012",
                GROUP,
                "Verify updating product with invalid data format using PUT",
                Mutating,
            ),
            update_invalid,
        ),
        TestCase::new(
            method("TC-PROD-013", GROUP, "Verify deleting product with valid ID", Mutating),
            delete_valid,
        ),
        TestCase::new(
            method("TC-PROD-014", GROUP, "Verify deleting product with non-existent ID", Mutating),
            delete_non_existent,
        ),
        TestCase::new(
            method("TC-PROD-015", GROUP, "Verify deleting product with invalid ID format", Mutating),
            delete_invalid_id,
        ),
    ]
}

/// Title, price, description, image and category must come back unchanged.
fn echoes(product: &Product, request: &ProductRequest) -> ScenarioResult {
    equals("Title", product.title.as_deref(), Some(request.title.as_str()))?;
    equals("Price", product.price, Some(request.price))?;
    equals("Description", product.description.as_deref(), Some(request.description.as_str()))?;
    equals("Image", product.image.as_deref(), Some(request.image.as_str()))?;
    equals("Category", product.category.as_deref(), Some(request.category.as_str()))?;
    Ok(())
}

// ─── GET ──────────────────────────────────────────────────────────────────────

fn get_all<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::unparameterized("all", "200 with products"), move |()| verify_get_all(cx))
        .boxed_local()
}

async fn verify_get_all(cx: &CaseContext<'_>) -> ScenarioResult {
    let response = cx.services.products.get_all().await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    is_array(&response)?;
    array_not_empty(&response)?;
    each_has_fields(&response, PRODUCT_FIELDS)?;
    info!("successfully validated all products");
    Ok(())
}

fn get_with_limit<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::product_limits(), move |limit| verify_limit(cx, limit))
        .boxed_local()
}

async fn verify_limit(cx: &CaseContext<'_>, limit: i64) -> ScenarioResult {
    let response = cx.services.products.get_all_with_limit(limit).await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    is_array(&response)?;
    array_len(&response, usize::try_from(limit).unwrap_or_default())?;
    each_has_fields(&response, &["id", "title"])?;
    Ok(())
}

fn get_with_invalid_limit<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_product_limits(), move |limit| verify_invalid_limit(cx, limit))
        .boxed_local()
}

async fn verify_invalid_limit(cx: &CaseContext<'_>, limit: i64) -> ScenarioResult {
    let response = cx.services.products.get_all_with_limit(limit).await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

fn get_by_valid_id<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_product_ids(), move |id| verify_get_by_id(cx, id))
        .boxed_local()
}

async fn verify_get_by_id(cx: &CaseContext<'_>, id: i64) -> ScenarioResult {
    let response = cx.services.products.get_by_id(id).await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    field_equals(&response, "id", id)?;
    for field in ["title", "price", "description", "category", "image", "rating"] {
        field_exists(&response, field)?;
    }
    info!(id, "successfully validated product");
    Ok(())
}

fn get_by_non_existent_id<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::non_existent_product_ids(), move |id| verify_get_missing(cx, id))
        .boxed_local()
}

async fn verify_get_missing(cx: &CaseContext<'_>, id: i64) -> ScenarioResult {
    let response = cx.services.products.get_by_id(id).await?;
    status_in(&response, MISSING)?;
    let body = response.body();
    ensure(
        body.is_empty() || body.contains("error") || body == "null",
        "Response should contain error message or null value",
    )?;
    Ok(())
}

fn get_by_invalid_id<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_product_ids(), move |id| verify_get_invalid(cx, id))
        .boxed_local()
}

async fn verify_get_invalid(cx: &CaseContext<'_>, id: &str) -> ScenarioResult {
    let response = cx.services.products.get_by_id(id).await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

// ─── POST ─────────────────────────────────────────────────────────────────────

fn create_valid<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_product(cx.fixtures), move |request| verify_create(cx, request))
        .boxed_local()
}

async fn verify_create(cx: &CaseContext<'_>, request: ProductRequest) -> ScenarioResult {
    let response = cx.services.products.create(&request).await?;
    status_in(&response, CREATED)?;
    body_not_empty(&response)?;
    let created: Product = decoded(&response)?;
    ensure(created.id.is_some(), "Created product should have an ID!")?;
    echoes(&created, &request)?;
    info!(id = created.id, "product created");
    Ok(())
}

fn create_missing_fields<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_product_missing_fields(cx.fixtures), move |json| {
        verify_create_rejected(cx, json)
    })
    .boxed_local()
}

fn create_invalid_price<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_product_price(cx.fixtures), move |json| {
        verify_create_rejected(cx, json)
    })
    .boxed_local()
}

async fn verify_create_rejected(cx: &CaseContext<'_>, json: String) -> ScenarioResult {
    let response = cx.services.products.create_raw(&json).await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

// ─── PUT ──────────────────────────────────────────────────────────────────────

fn update_valid<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_product_update(cx.fixtures), move |request| {
        verify_update(cx, request)
    })
    .boxed_local()
}

async fn verify_update(cx: &CaseContext<'_>, request: ProductRequest) -> ScenarioResult {
    let response = cx
        .services
        .products
        .update(UPDATED_PRODUCT_ID, &request)
        .await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;
    let updated: Product = decoded(&response)?;
    equals("Product ID", updated.id, Some(UPDATED_PRODUCT_ID))?;
    echoes(&updated, &request)?;
    Ok(())
}

fn update_non_existent<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::valid_product_update(cx.fixtures), move |request| {
        verify_update_missing(cx, request)
    })
    .boxed_local()
}

async fn verify_update_missing(cx: &CaseContext<'_>, request: ProductRequest) -> ScenarioResult {
    let response = cx
        .services
        .products
        .update(NON_EXISTENT_PRODUCT_ID, &request)
        .await?;
    status_in(&response, MISSING)?;
    error_response(&response)?;
    Ok(())
}

fn update_invalid<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_product_update(cx.fixtures), move |json| {
        verify_update_rejected(cx, json)
    })
    .boxed_local()
}

async fn verify_update_rejected(cx: &CaseContext<'_>, json: String) -> ScenarioResult {
    let response = cx
        .services
        .products
        .update_raw(MALFORMED_UPDATE_PRODUCT_ID, &json)
        .await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}

// ─── DELETE ───────────────────────────────────────────────────────────────────

fn delete_valid<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::unparameterized("6", "200, then gone"), move |()| verify_delete(cx))
        .boxed_local()
}

async fn verify_delete(cx: &CaseContext<'_>) -> ScenarioResult {
    let response = cx.services.products.delete(DELETED_PRODUCT_ID).await?;
    status_code(&response, StatusCode::OK)?;
    body_not_empty(&response)?;

    // Informational only: the remote store does not persist deletes.
    let follow_up = cx.services.products.get_by_id(DELETED_PRODUCT_ID).await?;
    if follow_up.status() == StatusCode::NOT_FOUND.as_u16() {
        info!("product {DELETED_PRODUCT_ID} deleted and verified");
    } else {
        warn!(
            status = follow_up.status(),
            "product {DELETED_PRODUCT_ID} still readable after delete"
        );
    }
    Ok(())
}

fn delete_non_existent<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::non_existent_product_ids(), move |id| verify_delete_missing(cx, id))
        .boxed_local()
}

async fn verify_delete_missing(cx: &CaseContext<'_>, id: i64) -> ScenarioResult {
    let response = cx.services.products.delete(id).await?;
    status_in(&response, MISSING)?;
    error_response(&response)?;
    Ok(())
}

fn delete_invalid_id<'a>(cx: &'a CaseContext<'a>) -> LocalBoxFuture<'a, ()> {
    cx.run(datasets::invalid_product_ids(), move |id| verify_delete_invalid(cx, id))
        .boxed_local()
}

async fn verify_delete_invalid(cx: &CaseContext<'_>, id: &str) -> ScenarioResult {
    let response = cx.services.products.delete(id).await?;
    status_code(&response, StatusCode::BAD_REQUEST)?;
    error_response(&response)?;
    Ok(())
}
