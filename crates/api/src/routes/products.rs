//! Product catalog handlers.

use axum::{
    Json,
    extract::{RawQuery, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use url::form_urlencoded;

use stockroom_core::{Page, PageRequest, Price, ProductId};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{CategoryAverages, Product, ProductInput};
use crate::services::ServiceError;
use crate::state::AppState;

/// Base path of the product routes.
pub const BASE_PATH: &str = "/api/products";

/// Query parameter carrying the category list for `/by-categories`.
const CATEGORIES_PARAM: &str = "categories";

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeQuery {
    pub min_price: Price,
    pub max_price: Price,
}

#[derive(Debug, Deserialize)]
pub struct QuantityQuery {
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuantityQuery {
    pub price: Price,
    pub quantity: i32,
}

/// `page` is zero-based; both fields fall back to the first page of ten.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

const fn default_page_size() -> u32 {
    PageRequest::DEFAULT_SIZE
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

/// `GET /api/products`
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().get_all_products().await?))
}

/// `GET /api/products/{id}`
///
/// # Errors
///
/// Returns 404 if the product does not exist; 400 for a non-numeric id.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.products().get_product_by_id(id).await?))
}

/// `POST /api/products` - 201 with a `Location` header.
///
/// # Errors
///
/// Returns 400 for an invalid payload; 409 if the name is taken; 415 without a JSON content type.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<impl IntoResponse> {
    let product = state.products().create_product(input).await?;
    let location = format!("{BASE_PATH}/{}", product.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(product),
    ))
}

/// `PUT /api/products/{id}`
///
/// # Errors
///
/// Returns 404 if the product does not exist; 400 for an invalid payload; 409 if the name belongs to another product.
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(state.products().update_product(id, input).await?))
}

/// `DELETE /api/products/{id}` - 204.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    state.products().delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/products/exists?name=`
///
/// # Errors
///
/// Returns 400 without a `name` parameter.
pub async fn exists(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NameQuery>,
) -> Result<Json<bool>> {
    Ok(Json(state.products().product_exists(&query.name).await?))
}

/// `GET /api/products/count?category=`
///
/// # Errors
///
/// Returns 400 without a `category` parameter.
pub async fn count(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> Result<Json<u64>> {
    Ok(Json(
        state
            .products()
            .count_products_by_category(&query.category)
            .await?,
    ))
}

/// `GET /api/products/active?category=`
///
/// # Errors
///
/// Returns 400 without a `category` parameter.
pub async fn active(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        state
            .products()
            .get_active_products_by_category(&query.category)
            .await?,
    ))
}

/// `GET /api/products/price-range?minPrice=&maxPrice=`
///
/// # Errors
///
/// Returns 400 if either bound is missing or not a storable price, or `minPrice > maxPrice`.
pub async fn price_range(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PriceRangeQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        state
            .products()
            .get_products_by_price_range(query.min_price, query.max_price)
            .await?,
    ))
}

/// `GET /api/products/top-expensive`
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn top_expensive(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        state.products().get_top3_most_expensive_products().await?,
    ))
}

/// `PATCH /api/products/{id}/quantity?quantity=` - 200 with an empty body.
///
/// # Errors
///
/// Returns 404 if the product does not exist; 400 for a missing or negative quantity.
pub async fn update_quantity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<QuantityQuery>,
) -> Result<StatusCode> {
    state
        .products()
        .update_product_quantity(id, query.quantity)
        .await?;
    Ok(StatusCode::OK)
}

/// `PATCH /api/products/{id}/price-quantity?price=&quantity=` - 200 with an empty body.
///
/// # Errors
///
/// Returns 404 if the product does not exist; 400 for a bad price or quantity.
pub async fn update_price_quantity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<PriceQuantityQuery>,
) -> Result<StatusCode> {
    state
        .products()
        .update_product_price_and_quantity(id, query.price, query.quantity)
        .await?;
    Ok(StatusCode::OK)
}

/// `GET /api/products/avg-price`
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn average_price(State(state): State<AppState>) -> Result<Json<CategoryAverages>> {
    Ok(Json(state.products().get_average_price_by_category().await?))
}

/// `GET /api/products/by-categories?categories=A,B&categories=C`
///
/// # Errors
///
/// Returns 400 without a `categories` parameter.
pub async fn by_categories(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Product>>> {
    let categories = parse_categories(query.as_deref())?;
    Ok(Json(
        state
            .products()
            .get_products_by_categories(&categories)
            .await?,
    ))
}

/// `GET /api/products/active-paged?page=&size=`
///
/// # Errors
///
/// Returns 400 for a negative page or a size outside `1..=PageRequest::MAX_SIZE`.
pub async fn active_paged(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<Product>>> {
    let request = PageRequest::new(query.page, query.size).map_err(ServiceError::from)?;
    Ok(Json(state.products().get_active_products(request).await?))
}

/// `GET /api/products/added-after?date=YYYY-MM-DD`
///
/// # Errors
///
/// Returns 400 unless `date` is a `YYYY-MM-DD` date.
pub async fn added_after(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        state.products().get_products_added_after(query.date).await?,
    ))
}

/// Collect every `categories` value, splitting comma-separated lists.
///
/// The parameter must appear at least once; its values may be empty.
fn parse_categories(query: Option<&str>) -> Result<Vec<String>> {
    let mut present = false;
    let mut categories = Vec::new();

    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        if key == CATEGORIES_PARAM {
            present = true;
            categories.extend(value.split(',').map(str::to_owned));
        }
    }

    if !present {
        return Err(AppError::BadRequest(format!(
            "Missing required query parameter: {CATEGORIES_PARAM}"
        )));
    }
    Ok(categories)
}
