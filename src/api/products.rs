use std::cmp::Ordering;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiResult, AppState};
use crate::error::MallError;
use crate::model::{Product, Region};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Popular,
    Name,
}

/// `GET /api/products` 쿼리
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub mall_id: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub q: Option<String>,
    pub tag: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn matches(product: &Product, query: &ProductQuery, region: Option<&str>, needle: Option<&str>) -> bool {
    if let Some(mall_id) = given(&query.mall_id) {
        if product.mall_id() != Some(mall_id) {
            return false;
        }
    }
    if let Some(category) = given(&query.category) {
        if product.category.as_deref().map(str::trim) != Some(category) {
            return false;
        }
    }
    if let Some(region) = region {
        let own = product.region.as_deref().and_then(Region::normalize);
        if own != Some(region) {
            return false;
        }
    }
    if let Some(tag) = given(&query.tag) {
        if !product.has_tag(tag) {
            return false;
        }
    }
    if query.min_price.is_some() || query.max_price.is_some() {
        let Some(price) = product.price_amount() else {
            return false;
        };
        if query.min_price.map_or(false, |min| price < min)
            || query.max_price.map_or(false, |max| price > max)
        {
            return false;
        }
    }
    if let Some(needle) = needle {
        let mut haystack = product.search_text();
        if let Some(mall_name) = product.mall_name.as_deref() {
            haystack.push(' ');
            haystack.push_str(mall_name);
        }
        for tag in &product.tags {
            haystack.push(' ');
            haystack.push_str(tag);
        }
        if !haystack.to_lowercase().contains(needle) {
            return false;
        }
    }
    true
}

/// 가격 없는 상품은 정렬 방향과 상관없이 뒤로
fn by_price(a: Option<u64>, b: Option<u64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_products(products: &mut [&Product], sort: SortOrder) {
    match sort {
        // RFC3339 문자열이라 사전순 비교로 충분하다. 날짜 없는 건 뒤로
        SortOrder::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::PriceAsc => {
            products.sort_by(|a, b| by_price(a.price_amount(), b.price_amount(), false))
        }
        SortOrder::PriceDesc => {
            products.sort_by(|a, b| by_price(a.price_amount(), b.price_amount(), true))
        }
        SortOrder::Popular => products.sort_by(|a, b| b.click_count.cmp(&a.click_count)),
        SortOrder::Name => products.sort_by(|a, b| a.display_name().cmp(&b.display_name())),
    }
}

/// 필터 → 정렬 → 페이지 나누기
pub fn query_products(products: &[Product], query: &ProductQuery) -> ProductPage {
    let region = given(&query.region).and_then(Region::normalize);
    let needle = given(&query.q).map(str::to_lowercase);

    let mut hits: Vec<&Product> = products
        .iter()
        .filter(|p| matches(p, query, region, needle.as_deref()))
        .collect();
    // 모르는 지역명은 아무것도 걸리지 않게
    if given(&query.region).is_some() && region.is_none() {
        hits.clear();
    }
    sort_products(&mut hits, query.sort);

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let page = query.page.unwrap_or(1).max(1);
    let total = hits.len();
    let total_pages = total.div_ceil(limit);

    let products = hits
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .cloned()
        .collect();

    ProductPage {
        products,
        total,
        page,
        limit,
        total_pages,
    }
}

pub(super) async fn list(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ApiResult<ProductPage> {
    let Query(query) = query.map_err(|e| MallError::BadRequest(e.body_text()))?;
    let catalog = state.catalog.read().await;
    Ok(Json(query_products(&catalog.products, &query)))
}

pub(super) async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    let catalog = state.catalog.read().await;
    let product = catalog
        .product(&id)
        .cloned()
        .ok_or_else(|| MallError::NotFound(format!("product {}", id)))?;
    Ok(Json(product))
}
