use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::{ApiResult, AppState};
use crate::error::MallError;
use crate::model::{Mall, Region};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MallQuery {
    pub region: Option<String>,
    pub featured: Option<bool>,
}

fn mall_region(mall: &Mall) -> Option<&'static str> {
    mall.region
        .as_deref()
        .and_then(Region::normalize)
        .or_else(|| Region::detect(&mall.name).map(Region::label))
}

pub fn filter_malls<'a>(malls: &'a [Mall], query: &MallQuery) -> Vec<&'a Mall> {
    let wanted = query
        .region
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| Region::normalize(r).ok_or(()));

    malls
        .iter()
        .filter(|m| match wanted {
            None => true,
            Some(Ok(region)) => mall_region(m) == Some(region),
            Some(Err(())) => false,
        })
        .filter(|m| query.featured.map_or(true, |f| m.featured == f))
        .collect()
}

pub(super) async fn list(
    State(state): State<AppState>,
    query: Result<Query<MallQuery>, QueryRejection>,
) -> ApiResult<Vec<Mall>> {
    let Query(query) = query.map_err(|e| MallError::BadRequest(e.body_text()))?;
    let catalog = state.catalog.read().await;
    let malls = filter_malls(&catalog.malls, &query)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(malls))
}

pub(super) async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Mall> {
    let catalog = state.catalog.read().await;
    let mall = catalog
        .mall(&id)
        .cloned()
        .ok_or_else(|| MallError::NotFound(format!("mall {}", id)))?;
    Ok(Json(mall))
}
