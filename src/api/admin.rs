use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::auth::bearer_token;
use super::{persist, ApiResult, AppState};
use crate::error::MallError;
use crate::repair::{run_passes, RepairContext, RepairReport};
use crate::stats::{catalog_stats, CatalogStats};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepairOptions {
    /// 비어 있으면 전부
    pub passes: Vec<String>,
    pub overwrite_categories: bool,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairResponse {
    #[serde(flatten)]
    pub report: RepairReport,
    pub saved: bool,
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), MallError> {
    let token = bearer_token(headers)?;
    let sessions = state.sessions.lock().await;
    if sessions.is_valid(token, Utc::now()) {
        Ok(())
    } else {
        Err(MallError::Unauthorized("invalid or expired token".to_string()))
    }
}

/// 길이·내용과 무관하게 같은 시간에 비교한다
fn password_matches(given: &str, expected: &str) -> bool {
    let a = Sha256::digest(given.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(super) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(body) = body.map_err(|e| MallError::BadRequest(e.body_text()))?;
    let Some(expected) = state.config.admin_password.as_deref() else {
        return Err(MallError::Unauthorized("admin login is disabled".to_string()).into());
    };
    if !password_matches(&body.password, expected) {
        warn!("Admin login failed");
        return Err(MallError::Unauthorized("wrong password".to_string()).into());
    }

    let (token, expires_at) = state.sessions.lock().await.issue(Utc::now());
    info!("Admin session issued, expires at {}", rfc3339(expires_at));
    Ok(Json(LoginResponse {
        token,
        expires_at: rfc3339(expires_at),
    }))
}

/// 본문이 없으면 기본 패스 전부
pub(super) async fn repair(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<RepairResponse> {
    authorize(&state, &headers).await?;
    let options: RepairOptions = if body.iter().all(u8::is_ascii_whitespace) {
        RepairOptions::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| MallError::BadRequest(e.to_string()))?
    };

    let mut catalog = state.catalog.write().await;
    let mut products = catalog.products.clone();
    let ctx = RepairContext::new(&catalog.malls)
        .with_overwrite_categories(options.overwrite_categories);
    let report = run_passes(&mut products, &ctx, &options.passes)?;

    let saved = !options.dry_run && report.total_changed() > 0;
    if saved {
        let mut next = catalog.clone();
        next.products = products;
        *catalog = persist(&state.store, next, true, false).await?;
    }
    Ok(Json(RepairResponse { report, saved }))
}

pub(super) async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<CatalogStats> {
    authorize(&state, &headers).await?;
    let catalog = state.catalog.read().await;
    Ok(Json(catalog_stats(&catalog.products, &catalog.malls)))
}
