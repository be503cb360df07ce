use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{persist, ApiResult, AppState};
use crate::error::MallError;
use crate::store::now_timestamp;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackClick {
    #[serde(default, deserialize_with = "crate::model::id_string")]
    pub product_id: String,
    #[serde(default, deserialize_with = "crate::model::id_string")]
    pub mall_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_clicks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mall_clicks: Option<u64>,
}

/// 상품·몰 클릭 수를 올리고 바로 파일에 쓴다
pub(super) async fn track_click(
    State(state): State<AppState>,
    body: Result<Json<TrackClick>, JsonRejection>,
) -> ApiResult<ClickCounts> {
    let Json(body) = body.map_err(|e| MallError::BadRequest(e.body_text()))?;
    let product_id = body.product_id.trim();
    let mall_id = body.mall_id.trim();
    if product_id.is_empty() && mall_id.is_empty() {
        return Err(MallError::BadRequest("productId or mallId is required".to_string()).into());
    }

    let mut catalog = state.catalog.write().await;
    // 둘 다 확인한 뒤에 올린다
    if !product_id.is_empty() && catalog.product(product_id).is_none() {
        return Err(MallError::NotFound(format!("product {}", product_id)).into());
    }
    if !mall_id.is_empty() && catalog.mall(mall_id).is_none() {
        return Err(MallError::NotFound(format!("mall {}", mall_id)).into());
    }

    let mut next = catalog.clone();
    let mut counts = ClickCounts {
        product_clicks: None,
        mall_clicks: None,
    };
    if !product_id.is_empty() {
        if let Some(product) = next.product_mut(product_id) {
            product.click_count += 1;
            product.updated_at = Some(now_timestamp());
            counts.product_clicks = Some(product.click_count);
        }
    }
    if !mall_id.is_empty() {
        if let Some(mall) = next.mall_mut(mall_id) {
            mall.click_count += 1;
            counts.mall_clicks = Some(mall.click_count);
        }
    }

    *catalog = persist(
        &state.store,
        next,
        counts.product_clicks.is_some(),
        counts.mall_clicks.is_some(),
    )
    .await?;
    debug!("Click tracked: product={:?} mall={:?}", product_id, mall_id);
    Ok(Json(counts))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::router;
    use crate::api::test_support::{send, test_state};
    use crate::store::JsonStore;

    #[tokio::test]
    async fn test_track_click_persists() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/track-click",
            Some(json!({ "productId": "jj-1", "mallId": "jj" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["productClicks"], 11);
        assert_eq!(body["mallClicks"], 1);

        let store = JsonStore::new(dir.path());
        let saved = store.load_products().unwrap();
        assert_eq!(saved.iter().find(|p| p.id == "jj-1").unwrap().click_count, 11);
        assert_eq!(store.load_malls().unwrap()[1].click_count, 1);
    }

    #[tokio::test]
    async fn test_track_click_errors() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let (status, body) =
            send(&app, Method::POST, "/api/track-click", Some(json!({})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/track-click",
            Some(json!({ "productId": "gw-1", "mallId": "nope" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // 실패한 요청은 아무것도 쓰지 않는다
        assert!(!dir.path().join("products.json").exists());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_counters() {
        let dir = tempfile::tempdir().unwrap();
        // 데이터 디렉터리 자리에 파일이 있어서 쓰기가 실패한다
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let app = router(test_state(&blocker));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/track-click",
            Some(json!({ "productId": "jj-1", "mallId": "jj" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());

        let (_, body) = send(&app, Method::GET, "/api/products/jj-1", None, None).await;
        assert_eq!(body["clickCount"], 10);
        let (_, body) = send(&app, Method::GET, "/api/malls/jj", None, None).await;
        assert_eq!(body["clickCount"], 0);
    }
}
