//! JSON HTTP API
//!
//! - `GET  /api/products`, `GET /api/products/:id`
//! - `GET  /api/malls`, `GET /api/malls/:id`
//! - `POST /api/track-click`
//! - `POST /api/admin/login`, `POST /api/admin/repair`, `GET /api/admin/stats`

mod admin;
mod auth;
mod clicks;
mod malls;
mod products;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::MallError;
use crate::store::{Catalog, JsonStore};

pub use auth::SessionStore;
pub use products::{query_products, ProductPage, ProductQuery, SortOrder};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RwLock<Catalog>>,
    pub store: JsonStore,
    pub sessions: Arc<Mutex<SessionStore>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: JsonStore, catalog: Catalog) -> Self {
        let sessions = SessionStore::new(config.session_ttl);
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            store,
            sessions: Arc::new(Mutex::new(sessions)),
            config: Arc::new(config),
        }
    }

    /// data_dir 의 JSON 파일을 읽어서 상태를 만든다
    pub fn load(config: ServerConfig) -> Result<Self, MallError> {
        let store = JsonStore::new(config.data_dir.clone()).with_backup(true);
        let catalog = store.load_catalog()?;
        info!(
            "Loaded {} products and {} malls from {:?}",
            catalog.products.len(),
            catalog.malls.len(),
            store.data_dir()
        );
        Ok(Self::new(config, store, catalog))
    }
}

/// 카탈로그 사본을 블로킹 스레드에서 파일에 쓰고 돌려준다.
/// 호출한 쪽은 성공했을 때만 메모리 상태를 바꾼다.
pub(crate) async fn persist(
    store: &JsonStore,
    catalog: Catalog,
    products: bool,
    malls: bool,
) -> Result<Catalog, MallError> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || {
        if malls {
            store.save_malls(&catalog.malls)?;
        }
        if products {
            store.save_products(&catalog.products)?;
        }
        Ok(catalog)
    })
    .await
    .map_err(|e| MallError::FileIO(std::io::Error::other(e.to_string())))?
}

/// 핸들러 에러 → `{ "error": ... }`
pub struct ApiError(MallError);

impl From<MallError> for ApiError {
    fn from(err: MallError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MallError::NotFound(_) => StatusCode::NOT_FOUND,
            MallError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MallError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("API error: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/products", get(products::list))
        .route("/api/products/:id", get(products::detail))
        .route("/api/malls", get(malls::list))
        .route("/api/malls/:id", get(malls::detail))
        .route("/api/track-click", post(clicks::track_click))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/repair", post(admin::repair))
        .route("/api/admin/stats", get(admin::stats))
        .with_state(state)
}

/// Ctrl-C 까지 서버를 돌린다
pub async fn serve(config: ServerConfig) -> Result<(), MallError> {
    let bind = config.bind;
    if config.admin_password.is_none() {
        info!("ADMIN_PASSWORD not set, admin login is disabled");
    }
    let state = AppState::load(config)?;
    let app = router(state);

    let listener = TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::model::{Mall, Price, Product};

    pub fn sample_catalog() -> Catalog {
        let mk = |id: &str, name: &str, mall: &str, category: &str, price: u64, created: &str| {
            let mut p = Product::new(id);
            p.name = Some(name.into());
            p.mall_id = Some(mall.into());
            p.category = Some(category.into());
            p.price = Some(Price::Amount(price));
            p.product_url = Some(format!("https://{}.kr/{}", mall, id));
            p.created_at = Some(created.into());
            p
        };
        let mut products = vec![
            mk("gw-1", "횡성 한우 등심", "gw", "축산물", 59000, "2024-03-01T00:00:00Z"),
            mk("gw-2", "강원 감자 5kg", "gw", "농산물", 15900, "2024-03-03T00:00:00Z"),
            mk("jj-1", "제주 한라봉 3kg", "jj", "농산물", 19900, "2024-03-02T00:00:00Z"),
            mk("jj-2", "제주 옥돔", "jj", "수산물", 45000, "2024-02-01T00:00:00Z"),
        ];
        products[0].region = Some("강원".into());
        products[1].region = Some("강원".into());
        products[1].tags = vec!["국내산".into()];
        products[2].region = Some("제주".into());
        products[2].click_count = 10;
        products[3].region = Some("제주".into());

        let mut jeju = Mall::new("jj", "제주몰").with_region("제주");
        jeju.featured = true;
        let malls = vec![Mall::new("gw", "강원더몰").with_region("강원"), jeju];
        Catalog::new(products, malls)
    }

    pub fn test_state(dir: &std::path::Path) -> AppState {
        let config = ServerConfig::default()
            .with_data_dir(dir)
            .with_admin_password("s3cret");
        let store = JsonStore::new(dir);
        AppState::new(config, store, sample_catalog())
    }

    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
