use std::collections::HashMap;
use std::time::Duration;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MallError;

/// 관리자 세션 토큰 (메모리 보관, 재시작하면 사라진다)
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    tokens: HashMap<String, DateTime<Utc>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: HashMap::new(),
        }
    }

    /// 새 토큰과 만료 시각
    pub fn issue(&mut self, now: DateTime<Utc>) -> (String, DateTime<Utc>) {
        self.purge(now);
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::hours(1));
        let expires_at = now + ttl;
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), expires_at);
        (token, expires_at)
    }

    pub fn is_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.tokens.get(token).map_or(false, |exp| *exp > now)
    }

    fn purge(&mut self, now: DateTime<Utc>) {
        self.tokens.retain(|_, exp| *exp > now);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// `Authorization: Bearer <token>`
pub(super) fn bearer_token(headers: &HeaderMap) -> Result<&str, MallError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MallError::Unauthorized("missing bearer token".to_string()))
}
