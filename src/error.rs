use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MallError {
    #[error("HTTP 요청 실패: {url}: {message}")]
    Http {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("브라우저 초기화 에러: {0}")]
    BrowserInit(String),

    #[error("페이지 이동 에러: {0}")]
    Navigation(String),

    #[error("타임아웃: {0}")]
    Timeout(String),

    #[error("HTML 파싱 에러: {0}")]
    Parse(String),

    #[error("설정 에러: {0}")]
    Config(String),

    #[error("JSON 에러 ({path}): {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("파일 처리 에러: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    #[error("인증 실패: {0}")]
    Unauthorized(String),

    #[error("잘못된 요청: {0}")]
    BadRequest(String),
}

impl MallError {
    /// 재시도할 가치가 있는 일시적 에러인지
    pub fn is_retryable(&self) -> bool {
        match self {
            MallError::Http { status: None, .. } => true,
            MallError::Http {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            MallError::Timeout(_) | MallError::Navigation(_) => true,
            _ => false,
        }
    }

    pub(crate) fn http(url: impl Into<String>, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return MallError::Timeout(format!("{}: {}", url.into(), err));
        }
        MallError::Http {
            url: url.into(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
