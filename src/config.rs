use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::MallError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; local-mall-service/0.1; +https://github.com/local-mall-service)";

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub data_dir: PathBuf,
    pub user_agent: String,
    pub headless: bool,
    pub timeout: Duration,
    /// 페이지 사이 대기 시간
    pub page_delay: Duration,
    pub max_retries: u32,
    /// Chrome 실행 파일 (None 이면 PATH 의 chromium)
    pub chrome_path: Option<String>,
    pub debug: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headless: true,
            timeout: Duration::from_secs(30),
            page_delay: Duration::from_millis(800),
            max_retries: 3,
            chrome_path: None,
            debug: false,
        }
    }
}

impl ScraperConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// 환경 변수로 기본값 덮어쓰기
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("MALL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(ua) = std::env::var("MALL_USER_AGENT") {
            config.user_agent = ua;
        }
        config.chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .ok();
        config
    }

    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// API 서버 설정
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    /// None 이면 관리자 로그인 비활성
    pub admin_password: Option<String>,
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("./data"),
            admin_password: None,
            session_ttl: Duration::from_secs(3600),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, MallError> {
        let mut config = Self::default();
        if let Ok(bind) = std::env::var("MALL_BIND") {
            config.bind = bind
                .parse()
                .map_err(|e| MallError::Config(format!("MALL_BIND={}: {}", bind, e)))?;
        }
        if let Ok(dir) = std::env::var("MALL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.admin_password = std::env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());
        if let Ok(ttl) = std::env::var("ADMIN_SESSION_TTL_SECS") {
            let secs: u64 = ttl
                .parse()
                .map_err(|e| MallError::Config(format!("ADMIN_SESSION_TTL_SECS={}: {}", ttl, e)))?;
            config.session_ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into());
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scraper_config_builder() {
        let config = ScraperConfig::new("/tmp/malls")
            .with_headless(false)
            .with_timeout(Duration::from_secs(120))
            .with_max_retries(5);

        assert_eq!(config.data_dir, PathBuf::from("/tmp/malls"));
        assert!(!config.headless);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::default()
            .with_admin_password("secret")
            .with_session_ttl(Duration::from_secs(60));

        assert_eq!(config.admin_password.as_deref(), Some("secret"));
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(config.bind.port(), 3000);
    }
}
