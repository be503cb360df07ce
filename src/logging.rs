//! tracing 구독자 설정
//!
//! `RUST_LOG` 가 있으면 그것을 쓰고, 없으면 `-v` 횟수로 레벨을 정한다.
//! 외부 크레이트(chromiumoxide, hyper 등)는 warn 으로 묶어 둔다.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::MallError;

/// 로그 출력 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    /// 서버 운영용 한 줄 JSON
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
            with_target: false,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// 0 → info, 1 → debug, 2 이상 → trace
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            with_target: verbosity > 0,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    fn filter_directive(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        format!("warn,local_mall_service={level},mallctl={level}")
    }
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter_directive()))
}

/// 전역 구독자를 한 번 설치한다. 두 번째 호출은 Config 에러
pub fn init_logging(config: &LogConfig) -> Result<(), MallError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config))
        .with_target(config.with_target)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Pretty => builder.with_ansi(config.with_ansi).try_init(),
        LogFormat::Compact => builder.compact().with_ansi(config.with_ansi).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| MallError::Config(format!("logging init failed: {}", e)))
}
