//! `mallctl` 인자 정의

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogFormat;

#[derive(Debug, Parser)]
#[command(
    name = "mallctl",
    version,
    about = "지역 공공 쇼핑몰 상품 수집·정리·API 서버"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// products.json / malls.json / profiles.json 이 있는 디렉토리 (기본: $MALL_DATA_DIR 또는 ./data)
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// 로그 상세도 (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 몰 목록 페이지에서 상품을 수집해 products.json 에 합친다
    Scrape(ScrapeArgs),

    /// products.json 정리 패스 실행
    Repair(RepairArgs),

    /// 카테고리·태그 다시 분류
    Classify(ClassifyArgs),

    /// 카탈로그 통계
    Stats(StatsArgs),

    /// 등록된 몰과 수집 프로필
    Malls,

    /// JSON API 서버
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// 수집할 몰 ID (여러 번 지정 가능)
    #[arg(long = "mall", value_name = "MALL_ID")]
    pub malls: Vec<String>,

    /// 활성화된 프로필 전부
    #[arg(long, conflicts_with = "malls")]
    pub all: bool,

    /// 저장하지 않고 결과만 출력
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// 브라우저 창을 띄운다 (browser 렌더 프로필)
    #[arg(long = "no-headless")]
    pub no_headless: bool,

    /// 스크린샷 등 디버그 출력
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Args)]
pub struct RepairArgs {
    /// 실행할 패스 (생략하면 전부)
    #[arg(long = "pass", value_name = "NAME")]
    pub passes: Vec<String>,

    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// 이미 있는 카테고리도 다시 분류
    #[arg(long = "overwrite-categories")]
    pub overwrite_categories: bool,

    /// 패스 이름 목록만 출력
    #[arg(long = "list")]
    pub list: bool,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// 기존 카테고리도 덮어쓰기
    #[arg(long)]
    pub overwrite: bool,

    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// JSON 으로 출력
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// 바인드 주소 (기본: $MALL_BIND 또는 127.0.0.1:3000)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scrape() {
        let cli = Cli::parse_from([
            "mallctl", "-vv", "--data-dir", "/tmp/d", "scrape", "--mall", "gw", "--mall", "jj",
            "--dry-run",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/d")));
        match cli.command {
            Command::Scrape(args) => {
                assert_eq!(args.malls, vec!["gw", "jj"]);
                assert!(args.dry_run);
                assert!(!args.all);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_all_conflicts_with_mall() {
        let parsed = Cli::try_parse_from(["mallctl", "scrape", "--all", "--mall", "gw"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_serve_and_log_format() {
        let cli = Cli::parse_from([
            "mallctl", "serve", "--bind", "0.0.0.0:8080", "--log-format", "json",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Command::Serve(args) => assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap())),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
