//! 서브커맨드 실행

use std::path::PathBuf;

use tower::ServiceExt;
use tracing::info;

use crate::api;
use crate::classifier::classify_product;
use crate::cli::{ClassifyArgs, Command, RepairArgs, ScrapeArgs, ServeArgs, StatsArgs};
use crate::config::{ScraperConfig, ServerConfig};
use crate::error::MallError;
use crate::repair::{pass_names, run_passes, RepairContext, RepairReport};
use crate::service::{ScrapeRequest, ScrapeResult, ScraperService};
use crate::stats::{catalog_stats, CatalogStats};
use crate::store::JsonStore;

pub async fn run(command: Command, data_dir: Option<PathBuf>) -> Result<(), MallError> {
    let data_dir = data_dir.unwrap_or_else(|| ScraperConfig::from_env().data_dir);
    match command {
        Command::Scrape(args) => scrape(args, data_dir).await,
        Command::Repair(args) => repair(args, data_dir),
        Command::Classify(args) => classify(args, data_dir),
        Command::Stats(args) => stats(args, data_dir),
        Command::Malls => malls(data_dir),
        Command::Serve(args) => serve(args, data_dir).await,
    }
}

fn store(data_dir: PathBuf) -> JsonStore {
    JsonStore::new(data_dir).with_backup(true)
}

async fn scrape(args: ScrapeArgs, data_dir: PathBuf) -> Result<(), MallError> {
    if !args.all && args.malls.is_empty() {
        return Err(MallError::BadRequest(
            "specify --mall <ID> or --all".to_string(),
        ));
    }
    let config = ScraperConfig::from_env()
        .with_data_dir(data_dir)
        .with_headless(!args.no_headless)
        .with_debug(args.debug);

    let request = if args.all {
        ScrapeRequest::all()
    } else {
        ScrapeRequest::malls(args.malls)
    }
    .with_dry_run(args.dry_run);

    let result = ScraperService::new(config).oneshot(request).await?;
    print_scrape_result(&result);

    let failed = result.failed().count();
    if failed > 0 && failed == result.outcomes.len() {
        return Err(MallError::Navigation(format!("all {} mall(s) failed", failed)));
    }
    Ok(())
}

fn print_scrape_result(result: &ScrapeResult) {
    for outcome in &result.outcomes {
        match &outcome.error {
            None => println!("  {:<20} {:>5} 건", outcome.mall_id, outcome.scraped),
            Some(e) => println!("  {:<20} 실패: {}", outcome.mall_id, e),
        }
    }
    println!(
        "신규 {} / 갱신 {} / 전체 {}{}",
        result.inserted,
        result.updated,
        result.total_products,
        if result.saved { "" } else { " (저장 안 함)" }
    );
}

fn repair(args: RepairArgs, data_dir: PathBuf) -> Result<(), MallError> {
    if args.list {
        for name in pass_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let store = store(data_dir);
    let mut catalog = store.load_catalog()?;
    let ctx = RepairContext::new(&catalog.malls)
        .with_overwrite_categories(args.overwrite_categories);
    let report = run_passes(&mut catalog.products, &ctx, &args.passes)?;
    print_repair_report(&report);

    if args.dry_run {
        println!("dry-run: 저장하지 않음");
    } else if report.total_changed() > 0 {
        store.save_products(&catalog.products)?;
        info!("Saved {:?}", store.products_path());
    }
    Ok(())
}

fn print_repair_report(report: &RepairReport) {
    for pass in &report.passes {
        println!("  {:<18} {:>6}", pass.pass, pass.changed);
    }
    println!("상품 {} → {}", report.before, report.after);
}

fn classify(args: ClassifyArgs, data_dir: PathBuf) -> Result<(), MallError> {
    let store = store(data_dir);
    let mut products = store.load_products()?;
    let changed = products
        .iter_mut()
        .map(|p| classify_product(p, args.overwrite))
        .filter(|changed| *changed)
        .count();
    println!("{} / {} 건 분류 변경", changed, products.len());

    if !args.dry_run && changed > 0 {
        store.save_products(&products)?;
    }
    Ok(())
}

fn stats(args: StatsArgs, data_dir: PathBuf) -> Result<(), MallError> {
    let catalog = store(data_dir).load_catalog()?;
    let stats = catalog_stats(&catalog.products, &catalog.malls);
    if args.json {
        let json = serde_json::to_string_pretty(&stats).map_err(|e| MallError::Json {
            path: PathBuf::from("<stdout>"),
            source: e,
        })?;
        println!("{}", json);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn print_stats(stats: &CatalogStats) {
    println!(
        "상품 {} / 몰 {} (상품 없는 몰 {}) / 클릭 {}",
        stats.products, stats.malls, stats.empty_malls, stats.total_clicks
    );
    println!("[카테고리]");
    for (k, v) in &stats.by_category {
        println!("  {:<12} {:>6}", k, v);
    }
    println!("[지역]");
    for (k, v) in &stats.by_region {
        println!("  {:<12} {:>6}", k, v);
    }
    let m = &stats.missing;
    println!(
        "[누락] 이름 {} / 가격 {} / 몰ID {} / 카테고리 {} / 이미지 {} / URL {}",
        m.name, m.price, m.mall_id, m.category, m.image, m.url
    );
}

fn malls(data_dir: PathBuf) -> Result<(), MallError> {
    let store = store(data_dir);
    let malls = store.load_malls()?;
    let profiles = store.load_profiles()?;

    for mall in &malls {
        let profile = profiles.iter().find(|p| p.mall_id == mall.id);
        let status = match profile {
            Some(p) if p.enabled => format!("{:?}/{:?}", p.platform, p.render).to_lowercase(),
            Some(_) => "disabled".to_string(),
            None => "-".to_string(),
        };
        println!(
            "{:<16} {:<20} {:<6} {}",
            mall.id,
            mall.name,
            mall.region.as_deref().unwrap_or("-"),
            status
        );
    }
    println!("몰 {} / 프로필 {}", malls.len(), profiles.len());
    Ok(())
}

async fn serve(args: ServeArgs, data_dir: PathBuf) -> Result<(), MallError> {
    let mut config = ServerConfig::from_env()?.with_data_dir(data_dir);
    if let Some(bind) = args.bind {
        config = config.with_bind(bind);
    }
    api::serve(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mall, Product};

    #[tokio::test]
    async fn test_repair_and_classify_commands_write_products() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.save_malls(&[Mall::new("gw", "강원더몰")]).unwrap();

        let mut product = Product::new("gw-1");
        product.name = Some("  횡성 한우  ".into());
        product.mall_id = Some("gw".into());
        product.product_url = Some("https://gw.kr/1".into());
        store.save_products(&[product]).unwrap();

        let args = RepairArgs {
            passes: vec!["trim-text".into()],
            dry_run: false,
            overwrite_categories: false,
            list: false,
        };
        run(Command::Repair(args), Some(dir.path().to_path_buf()))
            .await
            .unwrap();
        let saved = store.load_products().unwrap();
        assert_eq!(saved[0].name.as_deref(), Some("횡성 한우"));
        assert_eq!(saved[0].category, None);

        let args = ClassifyArgs {
            overwrite: false,
            dry_run: false,
        };
        run(Command::Classify(args), Some(dir.path().to_path_buf()))
            .await
            .unwrap();
        let saved = store.load_products().unwrap();
        assert_eq!(saved[0].category.as_deref(), Some("축산물"));
    }

    #[tokio::test]
    async fn test_scrape_requires_target() {
        let dir = tempfile::tempdir().unwrap();
        let args = ScrapeArgs {
            malls: vec![],
            all: false,
            dry_run: true,
            no_headless: false,
            debug: false,
        };
        let err = run(Command::Scrape(args), Some(dir.path().to_path_buf()))
            .await
            .unwrap_err();
        assert!(matches!(err, MallError::BadRequest(_)));
    }
}
