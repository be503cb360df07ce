//! products.json 정리 패스
//!
//! 누락·오류 필드(이름, 가격, 몰 ID, 몰 이름, 카테고리)를 고치던 스크립트들을
//! 이름 붙은 패스로 묶었다. 패스는 정해진 순서대로 돌고, 각각 바꾼 건수를 보고한다.

mod passes;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::MallError;
use crate::model::{Mall, Product};

pub use passes::{
    AssignIds, Categorize, Dedupe, DropInvalid, FillMallNames, FillNames, NormalizePrices,
    ResolveMallIds, TrimText,
};

/// 패스가 참고하는 몰 목록과 옵션
pub struct RepairContext<'a> {
    pub malls: &'a [Mall],
    /// 기존 카테고리도 다시 분류
    pub overwrite_categories: bool,
}

impl<'a> RepairContext<'a> {
    pub fn new(malls: &'a [Mall]) -> Self {
        Self {
            malls,
            overwrite_categories: false,
        }
    }

    pub fn with_overwrite_categories(mut self, overwrite: bool) -> Self {
        self.overwrite_categories = overwrite;
        self
    }
}

pub trait RepairPass: Send + Sync {
    fn name(&self) -> &'static str;

    /// 바꾸거나 지운 상품 수
    fn apply(&self, products: &mut Vec<Product>, ctx: &RepairContext<'_>) -> usize;
}

/// 기본 실행 순서
pub fn default_passes() -> Vec<Box<dyn RepairPass>> {
    vec![
        Box::new(TrimText),
        Box::new(FillNames),
        Box::new(NormalizePrices),
        Box::new(ResolveMallIds),
        Box::new(AssignIds),
        Box::new(FillMallNames),
        Box::new(Categorize),
        Box::new(Dedupe),
        Box::new(DropInvalid),
    ]
}

pub fn pass_names() -> Vec<&'static str> {
    default_passes().iter().map(|p| p.name()).collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub pass: String,
    pub changed: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub before: usize,
    pub after: usize,
    pub passes: Vec<PassReport>,
}

impl RepairReport {
    pub fn total_changed(&self) -> usize {
        self.passes.iter().map(|p| p.changed).sum()
    }

    pub fn changed(&self, pass: &str) -> usize {
        self.passes
            .iter()
            .find(|p| p.pass == pass)
            .map_or(0, |p| p.changed)
    }
}

/// 패스를 실행한다. `only` 가 비어 있으면 전부
///
/// 모르는 패스 이름은 에러. 실행 순서는 항상 기본 순서를 따른다.
pub fn run_passes(
    products: &mut Vec<Product>,
    ctx: &RepairContext<'_>,
    only: &[String],
) -> Result<RepairReport, MallError> {
    let passes = default_passes();
    for name in only {
        if !passes.iter().any(|p| p.name() == name) {
            return Err(MallError::BadRequest(format!(
                "unknown repair pass '{}' (known: {})",
                name,
                pass_names().join(", ")
            )));
        }
    }

    let before = products.len();
    let mut reports = Vec::new();
    for pass in passes
        .iter()
        .filter(|p| only.is_empty() || only.iter().any(|n| n == p.name()))
    {
        let changed = pass.apply(products, ctx);
        debug!("Repair pass {}: {} changed", pass.name(), changed);
        reports.push(PassReport {
            pass: pass.name().to_string(),
            changed,
        });
    }

    let report = RepairReport {
        before,
        after: products.len(),
        passes: reports,
    };
    info!(
        "Repair finished: {} → {} products, {} change(s)",
        report.before,
        report.after,
        report.total_changed()
    );
    Ok(report)
}
