//! 카탈로그 통계 (필드 누락 현황 포함)

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Mall, Product};

const UNKNOWN: &str = "(없음)";

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissingFields {
    pub name: usize,
    pub price: usize,
    pub mall_id: usize,
    pub category: usize,
    pub image: usize,
    pub url: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub products: usize,
    pub malls: usize,
    /// 상품이 하나도 없는 몰
    pub empty_malls: usize,
    pub total_clicks: u64,
    pub by_category: BTreeMap<String, usize>,
    pub by_mall: BTreeMap<String, usize>,
    pub by_region: BTreeMap<String, usize>,
    pub missing: MissingFields,
}

fn bucket(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

pub fn catalog_stats(products: &[Product], malls: &[Mall]) -> CatalogStats {
    let mut stats = CatalogStats {
        products: products.len(),
        malls: malls.len(),
        ..Default::default()
    };

    for p in products {
        *stats.by_category.entry(bucket(p.category.as_deref())).or_default() += 1;
        *stats.by_mall.entry(bucket(p.mall_id())).or_default() += 1;
        *stats.by_region.entry(bucket(p.region.as_deref())).or_default() += 1;
        stats.total_clicks += p.click_count;

        let missing = &mut stats.missing;
        missing.name += usize::from(p.display_name().is_none());
        missing.price += usize::from(p.price_amount().is_none());
        missing.mall_id += usize::from(p.mall_id().is_none());
        missing.category += usize::from(p.category.as_deref().map_or(true, |c| c.trim().is_empty()));
        missing.image += usize::from(p.image_url.as_deref().map_or(true, |u| u.trim().is_empty()));
        missing.url += usize::from(p.url().is_none());
    }

    stats.empty_malls = malls
        .iter()
        .filter(|m| !stats.by_mall.contains_key(&m.id))
        .count();
    stats.total_clicks += malls.iter().map(|m| m.click_count).sum::<u64>();
    stats
}
