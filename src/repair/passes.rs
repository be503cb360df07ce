use std::collections::HashMap;

use super::{RepairContext, RepairPass};
use crate::classifier::classify_product;
use crate::model::{Price, Product, Region};
use crate::scrape::{normalize_ws, product_id};
use crate::store::{mall_by_host, mall_by_name};

/// 공백 정리. 비게 되면 None
fn tidy(field: &mut Option<String>) -> bool {
    let Some(value) = field.as_ref() else {
        return false;
    };
    let cleaned = normalize_ws(value);
    if cleaned.is_empty() {
        *field = None;
        return true;
    }
    if &cleaned != value {
        *field = Some(cleaned);
        return true;
    }
    false
}

pub struct TrimText;

impl RepairPass for TrimText {
    fn name(&self) -> &'static str {
        "trim-text"
    }

    fn apply(&self, products: &mut Vec<Product>, _ctx: &RepairContext<'_>) -> usize {
        products
            .iter_mut()
            .map(|p| {
                let mut changed = false;
                for field in [
                    &mut p.name,
                    &mut p.title,
                    &mut p.mall_name,
                    &mut p.category,
                    &mut p.region,
                    &mut p.product_url,
                    &mut p.image_url,
                ] {
                    changed |= tidy(field);
                }
                changed
            })
            .filter(|changed| *changed)
            .count()
    }
}

pub struct FillNames;

impl FillNames {
    /// `[강원더몰] 사과` → `사과` (괄호 안이 몰 이름일 때만)
    fn strip_mall_prefix(name: &str, product_mall: Option<&str>, ctx: &RepairContext<'_>) -> String {
        let trimmed = name.trim();
        let Some(rest) = trimmed.strip_prefix('[') else {
            return trimmed.to_string();
        };
        let Some(end) = rest.find(']') else {
            return trimmed.to_string();
        };
        let inner = rest[..end].trim();
        let is_mall = product_mall.map_or(false, |m| m.trim() == inner)
            || mall_by_name(ctx.malls, inner).is_some();
        let stripped = rest[end + 1..].trim();
        if is_mall && !stripped.is_empty() {
            stripped.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl RepairPass for FillNames {
    fn name(&self) -> &'static str {
        "fill-names"
    }

    fn apply(&self, products: &mut Vec<Product>, ctx: &RepairContext<'_>) -> usize {
        let mut changed = 0;
        for product in products.iter_mut() {
            let Some(source) = product.display_name().map(str::to_string) else {
                continue;
            };
            let name = Self::strip_mall_prefix(&source, product.mall_name.as_deref(), ctx);
            if product.name.as_deref() != Some(name.as_str()) {
                product.name = Some(name);
                changed += 1;
            }
        }
        changed
    }
}

pub struct NormalizePrices;

impl NormalizePrices {
    fn normalize(price: &mut Option<Price>) -> bool {
        match price {
            Some(p) if p.is_normalized() => false,
            Some(p) => {
                *price = p.amount().map(Price::Amount);
                true
            }
            None => false,
        }
    }
}

impl RepairPass for NormalizePrices {
    fn name(&self) -> &'static str {
        "normalize-prices"
    }

    fn apply(&self, products: &mut Vec<Product>, _ctx: &RepairContext<'_>) -> usize {
        products
            .iter_mut()
            .map(|p| {
                let a = Self::normalize(&mut p.price);
                let b = Self::normalize(&mut p.original_price);
                a || b
            })
            .filter(|changed| *changed)
            .count()
    }
}

/// 비었거나 malls.json 에 없는 mallId 를 몰 이름 → 상품 URL 호스트 순으로 찾아 채운다
pub struct ResolveMallIds;

impl RepairPass for ResolveMallIds {
    fn name(&self) -> &'static str {
        "resolve-mall-ids"
    }

    fn apply(&self, products: &mut Vec<Product>, ctx: &RepairContext<'_>) -> usize {
        let mut changed = 0;
        for product in products.iter_mut() {
            let known = product
                .mall_id()
                .map_or(false, |id| ctx.malls.iter().any(|m| m.id == id));
            if known {
                continue;
            }

            let found = product
                .mall_name
                .as_deref()
                .and_then(|name| mall_by_name(ctx.malls, name))
                .or_else(|| product.url().and_then(|url| mall_by_host(ctx.malls, url)));

            if let Some(mall) = found {
                product.mall_id = Some(mall.id.clone());
                changed += 1;
            }
        }
        changed
    }
}

/// id 가 없는 상품에 `{mallId}-{상품번호}` 를 붙인다
pub struct AssignIds;

impl RepairPass for AssignIds {
    fn name(&self) -> &'static str {
        "assign-ids"
    }

    fn apply(&self, products: &mut Vec<Product>, _ctx: &RepairContext<'_>) -> usize {
        let mut changed = 0;
        for product in products.iter_mut() {
            if !product.id.trim().is_empty() {
                continue;
            }
            let Some(url) = product.url() else {
                continue;
            };
            let mall_id = product.mall_id().unwrap_or("unknown");
            product.id = product_id(mall_id, url);
            changed += 1;
        }
        changed
    }
}

/// mallName / region 을 몰 정보로 채운다
pub struct FillMallNames;

impl RepairPass for FillMallNames {
    fn name(&self) -> &'static str {
        "fill-mall-names"
    }

    fn apply(&self, products: &mut Vec<Product>, ctx: &RepairContext<'_>) -> usize {
        let malls: HashMap<&str, _> = ctx.malls.iter().map(|m| (m.id.as_str(), m)).collect();
        let mut changed = 0;

        for product in products.iter_mut() {
            let Some(mall) = product.mall_id().and_then(|id| malls.get(id)).copied() else {
                continue;
            };

            let mut touched = false;
            if !mall.name.is_empty() && product.mall_name.as_deref() != Some(mall.name.as_str()) {
                product.mall_name = Some(mall.name.clone());
                touched = true;
            }

            let region = mall
                .region
                .as_deref()
                .and_then(Region::normalize)
                .or_else(|| Region::detect(&mall.name).map(Region::label));
            if let Some(region) = region {
                if product.region.as_deref() != Some(region) {
                    product.region = Some(region.to_string());
                    touched = true;
                }
            }

            if touched {
                changed += 1;
            }
        }
        changed
    }
}

pub struct Categorize;

impl RepairPass for Categorize {
    fn name(&self) -> &'static str {
        "categorize"
    }

    fn apply(&self, products: &mut Vec<Product>, ctx: &RepairContext<'_>) -> usize {
        products
            .iter_mut()
            .map(|p| classify_product(p, ctx.overwrite_categories))
            .filter(|changed| *changed)
            .count()
    }
}

/// id, 그다음 상품 URL 기준 중복 제거. 클릭 수가 많은 쪽이 남는다
pub struct Dedupe;

impl Dedupe {
    fn dedupe_by<F>(products: &mut Vec<Product>, key: F) -> usize
    where
        F: Fn(&Product) -> Option<String>,
    {
        let before = products.len();
        let mut kept: Vec<Product> = Vec::with_capacity(before);
        let mut index: HashMap<String, usize> = HashMap::new();

        for product in products.drain(..) {
            let Some(k) = key(&product) else {
                kept.push(product);
                continue;
            };
            match index.get(&k).copied() {
                Some(i) => {
                    if product.click_count > kept[i].click_count {
                        kept[i] = product;
                    }
                }
                None => {
                    index.insert(k, kept.len());
                    kept.push(product);
                }
            }
        }

        *products = kept;
        before - products.len()
    }
}

impl RepairPass for Dedupe {
    fn name(&self) -> &'static str {
        "dedupe"
    }

    fn apply(&self, products: &mut Vec<Product>, _ctx: &RepairContext<'_>) -> usize {
        let by_id = Self::dedupe_by(products, |p| {
            Some(p.id.trim().to_string()).filter(|id| !id.is_empty())
        });
        let by_url = Self::dedupe_by(products, |p| p.url().map(str::to_string));
        by_id + by_url
    }
}

pub struct DropInvalid;

impl RepairPass for DropInvalid {
    fn name(&self) -> &'static str {
        "drop-invalid"
    }

    fn apply(&self, products: &mut Vec<Product>, _ctx: &RepairContext<'_>) -> usize {
        let before = products.len();
        products.retain(|p| p.is_valid() && !p.id.trim().is_empty());
        before - products.len()
    }
}
