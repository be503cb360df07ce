//! products.json / malls.json 읽기·쓰기
//!
//! 파일 전체를 읽고 전체를 다시 쓴다. 프로세스 사이의 잠금은 없고 마지막에 쓴 쪽이 이긴다.
//! 쓰기는 같은 디렉터리의 임시 파일에 쓴 뒤 rename 해서 반쯤 쓰인 파일이 보이지 않게 한다.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::MallError;
use crate::model::{url_host, Mall, Product};
use crate::scrape::MallProfile;

pub const PRODUCTS_FILE: &str = "products.json";
pub const MALLS_FILE: &str = "malls.json";
pub const PROFILES_FILE: &str = "profiles.json";

#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
    backup: bool,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup: false,
        }
    }

    /// 덮어쓰기 전에 `.bak` 사본을 남긴다
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn products_path(&self) -> PathBuf {
        self.data_dir.join(PRODUCTS_FILE)
    }

    pub fn malls_path(&self) -> PathBuf {
        self.data_dir.join(MALLS_FILE)
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join(PROFILES_FILE)
    }

    pub fn load_products(&self) -> Result<Vec<Product>, MallError> {
        read_array(&self.products_path())
    }

    /// 몰 ID 가 겹치면 Config 에러
    pub fn load_malls(&self) -> Result<Vec<Mall>, MallError> {
        let malls: Vec<Mall> = read_array(&self.malls_path())?;
        check_unique_mall_ids(&malls).map_err(|id| {
            MallError::Config(format!(
                "duplicate mall id '{}' in {:?}",
                id,
                self.malls_path()
            ))
        })?;
        Ok(malls)
    }

    pub fn load_profiles(&self) -> Result<Vec<MallProfile>, MallError> {
        read_array(&self.profiles_path())
    }

    pub fn load_catalog(&self) -> Result<Catalog, MallError> {
        Ok(Catalog::new(self.load_products()?, self.load_malls()?))
    }

    pub fn save_products(&self, products: &[Product]) -> Result<(), MallError> {
        self.write_array(&self.products_path(), products)?;
        info!("Saved {} products to {:?}", products.len(), self.products_path());
        Ok(())
    }

    pub fn save_malls(&self, malls: &[Mall]) -> Result<(), MallError> {
        self.write_array(&self.malls_path(), malls)?;
        info!("Saved {} malls to {:?}", malls.len(), self.malls_path());
        Ok(())
    }

    fn write_array<T: Serialize>(&self, path: &Path, items: &[T]) -> Result<(), MallError> {
        fs::create_dir_all(&self.data_dir)?;

        let json = serde_json::to_string_pretty(items).map_err(|source| MallError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        if self.backup && path.exists() {
            let backup = path.with_extension("json.bak");
            fs::copy(path, &backup)?;
            debug!("Backup written to {:?}", backup);
        }

        let tmp = path.with_extension(format!("json.tmp-{}", std::process::id()));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// 처음 겹친 ID 를 Err 로 돌려준다
fn check_unique_mall_ids(malls: &[Mall]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for mall in malls {
        if !seen.insert(mall.id.as_str()) {
            return Err(mall.id.clone());
        }
    }
    Ok(())
}

fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, MallError> {
    if !path.exists() {
        debug!("{:?} not found, starting empty", path);
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|source| MallError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// 병합 결과 건수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
}

/// 수집 결과를 기존 목록에 id 기준으로 합친다
///
/// 수집한 필드는 덮어쓰고, 클릭 수·등록일·카테고리·태그는 기존 값을 유지한다.
pub fn merge_products(existing: &mut Vec<Product>, incoming: Vec<Product>) -> MergeStats {
    let now = now_timestamp();
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.clone(), i))
        .collect();
    let mut stats = MergeStats::default();

    for mut product in incoming {
        match index.get(&product.id).copied() {
            Some(i) => {
                let old = &mut existing[i];
                product.click_count = old.click_count;
                product.created_at = old.created_at.take().or(product.created_at);
                if old.category.is_some() {
                    product.category = old.category.take();
                }
                for tag in old.tags.drain(..) {
                    if !product.has_tag(&tag) {
                        product.tags.push(tag);
                    }
                }
                let mut extra = std::mem::take(&mut old.extra);
                extra.extend(std::mem::take(&mut product.extra));
                product.extra = extra;
                product.updated_at = Some(now.clone());
                *old = product;
                stats.updated += 1;
            }
            None => {
                if product.created_at.is_none() {
                    product.created_at = Some(now.clone());
                }
                product.updated_at = Some(now.clone());
                index.insert(product.id.clone(), existing.len());
                existing.push(product);
                stats.inserted += 1;
            }
        }
    }
    stats
}

/// 서버가 메모리에 들고 있는 상품·몰 목록
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub malls: Vec<Mall>,
}

impl Catalog {
    pub fn new(products: Vec<Product>, malls: Vec<Mall>) -> Self {
        Self { products, malls }
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    pub fn mall(&self, id: &str) -> Option<&Mall> {
        self.malls.iter().find(|m| m.id == id)
    }

    pub fn mall_mut(&mut self, id: &str) -> Option<&mut Mall> {
        self.malls.iter_mut().find(|m| m.id == id)
    }

    /// 이름 정확 일치 → 공백 무시 일치 순
    pub fn mall_by_name(&self, name: &str) -> Option<&Mall> {
        mall_by_name(&self.malls, name)
    }

    pub fn mall_by_host(&self, url: &str) -> Option<&Mall> {
        mall_by_host(&self.malls, url)
    }
}

pub fn mall_by_name<'a>(malls: &'a [Mall], name: &str) -> Option<&'a Mall> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    malls.iter().find(|m| m.name.trim() == name).or_else(|| {
        let squashed = squash(name);
        malls.iter().find(|m| squash(&m.name) == squashed)
    })
}

pub fn mall_by_host<'a>(malls: &'a [Mall], url: &str) -> Option<&'a Mall> {
    let host = url_host(url)?;
    malls.iter().find(|m| {
        m.host()
            .map_or(false, |h| host == h || host.ends_with(&format!(".{}", h)))
    })
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
