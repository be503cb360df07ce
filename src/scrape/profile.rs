//! 몰별 수집 설정 (profiles.json)

use serde::{Deserialize, Serialize};

use crate::error::MallError;

/// 쇼핑몰 솔루션. 지자체 몰 대부분이 이 중 하나로 만들어져 있다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Godomall,
    Cafe24,
    Firstmall,
    #[default]
    Custom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// 정적 HTML (reqwest)
    #[default]
    Static,
    /// 자바스크립트로 목록을 그리는 몰 (headless Chrome)
    Browser,
}

/// 프리셋 위에 덮어쓸 셀렉터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MallProfile {
    pub mall_id: String,
    /// `{page}` 자리에 페이지 번호가 들어간다
    pub list_url: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub selectors: SelectorOverrides,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub render: RenderMode,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_max_pages() -> u32 {
    5
}

fn default_enabled() -> bool {
    true
}

impl MallProfile {
    pub fn new(mall_id: impl Into<String>, list_url: impl Into<String>) -> Self {
        Self {
            mall_id: mall_id.into(),
            list_url: list_url.into(),
            platform: Platform::Custom,
            selectors: SelectorOverrides::default(),
            max_pages: default_max_pages(),
            render: RenderMode::Static,
            enabled: true,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_selectors(mut self, selectors: SelectorOverrides) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.list_url.contains("{page}")
    }

    pub fn page_url(&self, page: u32) -> String {
        self.list_url.replace("{page}", &page.to_string())
    }

    /// 실제로 가져올 페이지 수
    pub fn page_count(&self) -> u32 {
        if self.is_paginated() {
            self.max_pages.max(1)
        } else {
            1
        }
    }
}

/// 프리셋과 덮어쓰기를 합친 최종 셀렉터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub item: String,
    pub name: String,
    pub price: String,
    pub original_price: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}

struct Preset {
    item: &'static str,
    name: &'static str,
    price: &'static str,
    original_price: Option<&'static str>,
    image: &'static str,
    link: &'static str,
}

fn preset(platform: Platform) -> Option<Preset> {
    match platform {
        Platform::Godomall => Some(Preset {
            item: ".item_gallery_type li, .item_list_type li",
            name: ".item_name",
            price: ".item_price",
            original_price: Some(".item_money_box del"),
            image: ".item_photo_box img",
            link: ".item_photo_box a, .item_tit_box a",
        }),
        Platform::Cafe24 => Some(Preset {
            item: "ul.prdList > li",
            name: ".description .name",
            // 스펙 목록에 적립금·배송비도 같이 있다
            price: ".description .xans-product-listitem li[rel='판매가']",
            original_price: Some(".description .xans-product-listitem li[rel='소비자가']"),
            image: ".thumbnail img",
            link: ".thumbnail a, .description .name a",
        }),
        Platform::Firstmall => Some(Preset {
            item: ".goods_list li.gl_item",
            name: ".goods_name",
            price: ".sale_price",
            original_price: Some(".consumer_price"),
            image: ".goods_img img, .gli_image img",
            link: ".goods_img a, .gli_image a, .goods_name a",
        }),
        Platform::Custom => None,
    }
}

impl Selectors {
    pub fn resolve(profile: &MallProfile) -> Result<Self, MallError> {
        let o = &profile.selectors;
        let required = |field: &str, over: &Option<String>, fallback: Option<&'static str>| {
            over.clone()
                .or_else(|| fallback.map(str::to_string))
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    MallError::Config(format!(
                        "{}: '{}' selector is required for platform {:?}",
                        profile.mall_id, field, profile.platform
                    ))
                })
        };

        let p = preset(profile.platform);
        Ok(Self {
            item: required("item", &o.item, p.as_ref().map(|p| p.item))?,
            name: required("name", &o.name, p.as_ref().map(|p| p.name))?,
            price: required("price", &o.price, p.as_ref().map(|p| p.price))?,
            original_price: o
                .original_price
                .clone()
                .or_else(|| p.as_ref().and_then(|p| p.original_price).map(str::to_string)),
            image: o
                .image
                .clone()
                .or_else(|| p.as_ref().map(|p| p.image.to_string())),
            link: o.link.clone().or_else(|| p.as_ref().map(|p| p.link.to_string())),
        })
    }
}
