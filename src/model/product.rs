use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{id_string, Price};

/// products.json 한 건
///
/// 수집기마다 채우는 필드가 달라서 `id` 외에는 모두 선택 항목이다.
/// 모르는 키는 `extra` 에 담아 다시 쓸 때 그대로 보존한다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mall_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mall_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub click_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Product {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// `name`, 없으면 `title`
    pub fn display_name(&self) -> Option<&str> {
        non_empty(&self.name).or_else(|| non_empty(&self.title))
    }

    pub fn price_amount(&self) -> Option<u64> {
        self.price.as_ref().and_then(Price::amount)
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(&self.product_url)
    }

    pub fn mall_id(&self) -> Option<&str> {
        non_empty(&self.mall_id)
    }

    pub fn is_valid(&self) -> bool {
        self.display_name().is_some() && self.url().is_some()
    }

    /// 분류기·검색에 넘기는 텍스트
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(non_empty(&self.name));
        parts.extend(non_empty(&self.title));
        parts.extend(non_empty(&self.description));
        parts.join(" ")
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_record() {
        let json = r#"{
            "id": 1024,
            "title": "  강원 감자 5kg ",
            "price": "15,900원",
            "mallName": "강원더몰",
            "legacyField": {"a": 1}
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id, "1024");
        assert_eq!(product.display_name(), Some("강원 감자 5kg"));
        assert_eq!(product.price_amount(), Some(15900));
        assert_eq!(product.click_count, 0);
        assert!(product.extra.contains_key("legacyField"));
        assert!(!product.is_valid());
    }

    #[test]
    fn test_serialize_keeps_unknown_keys_and_skips_empty() {
        let mut product = Product::new("p1");
        product.name = Some("사과".into());
        product
            .extra
            .insert("legacyField".into(), Value::String("keep".into()));

        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["legacyField"], "keep");
        assert_eq!(value["name"], "사과");
        assert!(value.get("title").is_none());
        assert!(value.get("tags").is_none());
    }

    #[test]
    fn test_display_name_prefers_name() {
        let mut product = Product::new("p1");
        product.name = Some("   ".into());
        product.title = Some("제목".into());
        assert_eq!(product.display_name(), Some("제목"));

        product.name = Some("이름".into());
        assert_eq!(product.display_name(), Some("이름"));
    }
}
