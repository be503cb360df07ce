//! products.json / malls.json 데이터 모델

mod mall;
mod price;
mod product;
mod region;

pub use mall::Mall;
pub use price::{parse_price_text, Price};
pub use product::Product;
pub use region::Region;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// ID 가 숫자로 저장된 레코드도 있어서 문자열로 통일해서 읽는다
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {}",
            other
        ))),
    }
}

/// URL 에서 호스트만 (`www.` 제외, 소문자)
pub fn url_host(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_host() {
        assert_eq!(url_host("https://WWW.Jejumall.kr/a?b=1").as_deref(), Some("jejumall.kr"));
        assert_eq!(url_host("not a url"), None);
    }
}
