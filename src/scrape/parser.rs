//! 목록 페이지 HTML → 상품 후보
//!
//! `scraper::Html` 은 Send 가 아니므로 이 모듈의 함수는 모두 동기 함수로 두고
//! await 사이에 문서를 들고 있지 않는다.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::profile::Selectors;
use crate::error::MallError;

/// 상품 상세 URL 에서 상품 번호로 쓰는 쿼리 키
const PRODUCT_CODE_KEYS: &[&str] = &[
    "goodsNo",
    "goods_no",
    "product_no",
    "it_id",
    "productId",
    "pid",
    "no",
];

/// 이미지 지연 로딩 속성 (src 보다 먼저 본다)
const IMAGE_ATTRS: &[&str] = &["data-src", "data-original", "data-lazy", "src"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedItem {
    pub name: String,
    pub price_text: Option<String>,
    pub original_price_text: Option<String>,
    pub image_url: Option<String>,
    pub product_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub items: Vec<ScrapedItem>,
    /// 이름이나 링크가 없어 건너뛴 항목 수
    pub skipped: usize,
}

struct Compiled {
    item: Selector,
    name: Selector,
    price: Selector,
    original_price: Option<Selector>,
    image: Option<Selector>,
    link: Option<Selector>,
}

fn compile(css: &str) -> Result<Selector, MallError> {
    Selector::parse(css).map_err(|e| MallError::Config(format!("invalid selector '{}': {}", css, e)))
}

fn compile_opt(css: &Option<String>) -> Result<Option<Selector>, MallError> {
    css.as_deref().map(compile).transpose()
}

impl Compiled {
    fn new(selectors: &Selectors) -> Result<Self, MallError> {
        Ok(Self {
            item: compile(&selectors.item)?,
            name: compile(&selectors.name)?,
            price: compile(&selectors.price)?,
            original_price: compile_opt(&selectors.original_price)?,
            image: compile_opt(&selectors.image)?,
            link: compile_opt(&selectors.link)?,
        })
    }
}

/// 공백 정리
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn resolve_url(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') || raw.starts_with("javascript:") || raw.starts_with("data:") {
        return None;
    }
    base.join(raw).ok().map(|u| u.to_string())
}

fn find_link(item: ElementRef<'_>, selector: Option<&Selector>, base: &Url) -> Option<String> {
    if let Some(href) = item.value().attr("href") {
        if let Some(url) = resolve_url(base, href) {
            return Some(url);
        }
    }
    let from_selector = selector.and_then(|sel| {
        item.select(sel)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| resolve_url(base, href))
    });
    from_selector.or_else(|| {
        let any_link = Selector::parse("a[href]").ok()?;
        item.select(&any_link)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| resolve_url(base, href))
    })
}

fn find_image(item: ElementRef<'_>, selector: Option<&Selector>, base: &Url) -> Option<String> {
    let fallback = Selector::parse("img").ok()?;
    let sel = selector.unwrap_or(&fallback);
    item.select(sel).find_map(|img| {
        IMAGE_ATTRS
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .find_map(|src| resolve_url(base, src))
    })
}

/// 목록 HTML 에서 상품 후보를 뽑는다
pub fn parse_listing(html: &str, page_url: &str, selectors: &Selectors) -> Result<ParsedPage, MallError> {
    let base = Url::parse(page_url).map_err(|e| MallError::Parse(format!("{}: {}", page_url, e)))?;
    let compiled = Compiled::new(selectors)?;
    let document = Html::parse_document(html);

    let mut page = ParsedPage::default();
    for item in document.select(&compiled.item) {
        let name = first_text(item, &compiled.name);
        let link = find_link(item, compiled.link.as_ref(), &base);

        let (name, product_url) = match (name, link) {
            (Some(name), Some(link)) => (name, link),
            (name, link) => {
                debug!("Skipping item: name={:?}, link={:?}", name, link);
                page.skipped += 1;
                continue;
            }
        };

        page.items.push(ScrapedItem {
            name,
            price_text: first_text(item, &compiled.price),
            original_price_text: compiled
                .original_price
                .as_ref()
                .and_then(|sel| first_text(item, sel)),
            image_url: find_image(item, compiled.image.as_ref(), &base),
            product_url,
        });
    }
    Ok(page)
}

/// `"{mallId}-{상품번호}"`. 상품 번호가 없으면 URL 의 SHA-256 앞 12자리
pub fn product_id(mall_id: &str, product_url: &str) -> String {
    let code = Url::parse(product_url).ok().and_then(|url| {
        PRODUCT_CODE_KEYS.iter().find_map(|key| {
            url.query_pairs()
                .find(|(k, v)| k == key && !v.trim().is_empty())
                .map(|(_, v)| v.trim().to_string())
        })
    });

    match code {
        Some(code) => format!("{}-{}", mall_id, code),
        None => {
            let digest = Sha256::digest(product_url.trim().as_bytes());
            format!("{}-{}", mall_id, &hex::encode(digest)[..12])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_price_text;
    use crate::scrape::profile::{MallProfile, Platform};

    const GODOMALL_HTML: &str = r#"
    <html><body>
      <div class="item_gallery_type"><ul>
        <li>
          <div class="item_photo_box">
            <a href="../goods/goods_view.php?goodsNo=1000123">
              <img src="/img/blank.gif" data-src="/data/goods/apple.jpg">
            </a>
          </div>
          <div class="item_info_cont">
            <strong class="item_name">  영주   사과 5kg </strong>
            <div class="item_money_box"><del>35,000원</del>
              <strong class="item_price"><span>29,900</span>원</strong></div>
          </div>
        </li>
        <li>
          <div class="item_photo_box"><a href="javascript:void(0)"><img src="x.jpg"></a></div>
          <strong class="item_name">링크 없는 상품</strong>
        </li>
        <li>
          <div class="item_photo_box"><a href="/goods/goods_view.php?goodsNo=1000124"></a></div>
          <strong class="item_name">가격문의 상품</strong>
        </li>
      </ul></div>
    </body></html>
    "#;

    fn godomall_selectors() -> Selectors {
        Selectors {
            item: ".item_gallery_type li".into(),
            name: ".item_name".into(),
            price: ".item_price".into(),
            original_price: Some(".item_money_box del".into()),
            image: Some(".item_photo_box img".into()),
            link: Some(".item_photo_box a".into()),
        }
    }

    #[test]
    fn test_parse_godomall_listing() {
        let page = parse_listing(
            GODOMALL_HTML,
            "https://gwdmall.kr/goods/goods_list.php?cateCd=001",
            &godomall_selectors(),
        )
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.skipped, 1);

        let apple = &page.items[0];
        assert_eq!(apple.name, "영주 사과 5kg");
        assert_eq!(apple.price_text.as_deref(), Some("29,900 원"));
        assert_eq!(apple.original_price_text.as_deref(), Some("35,000원"));
        assert_eq!(
            apple.product_url,
            "https://gwdmall.kr/goods/goods_view.php?goodsNo=1000123"
        );
        assert_eq!(
            apple.image_url.as_deref(),
            Some("https://gwdmall.kr/data/goods/apple.jpg")
        );

        let no_price = &page.items[1];
        assert_eq!(no_price.price_text, None);
        assert_eq!(no_price.image_url, None);
    }

    #[test]
    fn test_cafe24_preset_reads_sale_price_only() {
        let html = r#"
        <ul class="prdList"><li id="anchorBoxId_77">
          <div class="thumbnail"><a href="/product/detail.html?product_no=77"><img src="/web/product/77.jpg"></a></div>
          <div class="description">
            <strong class="name"><a href="/product/detail.html?product_no=77"><span>상품명 :</span> 제주 감귤 5kg</a></strong>
            <ul class="xans-element- xans-product xans-product-listitem spec">
              <li rel="소비자가"><strong class="title">소비자가 :</strong> <span>25,000원</span></li>
              <li rel="판매가"><strong class="title">판매가 :</strong> <span>19,900원</span></li>
              <li rel="적립금"><strong class="title">적립금 :</strong> <span>200원 (1%)</span></li>
            </ul>
          </div>
        </li></ul>
        "#;
        let profile = MallProfile::new("jeju", "https://jejumall.kr/list?page={page}")
            .with_platform(Platform::Cafe24);
        let selectors = Selectors::resolve(&profile).unwrap();
        let page = parse_listing(html, "https://jejumall.kr/list?page=1", &selectors).unwrap();

        assert_eq!(page.items.len(), 1);
        let item = &page.items[0];
        let price = item.price_text.as_deref().unwrap();
        assert!(!price.contains("적립금"));
        assert_eq!(parse_price_text(price), Some(19900));
        let original = item.original_price_text.as_deref().unwrap();
        assert_eq!(parse_price_text(original), Some(25000));
        assert_eq!(
            item.product_url,
            "https://jejumall.kr/product/detail.html?product_no=77"
        );
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let mut selectors = godomall_selectors();
        selectors.item = "li[".into();
        let err = parse_listing("<html></html>", "https://x.kr", &selectors).unwrap_err();
        assert!(matches!(err, MallError::Config(_)));
    }

    #[test]
    fn test_item_that_is_itself_a_link() {
        let html = r#"<div class="list"><a class="card" href="/p/77"><span class="t">제주 감귤</span><em class="p">12,000원</em></a></div>"#;
        let selectors = Selectors {
            item: "a.card".into(),
            name: ".t".into(),
            price: ".p".into(),
            original_price: None,
            image: None,
            link: None,
        };
        let page = parse_listing(html, "https://jejumall.kr/list", &selectors).unwrap();
        assert_eq!(page.items[0].product_url, "https://jejumall.kr/p/77");
        assert_eq!(page.items[0].price_text.as_deref(), Some("12,000원"));
    }

    #[test]
    fn test_product_id_prefers_product_code() {
        assert_eq!(
            product_id("gwd", "https://gwdmall.kr/goods/goods_view.php?goodsNo=1000123&cate=1"),
            "gwd-1000123"
        );
        assert_eq!(
            product_id("c24", "https://shop.kr/product/detail.html?product_no=55"),
            "c24-55"
        );
    }

    #[test]
    fn test_product_id_hash_fallback_is_stable() {
        let a = product_id("jj", "https://jejumall.kr/p/77");
        let b = product_id("jj", " https://jejumall.kr/p/77 ");
        assert_eq!(a, b);
        assert_eq!(a.len(), "jj-".len() + 12);
        assert_ne!(a, product_id("jj", "https://jejumall.kr/p/78"));
    }
}
