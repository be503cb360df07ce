//! 키워드 기반 상품 분류기
//!
//! 카테고리별 키워드 적중 수가 가장 많은 카테고리를 고른다.
//! 동점이면 `Category::ALL` 순서(구체적인 카테고리 먼저)를 따른다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    TraditionalLiquor,
    HealthFood,
    Seafood,
    Livestock,
    ProcessedFood,
    Agricultural,
    Craft,
    Household,
    Other,
}

impl Category {
    /// 동점 처리 우선순위 순
    pub const ALL: [Category; 9] = [
        Category::TraditionalLiquor,
        Category::HealthFood,
        Category::Seafood,
        Category::Livestock,
        Category::ProcessedFood,
        Category::Agricultural,
        Category::Craft,
        Category::Household,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::TraditionalLiquor => "전통주",
            Category::HealthFood => "건강식품",
            Category::Seafood => "수산물",
            Category::Livestock => "축산물",
            Category::ProcessedFood => "가공식품",
            Category::Agricultural => "농산물",
            Category::Craft => "공예품",
            Category::Household => "생활용품",
            Category::Other => "기타",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::TraditionalLiquor => &[
                "막걸리", "약주", "탁주", "소주", "전통주", "동동주", "과실주", "와인",
                "증류주", "복분자주", "오미자주",
            ],
            Category::HealthFood => &[
                "홍삼", "인삼", "수삼", "흑삼", "진액", "즙", "엑기스", "효소", "꿀",
                "벌꿀", "프로폴리스", "녹용", "도라지청", "발효", "건강",
            ],
            Category::Seafood => &[
                "굴비", "고등어", "갈치", "전복", "새우", "멸치", "오징어", "미역", "조미김",
                "곱창김", "재래김", "김자반", "다시마", "꽃게", "대게", "홍게", "조기", "명태", "황태", "과메기", "문어",
                "낙지", "장어", "해산물", "수산", "젓갈", "생선", "매생이", "톳",
            ],
            Category::Livestock => &[
                "한우", "한돈", "돼지", "소고기", "쇠고기", "닭", "오리고기", "훈제오리", "등심", "안심",
                "갈비", "삼겹살", "목살", "불고기", "육포", "계란", "달걀", "정육", "흑돼지",
            ],
            Category::ProcessedFood => &[
                "된장", "고추장", "간장", "청국장", "장아찌", "김치", "한과", "떡", "과자",
                "잼", "소스", "만두", "국수", "냉면", "즉석", "밀키트", "누룽지", "조청",
                "참기름", "들기름", "식혜", "두부", "녹차", "티백", "케이크", "가공",
            ],
            Category::Agricultural => &[
                "사과", "나주배", "신고배", "감귤", "귤", "한라봉", "천혜향", "딸기", "포도", "샤인머스캣",
                "복숭아", "수박", "참외", "감자", "고구마", "쌀", "현미", "잡곡", "콩", "양파",
                "마늘", "고추", "버섯", "표고", "나물", "채소", "과일", "곶감", "알밤", "공주밤", "대추",
                "호두", "옥수수", "토마토", "블루베리",
            ],
            Category::Craft => &[
                "도자기", "공예", "한지", "목공", "칠기", "나전", "자수", "옹기", "죽공예",
                "방짜", "유기그릇", "놋그릇",
            ],
            Category::Household => &[
                "비누", "수건", "세제", "화장품", "샴푸", "마스크", "생활용품", "주방",
                "텀블러", "디퓨저", "캔들",
            ],
            Category::Other => &[],
        }
    }

    /// 키워드 적중 수
    fn score(self, text: &str) -> usize {
        self.keywords()
            .iter()
            .filter(|kw| text.contains(*kw))
            .count()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// 표시 태그 후보 (텍스트에 포함되면 태그로 붙는다)
const TAG_MARKERS: &[(&str, &str)] = &[
    ("유기농", "유기농"),
    ("무농약", "무농약"),
    ("친환경", "친환경"),
    ("국내산", "국내산"),
    ("국산", "국내산"),
    ("선물세트", "선물세트"),
    ("선물 세트", "선물세트"),
    ("제철", "제철"),
    ("HACCP", "HACCP"),
    ("해썹", "HACCP"),
    ("당일발송", "당일발송"),
    ("당일 발송", "당일발송"),
    ("무료배송", "무료배송"),
];

/// 태그 표시어는 분류 키워드로 세지 않는다 (`유기농` 안의 `유기` 등)
fn strip_markers(text: &str) -> String {
    TAG_MARKERS
        .iter()
        .fold(text.to_string(), |acc, (marker, _)| acc.replace(marker, " "))
}

pub fn classify(text: &str) -> Category {
    let text = strip_markers(text);
    let mut best = Category::Other;
    let mut best_score = 0;
    for category in Category::ALL {
        let score = category.score(&text);
        if score > best_score {
            best = category;
            best_score = score;
        }
    }
    best
}

pub fn derive_tags(text: &str) -> Vec<String> {
    let upper = text.to_uppercase();
    let mut tags: Vec<String> = Vec::new();
    for (marker, tag) in TAG_MARKERS {
        if upper.contains(marker) && !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
    tags
}

/// 카테고리·태그를 채운다. 변경이 있으면 true
///
/// `overwrite` 가 false 면 기존 카테고리는 유지하고 태그만 합친다.
pub fn classify_product(product: &mut Product, overwrite: bool) -> bool {
    let text = product.search_text();
    if text.is_empty() {
        return false;
    }

    let mut changed = false;
    let has_category = product
        .category
        .as_deref()
        .map_or(false, |c| !c.trim().is_empty());

    if overwrite || !has_category {
        let label = classify(&text).label().to_string();
        if product.category.as_deref() != Some(label.as_str()) {
            product.category = Some(label);
            changed = true;
        }
    }

    for tag in derive_tags(&text) {
        if !product.has_tag(&tag) {
            product.tags.push(tag);
            changed = true;
        }
    }
    changed
}
