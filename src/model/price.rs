//! 가격 필드
//!
//! 수집기마다 가격을 숫자(`12000`)나 문자열(`"12,000원"`)로 저장해 왔기 때문에
//! 둘 다 받아들이고, 정리 패스에서 숫자로 통일한다.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(u64),
    Decimal(f64),
    Text(String),
}

impl Price {
    /// 원 단위 정수 금액. 0 이나 숫자가 없는 문자열("가격문의")은 None
    pub fn amount(&self) -> Option<u64> {
        match self {
            Price::Amount(n) => Some(*n).filter(|n| *n > 0),
            Price::Decimal(f) if f.is_finite() && *f >= 1.0 => Some(f.round() as u64),
            Price::Decimal(_) => None,
            Price::Text(text) => parse_price_text(text),
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, Price::Amount(n) if *n > 0)
    }
}

impl From<u64> for Price {
    fn from(n: u64) -> Self {
        Price::Amount(n)
    }
}

/// `"정가 15,000원 할인가 12,000원"` 같은 문자열에서 판매가를 뽑는다.
///
/// 뒤에 `원`이 붙은 금액이 있으면 그중 마지막 것을, 없으면 마지막 숫자 묶음을 쓴다.
/// 할인 표기는 보통 정가 뒤에 오기 때문에 마지막 금액이 판매가다.
pub fn parse_price_text(text: &str) -> Option<u64> {
    let chars: Vec<char> = text.chars().collect();
    let mut groups: Vec<(u64, bool)> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let mut digits = String::new();
        while i < chars.len() {
            let c = chars[i];
            if c.is_ascii_digit() {
                digits.push(c);
            } else if c == ','
                && i + 1 < chars.len()
                && chars[i + 1].is_ascii_digit()
                && !digits.is_empty()
            {
                // 천 단위 구분자
            } else {
                break;
            }
            i += 1;
        }

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        let won = j < chars.len() && chars[j] == '원';

        if let Ok(value) = digits.parse::<u64>() {
            groups.push((value, won));
        }
    }

    let picked = groups
        .iter()
        .rev()
        .find(|(_, won)| *won)
        .or_else(|| groups.last())
        .map(|(value, _)| *value)?;

    Some(picked).filter(|v| *v > 0)
}
