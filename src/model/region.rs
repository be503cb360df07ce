use std::fmt;

use serde::{Deserialize, Serialize};

/// 광역자치단체 (17개 시·도)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Seoul,
    Busan,
    Daegu,
    Incheon,
    Gwangju,
    Daejeon,
    Ulsan,
    Sejong,
    Gyeonggi,
    Gangwon,
    Chungbuk,
    Chungnam,
    Jeonbuk,
    Jeonnam,
    Gyeongbuk,
    Gyeongnam,
    Jeju,
}

impl Region {
    pub const ALL: [Region; 17] = [
        Region::Seoul,
        Region::Busan,
        Region::Daegu,
        Region::Incheon,
        Region::Gwangju,
        Region::Daejeon,
        Region::Ulsan,
        Region::Sejong,
        Region::Gyeonggi,
        Region::Gangwon,
        Region::Chungbuk,
        Region::Chungnam,
        Region::Jeonbuk,
        Region::Jeonnam,
        Region::Gyeongbuk,
        Region::Gyeongnam,
        Region::Jeju,
    ];

    /// 목록·필터에 쓰는 약칭
    pub fn label(self) -> &'static str {
        match self {
            Region::Seoul => "서울",
            Region::Busan => "부산",
            Region::Daegu => "대구",
            Region::Incheon => "인천",
            Region::Gwangju => "광주",
            Region::Daejeon => "대전",
            Region::Ulsan => "울산",
            Region::Sejong => "세종",
            Region::Gyeonggi => "경기",
            Region::Gangwon => "강원",
            Region::Chungbuk => "충북",
            Region::Chungnam => "충남",
            Region::Jeonbuk => "전북",
            Region::Jeonnam => "전남",
            Region::Gyeongbuk => "경북",
            Region::Gyeongnam => "경남",
            Region::Jeju => "제주",
        }
    }

    fn full_names(self) -> &'static [&'static str] {
        match self {
            Region::Seoul => &["서울특별시"],
            Region::Busan => &["부산광역시"],
            Region::Daegu => &["대구광역시"],
            Region::Incheon => &["인천광역시"],
            Region::Gwangju => &["광주광역시"],
            Region::Daejeon => &["대전광역시"],
            Region::Ulsan => &["울산광역시"],
            Region::Sejong => &["세종특별자치시"],
            Region::Gyeonggi => &["경기도"],
            Region::Gangwon => &["강원특별자치도", "강원도"],
            Region::Chungbuk => &["충청북도"],
            Region::Chungnam => &["충청남도"],
            Region::Jeonbuk => &["전북특별자치도", "전라북도"],
            Region::Jeonnam => &["전라남도"],
            Region::Gyeongbuk => &["경상북도"],
            Region::Gyeongnam => &["경상남도"],
            Region::Jeju => &["제주특별자치도", "제주도"],
        }
    }

    /// 문자열에서 가장 앞에 나오는 시·도를 찾는다 (정식 명칭, 약칭 모두)
    pub fn detect(text: &str) -> Option<Region> {
        let mut best: Option<(usize, Region)> = None;
        for region in Region::ALL {
            let positions = region
                .full_names()
                .iter()
                .copied()
                .chain(std::iter::once(region.label()))
                .filter_map(|pat| text.find(pat));
            for pos in positions {
                if best.map_or(true, |(p, _)| pos < p) {
                    best = Some((pos, region));
                }
            }
        }
        best.map(|(_, region)| region)
    }

    /// 약칭·정식 명칭을 약칭으로 통일
    pub fn normalize(text: &str) -> Option<&'static str> {
        Region::detect(text.trim()).map(Region::label)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
