/// 하향식 경매 가격 계산
/// 시작가에서 최저가까지 오퍼 윈도우 동안 선형으로 감소한다.
// region:    --- Imports
use crate::listing::model::Listing;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Pricing

/// 현재 가격 계산(전체 정밀도)
///
/// 윈도우 종료 이후는 최저가, 시작 이전은 시작가로 고정되고
/// 그 사이에서는 경과 시간 비율만큼 선형 감소한다.
/// 윈도우 길이가 0 이하인 매물은 등록 검증에서 걸러진다는 전제를 둔다.
pub fn current_price(listing: &Listing, now: DateTime<Utc>) -> f64 {
    if now >= listing.offer_window_ends_at {
        return listing.floor_price;
    }
    if now <= listing.starts_at {
        return listing.start_price;
    }

    let elapsed = (now - listing.starts_at).num_milliseconds() as f64;
    let duration = (listing.offer_window_ends_at - listing.starts_at).num_milliseconds() as f64;
    let price_diff = listing.start_price - listing.floor_price;

    listing.start_price - (elapsed / duration) * price_diff
}

/// 표시용 가격(센트 단위 반올림)
pub fn display_price(listing: &Listing, now: DateTime<Utc>) -> f64 {
    round2(current_price(listing, now))
}

/// 소수점 둘째 자리 반올림
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// endregion: --- Pricing

// region:    --- Tests


// endregion: --- Tests
