/// 외부 직렬화 뷰
/// 저장 모델과 클라이언트 계약을 분리한다. `startsAt`은 내부 값이라 내보내지
/// 않고, 가격은 항상 조회 시점 기준으로 다시 계산한다.
// region:    --- Imports
use crate::listing::model::{Category, Listing, ListingStatus, Offer};
use crate::pricing;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

// endregion: --- Imports

// region:    --- Listing View

/// 목록/브로드캐스트 공용 매물 뷰
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<i64>,
    pub seller_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: ListingStatus,
    pub start_price: f64,
    pub floor_price: f64,
    pub current_price: f64,
    pub offer_window_ends_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_offer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub offers: Vec<Offer>,
}

impl ListingView {
    /// 저장 모델을 조회 시점 가격과 함께 뷰로 변환
    pub fn render(listing: &Listing, now: DateTime<Utc>) -> Self {
        // 표시용 정렬: 높은 금액부터. 감사 기준 순서(삽입순)는 모델이 가진다
        let mut offers = listing.offers.clone();
        offers.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal));

        ListingView {
            id: listing.id,
            seller_id: listing.seller_id,
            seller_name: listing.seller_name.clone(),
            image_url: listing.image_url.clone(),
            title: listing.title.clone(),
            description: listing.description.clone(),
            category: listing.category,
            status: listing.status,
            start_price: listing.start_price,
            floor_price: listing.floor_price,
            current_price: pricing::display_price(listing, now),
            offer_window_ends_at: listing.offer_window_ends_at,
            accepted_offer_id: listing.accepted_offer_id,
            created_at: listing.created_at,
            offers,
        }
    }
}

// endregion: --- Listing View

// region:    --- Settlement View

/// 낙찰 결과 뷰(accept-offer 응답)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementView {
    pub listing_id: i64,
    pub status: ListingStatus,
    pub accepted_offer: AcceptedOfferView,
}

/// 낙찰 오퍼의 공개 필드
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedOfferView {
    pub id: i64,
    pub bidder_name: String,
    pub amount: f64,
}

impl AcceptedOfferView {
    pub fn from_offer(offer: &Offer) -> Self {
        AcceptedOfferView {
            id: offer.id,
            bidder_name: offer.bidder_name.clone(),
            amount: offer.amount,
        }
    }
}

// endregion: --- Settlement View

// region:    --- Tests


// endregion: --- Tests
