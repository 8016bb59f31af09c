/// 매물 커맨드 처리
/// 1. 매물 등록
/// 2. 오퍼 제출
/// 3. 낙찰(오퍼 수락)
/// 4. 매물 삭제
// region:    --- Imports
use crate::error::ApiError;
use crate::fanout::{broadcast_listings, ListingPublisher};
use crate::identity::Principal;
use crate::listing::model::{Category, Listing, ListingStatus, NewListing, NewOffer, Offer};
use crate::listing::view::{AcceptedOfferView, SettlementView};
use crate::store::ListingStore;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands

/// 매물 등록 명령
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingCommand {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: Category,
    pub start_price: f64,
    pub floor_price: f64,
    #[serde(default)]
    pub offer_window_hours: Option<i64>,
}

/// 오퍼 제출 명령
/// bidderName은 구버전 클라이언트 호환으로 받기만 하고 기록에는 쓰지 않는다
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOfferCommand {
    #[serde(default)]
    pub bidder_name: Option<String>,
    pub amount: f64,
}

/// 낙찰 명령
/// offerId 형식 오류는 역직렬화 실패가 아니라 InvalidInput으로 돌려준다
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOfferCommand {
    #[serde(default)]
    pub offer_id: Option<Value>,
}

// 오퍼 창 기본/허용 범위(시간)
const DEFAULT_OFFER_WINDOW_HOURS: i64 = 48;
const MIN_OFFER_WINDOW_HOURS: i64 = 1;
const MAX_OFFER_WINDOW_HOURS: i64 = 168;

// 인라인 이미지(base64 data URL) 상한
const MAX_IMAGE_CHARS: usize = 2_000_000;

/// 1. 매물 등록
pub async fn create_listing(
    store: &dyn ListingStore,
    publisher: &dyn ListingPublisher,
    caller: &Principal,
    cmd: CreateListingCommand,
) -> Result<Listing, ApiError> {
    info!(
        "{:<12} --> 매물 등록 처리 시작: seller={}, title={:?}",
        "Command", caller.id, cmd.title
    );

    if cmd.title.chars().count() < 3 {
        return Err(ApiError::InvalidInput(
            "Title must be at least 3 characters".to_string(),
        ));
    }
    if cmd.description.chars().count() < 5 {
        return Err(ApiError::InvalidInput(
            "Description must be at least 5 characters".to_string(),
        ));
    }
    // 빈 문자열은 이미지 없음으로 취급한다
    let image_url = match cmd.image_url.as_deref() {
        None | Some("") => None,
        Some(url) if url.len() > MAX_IMAGE_CHARS => {
            return Err(ApiError::InvalidInput("Image is too large".to_string()))
        }
        Some(url) => Some(url.to_string()),
    };
    if cmd.start_price <= 0.0 {
        return Err(ApiError::InvalidInput(
            "Start price must be positive".to_string(),
        ));
    }
    if cmd.floor_price < 0.0 {
        return Err(ApiError::InvalidInput(
            "Floor price must not be negative".to_string(),
        ));
    }
    if cmd.start_price < cmd.floor_price {
        return Err(ApiError::InvalidInput(
            "Start price must be greater than or equal to floor price".to_string(),
        ));
    }
    let hours = cmd.offer_window_hours.unwrap_or(DEFAULT_OFFER_WINDOW_HOURS);
    if !(MIN_OFFER_WINDOW_HOURS..=MAX_OFFER_WINDOW_HOURS).contains(&hours) {
        return Err(ApiError::InvalidInput(
            "Offer window must be between 1 and 168 hours".to_string(),
        ));
    }

    let now = Utc::now();
    let listing = store
        .insert_listing(NewListing {
            seller_id: Some(caller.id),
            seller_name: caller.display_name.clone(),
            image_url,
            title: cmd.title,
            description: cmd.description,
            category: cmd.category,
            start_price: cmd.start_price,
            floor_price: cmd.floor_price,
            starts_at: now,
            offer_window_ends_at: now + Duration::hours(hours),
            created_at: now,
        })
        .await?;

    info!(
        "{:<12} --> 매물 등록 완료: listing_id={}",
        "Command", listing.id
    );
    broadcast_listings(publisher, store, now).await;

    Ok(listing)
}

/// 2. 오퍼 제출
pub async fn place_offer(
    store: &dyn ListingStore,
    publisher: &dyn ListingPublisher,
    caller: &Principal,
    listing_id: i64,
    cmd: PlaceOfferCommand,
) -> Result<Offer, ApiError> {
    info!(
        "{:<12} --> 오퍼 제출 처리 시작: listing_id={}, bidder={}",
        "Command", listing_id, caller.id
    );

    let listing = store
        .find_listing(listing_id)
        .await?
        .ok_or(ApiError::NotFound("Listing not found"))?;

    if listing.status != ListingStatus::Open {
        return Err(ApiError::InvalidState("Listing is not open"));
    }
    let now = Utc::now();
    if now >= listing.offer_window_ends_at {
        return Err(ApiError::InvalidState("Offer window has ended"));
    }
    if listing.seller_id == Some(caller.id) {
        return Err(ApiError::Forbidden(
            "Sellers cannot bid on their own listing",
        ));
    }
    // 금액은 양수이기만 하면 된다. 현재 감가 가격과 비교하지 않는다
    if cmd.amount <= 0.0 {
        return Err(ApiError::InvalidInput("Amount must be positive".to_string()));
    }

    // 기록되는 입찰자 이름은 항상 인증 주체의 표시 이름이다
    let offer = store
        .append_offer(
            listing_id,
            NewOffer {
                bidder_name: caller.display_name.clone(),
                amount: cmd.amount,
                created_at: now,
            },
        )
        .await?;

    info!(
        "{:<12} --> 오퍼 기록 완료: listing_id={}, offer_id={}, amount={}",
        "Command", listing_id, offer.id, offer.amount
    );
    broadcast_listings(publisher, store, now).await;

    Ok(offer)
}

/// 3. 낙찰(오퍼 수락)
pub async fn accept_offer(
    store: &dyn ListingStore,
    publisher: &dyn ListingPublisher,
    caller: &Principal,
    listing_id: i64,
    cmd: AcceptOfferCommand,
) -> Result<SettlementView, ApiError> {
    info!(
        "{:<12} --> 낙찰 처리 시작: listing_id={}, caller={}",
        "Command", listing_id, caller.id
    );

    let listing = store
        .find_listing(listing_id)
        .await?
        .ok_or(ApiError::NotFound("Listing not found"))?;

    if listing.status != ListingStatus::Open {
        return Err(ApiError::InvalidState("Listing is not open"));
    }
    // 판매자가 기록되지 않은 매물은 누구도 낙찰시킬 수 없다
    if listing.seller_id != Some(caller.id) {
        return Err(ApiError::Forbidden(
            "Only the listing seller can accept an offer",
        ));
    }
    let offer_id = cmd
        .offer_id
        .as_ref()
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::InvalidInput("Invalid offerId".to_string()))?;
    let offer = listing
        .offers
        .iter()
        .find(|offer| offer.id == offer_id)
        .cloned()
        .ok_or(ApiError::NotFound("Offer not found"))?;

    // 동시 낙찰 경쟁은 저장소의 조건부 갱신이 판정한다. 패자는 InvalidState
    let now = Utc::now();
    if !store.settle_if_open(listing_id, offer_id).await? {
        return Err(ApiError::InvalidState("Listing is not open"));
    }

    info!(
        "{:<12} --> 낙찰 완료: listing_id={}, offer_id={}, bidder={:?}",
        "Command", listing_id, offer_id, offer.bidder_name
    );
    broadcast_listings(publisher, store, now).await;

    Ok(SettlementView {
        listing_id,
        status: ListingStatus::Sold,
        accepted_offer: AcceptedOfferView::from_offer(&offer),
    })
}

/// 4. 매물 삭제(판매자 전용)
pub async fn delete_listing(
    store: &dyn ListingStore,
    publisher: &dyn ListingPublisher,
    caller: &Principal,
    listing_id: i64,
) -> Result<(), ApiError> {
    info!(
        "{:<12} --> 매물 삭제 처리 시작: listing_id={}, caller={}",
        "Command", listing_id, caller.id
    );

    let listing = store
        .find_listing(listing_id)
        .await?
        .ok_or(ApiError::NotFound("Listing not found"))?;

    if listing.seller_id != Some(caller.id) {
        return Err(ApiError::Forbidden(
            "Only the listing seller can delete this listing",
        ));
    }

    store.delete_listing(listing_id).await?;

    info!(
        "{:<12} --> 매물 삭제 완료: listing_id={}",
        "Command", listing_id
    );
    broadcast_listings(publisher, store, Utc::now()).await;

    Ok(())
}

// endregion: --- Commands
