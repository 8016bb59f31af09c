use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reverse_auction_service::error::ApiError;
use reverse_auction_service::fanout::ListingPublisher;
use reverse_auction_service::identity::Principal;
use reverse_auction_service::listing::commands::{
    accept_offer, create_listing, delete_listing, place_offer, AcceptOfferCommand,
    CreateListingCommand, PlaceOfferCommand,
};
use reverse_auction_service::listing::model::{Category, Listing, ListingStatus, Offer};
use reverse_auction_service::store::memory::MemoryListingStore;
use reverse_auction_service::store::ListingStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 발행 프레임을 기록만 하는 테스트 더블
#[derive(Default)]
struct RecordingPublisher {
    frames: Mutex<Vec<(String, Value)>>,
}

impl RecordingPublisher {
    async fn recorded(&self) -> Vec<(String, Value)> {
        self.frames.lock().await.clone()
    }
}

#[async_trait]
impl ListingPublisher for RecordingPublisher {
    async fn publish(&self, event: &str, payload: Value) -> Result<(), String> {
        self.frames.lock().await.push((event.to_string(), payload));
        Ok(())
    }
}

fn seller() -> Principal {
    Principal {
        id: 1,
        display_name: "Alice Seller".to_string(),
    }
}

fn bidder() -> Principal {
    Principal {
        id: 2,
        display_name: "Bob Bidder".to_string(),
    }
}

fn create_cmd(title: &str, start_price: f64, floor_price: f64) -> CreateListingCommand {
    CreateListingCommand {
        title: title.to_string(),
        description: "Command test listing.".to_string(),
        image_url: None,
        category: Category::Other,
        start_price,
        floor_price,
        offer_window_hours: Some(24),
    }
}

fn offer_cmd(amount: f64) -> PlaceOfferCommand {
    PlaceOfferCommand {
        bidder_name: None,
        amount,
    }
}

fn accept_cmd(offer_id: Value) -> AcceptOfferCommand {
    AcceptOfferCommand {
        offer_id: Some(offer_id),
    }
}

/// 창이 닫혔지만 아직 OPEN인 매물
fn expired_open_listing(id: i64, now: DateTime<Utc>, offers: Vec<Offer>) -> Listing {
    Listing {
        id,
        seller_id: Some(1),
        seller_name: "Alice Seller".to_string(),
        image_url: None,
        title: "Window closed".to_string(),
        description: "Offer window already over.".to_string(),
        category: Category::Other,
        status: ListingStatus::Open,
        start_price: 50.0,
        floor_price: 25.0,
        starts_at: now - Duration::hours(10),
        offer_window_ends_at: now - Duration::hours(1),
        accepted_offer_id: None,
        created_at: now - Duration::hours(10),
        offers,
    }
}

/// 등록 검증 메시지 테스트
#[tokio::test]
async fn test_create_listing_field_validation() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    let cases = [
        (create_cmd("ab", 50.0, 25.0), "Title must be at least 3 characters"),
        (
            CreateListingCommand {
                description: "abcd".to_string(),
                ..create_cmd("Valid title", 50.0, 25.0)
            },
            "Description must be at least 5 characters",
        ),
        (create_cmd("Valid title", 0.0, 0.0), "Start price must be positive"),
        (
            create_cmd("Valid title", 50.0, -1.0),
            "Floor price must not be negative",
        ),
        (
            create_cmd("Valid title", 50.0, 80.0),
            "Start price must be greater than or equal to floor price",
        ),
        (
            CreateListingCommand {
                offer_window_hours: Some(0),
                ..create_cmd("Valid title", 50.0, 25.0)
            },
            "Offer window must be between 1 and 168 hours",
        ),
        (
            CreateListingCommand {
                offer_window_hours: Some(169),
                ..create_cmd("Valid title", 50.0, 25.0)
            },
            "Offer window must be between 1 and 168 hours",
        ),
    ];

    for (cmd, expected) in cases {
        match create_listing(&store, &publisher, &seller(), cmd).await {
            Err(ApiError::InvalidInput(msg)) => assert_eq!(msg, expected),
            other => panic!("InvalidInput({expected:?})을 기대했으나: {other:?}"),
        }
    }

    // 거부된 등록은 브로드캐스트도 없다
    assert!(publisher.recorded().await.is_empty());
}

/// 오퍼 창 기본값(48시간) 테스트
#[tokio::test]
async fn test_create_listing_defaults_window_to_48_hours() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    let cmd = CreateListingCommand {
        offer_window_hours: None,
        ..create_cmd("Default window", 90.0, 45.0)
    };
    let listing = create_listing(&store, &publisher, &seller(), cmd)
        .await
        .unwrap();

    assert_eq!(
        listing.offer_window_ends_at - listing.starts_at,
        Duration::hours(48)
    );
    assert_eq!(listing.starts_at, listing.created_at);
    assert_eq!(listing.status, ListingStatus::Open);
    assert_eq!(listing.seller_id, Some(1));
    assert_eq!(listing.seller_name, "Alice Seller");
}

/// 빈 이미지 문자열은 이미지 없음으로 저장된다
#[tokio::test]
async fn test_create_listing_normalizes_empty_image() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    let cmd = CreateListingCommand {
        image_url: Some(String::new()),
        ..create_cmd("No image", 40.0, 20.0)
    };
    let listing = create_listing(&store, &publisher, &seller(), cmd)
        .await
        .unwrap();
    assert_eq!(listing.image_url, None);

    let cmd = CreateListingCommand {
        image_url: Some("data:image/png;base64,AAAA".to_string()),
        ..create_cmd("With image", 40.0, 20.0)
    };
    let listing = create_listing(&store, &publisher, &seller(), cmd)
        .await
        .unwrap();
    assert_eq!(
        listing.image_url.as_deref(),
        Some("data:image/png;base64,AAAA")
    );
}

/// 인라인 이미지 상한 테스트
#[tokio::test]
async fn test_create_listing_rejects_oversized_image() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    let cmd = CreateListingCommand {
        image_url: Some("x".repeat(2_000_001)),
        ..create_cmd("Huge image", 40.0, 20.0)
    };
    match create_listing(&store, &publisher, &seller(), cmd).await {
        Err(ApiError::InvalidInput(msg)) => assert_eq!(msg, "Image is too large"),
        other => panic!("이미지 상한 초과 거부를 기대했으나: {other:?}"),
    }
}

/// 오퍼 검증 순서 테스트: 상태 → 창 → 판매자 → 금액
#[tokio::test]
async fn test_place_offer_check_precedence() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();
    let now = Utc::now();

    // SOLD 매물: 판매자 본인 + 음수 금액이어도 상태 오류가 먼저다
    let mut sold = expired_open_listing(1, now, vec![]);
    sold.status = ListingStatus::Sold;
    store.insert_fixture(sold).await;
    match place_offer(&store, &publisher, &seller(), 1, offer_cmd(-5.0)).await {
        Err(ApiError::InvalidState(msg)) => assert_eq!(msg, "Listing is not open"),
        other => panic!("InvalidState를 기대했으나: {other:?}"),
    }

    // 창이 닫힌 OPEN 매물: 자기 입찰 검사보다 창 검사가 먼저다
    store.insert_fixture(expired_open_listing(2, now, vec![])).await;
    match place_offer(&store, &publisher, &seller(), 2, offer_cmd(30.0)).await {
        Err(ApiError::InvalidState(msg)) => assert_eq!(msg, "Offer window has ended"),
        other => panic!("창 종료 거부를 기대했으나: {other:?}"),
    }

    // 열린 매물: 금액 검사보다 자기 입찰 금지가 먼저다
    let open = create_listing(&store, &publisher, &seller(), create_cmd("Open", 50.0, 25.0))
        .await
        .unwrap();
    match place_offer(&store, &publisher, &seller(), open.id, offer_cmd(-5.0)).await {
        Err(ApiError::Forbidden(msg)) => assert_eq!(msg, "Sellers cannot bid on their own listing"),
        other => panic!("Forbidden을 기대했으나: {other:?}"),
    }
    match place_offer(&store, &publisher, &bidder(), open.id, offer_cmd(0.0)).await {
        Err(ApiError::InvalidInput(msg)) => assert_eq!(msg, "Amount must be positive"),
        other => panic!("금액 거부를 기대했으나: {other:?}"),
    }
}

/// 본문의 bidderName은 무시되고 인증 주체 이름이 기록된다
#[tokio::test]
async fn test_place_offer_ignores_client_bidder_name() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    let listing = create_listing(&store, &publisher, &seller(), create_cmd("Chair", 60.0, 30.0))
        .await
        .unwrap();
    let offer = place_offer(
        &store,
        &publisher,
        &bidder(),
        listing.id,
        PlaceOfferCommand {
            bidder_name: Some("Spoofed Name".to_string()),
            amount: 45.0,
        },
    )
    .await
    .unwrap();

    assert_eq!(offer.bidder_name, "Bob Bidder");
    assert_eq!(offer.amount, 45.0);
}

/// 금액은 현재가와 무관하게 양수면 받는다
#[tokio::test]
async fn test_place_offer_accepts_any_positive_amount() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    let listing = create_listing(&store, &publisher, &seller(), create_cmd("Lamp", 50.0, 25.0))
        .await
        .unwrap();

    // 시작가보다 높아도, 바닥가보다 낮아도 허용된다
    let high = place_offer(&store, &publisher, &bidder(), listing.id, offer_cmd(1000.0))
        .await
        .unwrap();
    let low = place_offer(&store, &publisher, &bidder(), listing.id, offer_cmd(0.01))
        .await
        .unwrap();

    assert_eq!(high.amount, 1000.0);
    assert_eq!(low.amount, 0.01);

    let stored = store.find_listing(listing.id).await.unwrap().unwrap();
    assert_eq!(stored.offers.len(), 2);
}

/// 낙찰 전제 조건별 오류 테스트
#[tokio::test]
async fn test_accept_offer_precondition_errors() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    // 없는 매물
    match accept_offer(&store, &publisher, &seller(), 999, accept_cmd(json!(1))).await {
        Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Listing not found"),
        other => panic!("NotFound를 기대했으나: {other:?}"),
    }

    let listing = create_listing(&store, &publisher, &seller(), create_cmd("Bike", 200.0, 100.0))
        .await
        .unwrap();
    let offer = place_offer(&store, &publisher, &bidder(), listing.id, offer_cmd(150.0))
        .await
        .unwrap();

    // 판매자 검사는 offerId 형식 검사보다 먼저다
    match accept_offer(&store, &publisher, &bidder(), listing.id, accept_cmd(json!("abc"))).await {
        Err(ApiError::Forbidden(msg)) => {
            assert_eq!(msg, "Only the listing seller can accept an offer")
        }
        other => panic!("Forbidden을 기대했으나: {other:?}"),
    }

    // offerId 형식 오류
    for bad in [
        AcceptOfferCommand { offer_id: None },
        accept_cmd(json!("abc")),
        accept_cmd(json!(null)),
        accept_cmd(json!(1.5)),
    ] {
        match accept_offer(&store, &publisher, &seller(), listing.id, bad).await {
            Err(ApiError::InvalidInput(msg)) => assert_eq!(msg, "Invalid offerId"),
            other => panic!("offerId 형식 거부를 기대했으나: {other:?}"),
        }
    }

    // 없는 오퍼
    match accept_offer(&store, &publisher, &seller(), listing.id, accept_cmd(json!(999))).await {
        Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Offer not found"),
        other => panic!("오퍼 NotFound를 기대했으나: {other:?}"),
    }

    // 정상 낙찰 후에는 상태 오류
    accept_offer(&store, &publisher, &seller(), listing.id, accept_cmd(json!(offer.id)))
        .await
        .unwrap();
    match accept_offer(&store, &publisher, &seller(), listing.id, accept_cmd(json!(offer.id))).await
    {
        Err(ApiError::InvalidState(msg)) => assert_eq!(msg, "Listing is not open"),
        other => panic!("SOLD 상태 거부를 기대했으나: {other:?}"),
    }
}

/// 판매자가 기록되지 않은 매물은 누구도 낙찰시킬 수 없다
#[tokio::test]
async fn test_accept_offer_on_anonymous_listing_is_forbidden() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();
    let now = Utc::now();

    let mut listing = expired_open_listing(1, now, vec![Offer {
        id: 1,
        bidder_name: "Bob Bidder".to_string(),
        amount: 30.0,
        created_at: now - Duration::hours(2),
    }]);
    listing.seller_id = None;
    listing.offer_window_ends_at = now + Duration::hours(1);
    store.insert_fixture(listing).await;

    match accept_offer(&store, &publisher, &seller(), 1, accept_cmd(json!(1))).await {
        Err(ApiError::Forbidden(_)) => {}
        other => panic!("Forbidden을 기대했으나: {other:?}"),
    }
}

/// 변경 명령마다 전체 스냅샷이 발행된다
#[tokio::test]
async fn test_commands_broadcast_snapshots() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    let listing = create_listing(&store, &publisher, &seller(), create_cmd("Desk", 80.0, 40.0))
        .await
        .unwrap();
    let offer = place_offer(&store, &publisher, &bidder(), listing.id, offer_cmd(60.0))
        .await
        .unwrap();
    accept_offer(&store, &publisher, &seller(), listing.id, accept_cmd(json!(offer.id)))
        .await
        .unwrap();

    let recorded = publisher.recorded().await;
    assert_eq!(recorded.len(), 3);
    assert!(recorded.iter().all(|(event, _)| event == "listings:updated"));

    // 각 프레임은 그 시점의 전체 목록 스냅샷이다
    assert_eq!(recorded[0].1[0]["offers"], json!([]));
    assert_eq!(recorded[1].1[0]["offers"][0]["id"], offer.id);
    assert_eq!(recorded[2].1[0]["status"], "SOLD");
    assert_eq!(recorded[2].1[0]["acceptedOfferId"], offer.id);
}

/// 동시 낙찰 명령 중 정확히 하나만 성공한다
#[tokio::test]
async fn test_concurrent_accept_commands_single_winner() {
    let store = Arc::new(MemoryListingStore::new());
    let publisher = Arc::new(RecordingPublisher::default());

    let listing = create_listing(
        store.as_ref(),
        publisher.as_ref(),
        &seller(),
        create_cmd("Speaker", 120.0, 60.0),
    )
    .await
    .unwrap();
    let first = place_offer(
        store.as_ref(),
        publisher.as_ref(),
        &bidder(),
        listing.id,
        offer_cmd(90.0),
    )
    .await
    .unwrap();
    let second = place_offer(
        store.as_ref(),
        publisher.as_ref(),
        &bidder(),
        listing.id,
        offer_cmd(85.0),
    )
    .await
    .unwrap();

    let mut handles = vec![];
    for i in 0..16 {
        let store = Arc::clone(&store);
        let publisher = Arc::clone(&publisher);
        let listing_id = listing.id;
        let offer_id = if i % 2 == 0 { first.id } else { second.id };

        handles.push(tokio::spawn(async move {
            accept_offer(
                store.as_ref(),
                publisher.as_ref(),
                &seller(),
                listing_id,
                accept_cmd(json!(offer_id)),
            )
            .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(settlement) => {
                winners += 1;
                assert_eq!(settlement.listing_id, listing.id);
                assert_eq!(settlement.status, ListingStatus::Sold);
            }
            Err(ApiError::InvalidState(msg)) => assert_eq!(msg, "Listing is not open"),
            Err(other) => panic!("예상 밖 오류: {other:?}"),
        }
    }
    assert_eq!(winners, 1);

    let stored = store.find_listing(listing.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ListingStatus::Sold);
    assert!(stored.accepted_offer_id.is_some());
}

/// 삭제는 판매자 전용이고 브로드캐스트를 동반한다
#[tokio::test]
async fn test_delete_listing_requires_owner() {
    let store = MemoryListingStore::new();
    let publisher = RecordingPublisher::default();

    let listing = create_listing(&store, &publisher, &seller(), create_cmd("Rug", 30.0, 15.0))
        .await
        .unwrap();

    match delete_listing(&store, &publisher, &bidder(), listing.id).await {
        Err(ApiError::Forbidden(msg)) => {
            assert_eq!(msg, "Only the listing seller can delete this listing")
        }
        other => panic!("Forbidden을 기대했으나: {other:?}"),
    }

    delete_listing(&store, &publisher, &seller(), listing.id)
        .await
        .unwrap();
    assert!(store.find_listing(listing.id).await.unwrap().is_none());

    // 등록 1회 + 삭제 1회
    let recorded = publisher.recorded().await;
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[1].1, json!([]));
}
