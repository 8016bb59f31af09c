/// 데모 픽스처
/// DB 없이 기동하는 메모리 모드용 시드 데이터. `demo-*` 토큰의 계정 id와
/// 판매자/입찰자가 맞물리도록 구성했다.
// region:    --- Imports
use crate::listing::model::{Category, Listing, ListingStatus, Offer};
use crate::store::memory::MemoryListingStore;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

// endregion: --- Imports

const TAG: &str = "[DEMO]";

fn demo_name(name: &str) -> String {
    format!("{TAG} {name}")
}

/// 매물 3건 적재: 진행 중 1, 낙찰 완료 1, 종료(유찰) 1
pub async fn seed(store: &MemoryListingStore) {
    let now = Utc::now();

    store.insert_fixture(open_monitor(now)).await;
    store.insert_fixture(sold_textbook(now)).await;
    store.insert_fixture(closed_lamp(now)).await;

    info!("{:<12} --> 데모 픽스처 적재 완료: 매물 3건", "Demo");
}

/// 진행 중 경매. 12시간 창에서 2시간 경과, 오퍼 2건
fn open_monitor(now: DateTime<Utc>) -> Listing {
    Listing {
        id: 1,
        seller_id: Some(2),
        seller_name: demo_name("Noah Fixit"),
        image_url: None,
        title: format!("{TAG} Gaming Monitor 27in"),
        description: "144Hz monitor, lightly used, includes HDMI cable.".to_string(),
        category: Category::Dorm,
        status: ListingStatus::Open,
        start_price: 180.0,
        floor_price: 120.0,
        starts_at: now - Duration::hours(2),
        offer_window_ends_at: now + Duration::hours(10),
        accepted_offer_id: None,
        created_at: now,
        offers: vec![
            Offer {
                id: 1,
                bidder_name: demo_name("Ava Student"),
                amount: 150.0,
                created_at: now - Duration::minutes(40),
            },
            Offer {
                id: 2,
                bidder_name: demo_name("Liam Student"),
                amount: 140.0,
                created_at: now - Duration::minutes(20),
            },
        ],
    }
}

/// 낙찰 완료 경매. 210 오퍼가 수락된 상태
fn sold_textbook(now: DateTime<Utc>) -> Listing {
    Listing {
        id: 2,
        seller_id: Some(3),
        seller_name: demo_name("Ava Student"),
        image_url: None,
        title: format!("{TAG} Organic Chemistry Textbook"),
        description: "Latest edition, highlighted but in excellent condition.".to_string(),
        category: Category::Textbook,
        status: ListingStatus::Sold,
        start_price: 280.0,
        floor_price: 160.0,
        starts_at: now - Duration::hours(30),
        offer_window_ends_at: now - Duration::hours(2),
        accepted_offer_id: Some(3),
        // 목록이 항상 [모니터, 교재, 램프] 순이 되도록 등록 시각을 벌린다
        created_at: now - Duration::minutes(1),
        offers: vec![
            Offer {
                id: 3,
                bidder_name: demo_name("Liam Student"),
                amount: 210.0,
                created_at: now - Duration::hours(5),
            },
            Offer {
                id: 4,
                bidder_name: demo_name("Zoe Student"),
                amount: 190.0,
                created_at: now - Duration::hours(4),
            },
        ],
    }
}

/// 종료된 경매. 오퍼 없이 창이 닫힌 케이스
fn closed_lamp(now: DateTime<Utc>) -> Listing {
    Listing {
        id: 3,
        seller_id: Some(5),
        seller_name: demo_name("Zoe Student"),
        image_url: None,
        title: format!("{TAG} Desk Lamp + Organizer Bundle"),
        description: "Dorm desk bundle, sold as set.".to_string(),
        category: Category::Other,
        status: ListingStatus::Closed,
        start_price: 45.0,
        floor_price: 20.0,
        starts_at: now - Duration::hours(48),
        offer_window_ends_at: now - Duration::hours(1),
        accepted_offer_id: None,
        created_at: now - Duration::minutes(2),
        offers: vec![],
    }
}

// region:    --- Tests


// endregion: --- Tests
