/// 매물 등록
pub const INSERT_LISTING: &str = r#"
    INSERT INTO listings (seller_id, seller_name, image_url, title, description, category, status, start_price, floor_price, starts_at, offer_window_ends_at, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, 'OPEN', $7, $8, $9, $10, $11)
    RETURNING id, seller_id, seller_name, image_url, title, description, category, status, start_price, floor_price, starts_at, offer_window_ends_at, accepted_offer_id, created_at
"#;

/// 매물 단건 조회
pub const GET_LISTING: &str =
    "SELECT id, seller_id, seller_name, image_url, title, description, category, status, start_price, floor_price, starts_at, offer_window_ends_at, accepted_offer_id, created_at FROM listings WHERE id = $1";

/// 전체 매물 조회(최신 등록 순)
pub const GET_ALL_LISTINGS: &str =
    "SELECT id, seller_id, seller_name, image_url, title, description, category, status, start_price, floor_price, starts_at, offer_window_ends_at, accepted_offer_id, created_at FROM listings ORDER BY created_at DESC, id DESC";

/// 매물별 오퍼 조회(삽입 순서)
pub const GET_OFFERS_FOR_LISTINGS: &str = r#"
    SELECT id, listing_id, bidder_name, amount, created_at
    FROM offers
    WHERE listing_id = ANY($1)
    ORDER BY id
"#;

/// 오퍼 추가
pub const INSERT_OFFER: &str = r#"
    INSERT INTO offers (listing_id, bidder_name, amount, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, bidder_name, amount, created_at
"#;

/// 낙찰 처리: OPEN 상태일 때만 SOLD로 전환
pub const SETTLE_LISTING: &str = r#"
    UPDATE listings
    SET status = 'SOLD', accepted_offer_id = $2
    WHERE id = $1 AND status = 'OPEN'
    RETURNING id
"#;

/// 매물 삭제(오퍼는 FK CASCADE로 함께 삭제)
pub const DELETE_LISTING: &str = "DELETE FROM listings WHERE id = $1";

/// 연결 확인
pub const PING: &str = "SELECT 1";
