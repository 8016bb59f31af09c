/// 매물 저장소
/// Postgres 구현과 메모리 구현이 같은 트레이트를 공유한다.
/// 낙찰은 저장소의 조건부 업데이트(settle_if_open)로만 확정된다.
// region:    --- Imports
use crate::listing::model::{Listing, NewListing, NewOffer, Offer};
use async_trait::async_trait;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;
mod queries;

pub use memory::MemoryListingStore;
pub use postgres::PostgresListingStore;

// endregion: --- Modules

// region:    --- Store Error

/// 저장소 오류
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("listing {0} not found")]
    Missing(i64),
    #[error("row decode error: {0}")]
    Decode(String),
}

// endregion: --- Store Error

// region:    --- Listing Store Trait

/// 매물 저장소 트레이트
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// 매물 등록(OPEN 상태로 저장)
    async fn insert_listing(&self, listing: NewListing) -> Result<Listing, StoreError>;

    /// 매물 단건 조회(오퍼 포함)
    async fn find_listing(&self, listing_id: i64) -> Result<Option<Listing>, StoreError>;

    /// 전체 매물 조회(최신 등록 순)
    async fn list_all(&self) -> Result<Vec<Listing>, StoreError>;

    /// 오퍼 추가(삽입 순서 유지)
    async fn append_offer(&self, listing_id: i64, offer: NewOffer) -> Result<Offer, StoreError>;

    /// 낙관적 조건부 업데이트로 낙찰 처리
    /// OPEN 상태일 때만 SOLD로 전환하며, 경합에서 진 호출은 false를 받는다.
    async fn settle_if_open(&self, listing_id: i64, offer_id: i64) -> Result<bool, StoreError>;

    /// 매물 삭제(오퍼 포함). 존재하지 않으면 false
    async fn delete_listing(&self, listing_id: i64) -> Result<bool, StoreError>;

    /// 저장소 연결 상태
    async fn healthy(&self) -> bool;
}

// endregion: --- Listing Store Trait
