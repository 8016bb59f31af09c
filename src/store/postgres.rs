// region:    --- Imports
use super::{queries, ListingStore, StoreError};
use crate::listing::model::{Listing, NewListing, NewOffer, Offer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Row Models

/// listings 테이블 행
#[derive(Debug, FromRow)]
struct ListingRecord {
    id: i64,
    seller_id: Option<i64>,
    seller_name: String,
    image_url: Option<String>,
    title: String,
    description: String,
    category: String,
    status: String,
    start_price: f64,
    floor_price: f64,
    starts_at: DateTime<Utc>,
    offer_window_ends_at: DateTime<Utc>,
    accepted_offer_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl ListingRecord {
    fn into_listing(self, offers: Vec<Offer>) -> Result<Listing, StoreError> {
        let category = self.category.parse().map_err(StoreError::Decode)?;
        let status = self.status.parse().map_err(StoreError::Decode)?;
        Ok(Listing {
            id: self.id,
            seller_id: self.seller_id,
            seller_name: self.seller_name,
            image_url: self.image_url,
            title: self.title,
            description: self.description,
            category,
            status,
            start_price: self.start_price,
            floor_price: self.floor_price,
            starts_at: self.starts_at,
            offer_window_ends_at: self.offer_window_ends_at,
            accepted_offer_id: self.accepted_offer_id,
            created_at: self.created_at,
            offers,
        })
    }
}

/// offers 테이블 행(매물별 묶음 조회용)
#[derive(Debug, FromRow)]
struct OfferRow {
    id: i64,
    listing_id: i64,
    bidder_name: String,
    amount: f64,
    created_at: DateTime<Utc>,
}

// endregion: --- Row Models

// region:    --- Postgres Listing Store

/// Postgres 매물 저장소
pub struct PostgresListingStore {
    pool: Arc<PgPool>,
}

impl PostgresListingStore {
    /// 커넥션 풀 생성
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn from_pool(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 스키마 초기화
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema_sql = include_str!("../sql/schema.sql");
        for query in schema_sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }

    /// 매물별 오퍼 묶음 조회
    async fn offers_for(&self, listing_ids: &[i64]) -> Result<HashMap<i64, Vec<Offer>>, StoreError> {
        if listing_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OfferRow>(queries::GET_OFFERS_FOR_LISTINGS)
            .bind(listing_ids)
            .fetch_all(&*self.pool)
            .await?;

        let mut grouped: HashMap<i64, Vec<Offer>> = HashMap::new();
        for row in rows {
            grouped.entry(row.listing_id).or_default().push(Offer {
                id: row.id,
                bidder_name: row.bidder_name,
                amount: row.amount,
                created_at: row.created_at,
            });
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ListingStore for PostgresListingStore {
    async fn insert_listing(&self, listing: NewListing) -> Result<Listing, StoreError> {
        let record = sqlx::query_as::<_, ListingRecord>(queries::INSERT_LISTING)
            .bind(listing.seller_id)
            .bind(&listing.seller_name)
            .bind(&listing.image_url)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(listing.category.as_str())
            .bind(listing.start_price)
            .bind(listing.floor_price)
            .bind(listing.starts_at)
            .bind(listing.offer_window_ends_at)
            .bind(listing.created_at)
            .fetch_one(&*self.pool)
            .await?;
        record.into_listing(vec![])
    }

    async fn find_listing(&self, listing_id: i64) -> Result<Option<Listing>, StoreError> {
        let record = sqlx::query_as::<_, ListingRecord>(queries::GET_LISTING)
            .bind(listing_id)
            .fetch_optional(&*self.pool)
            .await?;

        match record {
            Some(record) => {
                let mut offers = self.offers_for(&[listing_id]).await?;
                let offers = offers.remove(&listing_id).unwrap_or_default();
                Ok(Some(record.into_listing(offers)?))
            }
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Listing>, StoreError> {
        let records = sqlx::query_as::<_, ListingRecord>(queries::GET_ALL_LISTINGS)
            .fetch_all(&*self.pool)
            .await?;

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let mut offers = self.offers_for(&ids).await?;

        let mut listings = Vec::with_capacity(records.len());
        for record in records {
            let listing_offers = offers.remove(&record.id).unwrap_or_default();
            listings.push(record.into_listing(listing_offers)?);
        }
        Ok(listings)
    }

    async fn append_offer(&self, listing_id: i64, offer: NewOffer) -> Result<Offer, StoreError> {
        let offer = sqlx::query_as::<_, Offer>(queries::INSERT_OFFER)
            .bind(listing_id)
            .bind(&offer.bidder_name)
            .bind(offer.amount)
            .bind(offer.created_at)
            .fetch_one(&*self.pool)
            .await?;
        Ok(offer)
    }

    async fn settle_if_open(&self, listing_id: i64, offer_id: i64) -> Result<bool, StoreError> {
        // OPEN 상태에서만 행이 갱신된다. 경합에서 진 호출은 빈 결과를 받는다
        let settled = sqlx::query_scalar::<_, i64>(queries::SETTLE_LISTING)
            .bind(listing_id)
            .bind(offer_id)
            .fetch_optional(&*self.pool)
            .await?;

        if settled.is_some() {
            info!(
                "{:<12} --> 낙찰 확정: listing={}, offer={}",
                "Store", listing_id, offer_id
            );
        }
        Ok(settled.is_some())
    }

    async fn delete_listing(&self, listing_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::DELETE_LISTING)
            .bind(listing_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn healthy(&self) -> bool {
        sqlx::query(queries::PING).execute(&*self.pool).await.is_ok()
    }
}

// endregion: --- Postgres Listing Store
