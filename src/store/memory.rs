/// 메모리 매물 저장소
/// 데이터베이스 없이 기동할 때의 대체 저장소이자 테스트/데모 기반.
/// 쓰기 락 안에서 상태 전이를 확인하므로 Postgres 조건부 업데이트와
/// 같은 원자성 보장을 제공한다.
// region:    --- Imports
use super::{ListingStore, StoreError};
use crate::listing::model::{Listing, ListingStatus, NewListing, NewOffer, Offer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

// endregion: --- Imports

// region:    --- Memory Listing Store

pub struct MemoryListingStore {
    listings: RwLock<HashMap<i64, Listing>>,
    next_listing_id: AtomicI64,
    next_offer_id: AtomicI64,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            next_listing_id: AtomicI64::new(1),
            next_offer_id: AtomicI64::new(1),
        }
    }

    /// 픽스처 주입(데모/테스트용). id 카운터를 픽스처 너머로 밀어 둔다
    pub async fn insert_fixture(&self, listing: Listing) {
        let mut listings = self.listings.write().await;

        let next_listing = self
            .next_listing_id
            .load(Ordering::SeqCst)
            .max(listing.id + 1);
        self.next_listing_id.store(next_listing, Ordering::SeqCst);

        let max_offer_id = listing.offers.iter().map(|o| o.id).max().unwrap_or(0);
        let next_offer = self
            .next_offer_id
            .load(Ordering::SeqCst)
            .max(max_offer_id + 1);
        self.next_offer_id.store(next_offer, Ordering::SeqCst);

        listings.insert(listing.id, listing);
    }
}

impl Default for MemoryListingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn insert_listing(&self, listing: NewListing) -> Result<Listing, StoreError> {
        let id = self.next_listing_id.fetch_add(1, Ordering::SeqCst);
        let listing = Listing {
            id,
            seller_id: listing.seller_id,
            seller_name: listing.seller_name,
            image_url: listing.image_url,
            title: listing.title,
            description: listing.description,
            category: listing.category,
            status: ListingStatus::Open,
            start_price: listing.start_price,
            floor_price: listing.floor_price,
            starts_at: listing.starts_at,
            offer_window_ends_at: listing.offer_window_ends_at,
            accepted_offer_id: None,
            created_at: listing.created_at,
            offers: vec![],
        };

        let mut listings = self.listings.write().await;
        listings.insert(id, listing.clone());
        Ok(listing)
    }

    async fn find_listing(&self, listing_id: i64) -> Result<Option<Listing>, StoreError> {
        let listings = self.listings.read().await;
        Ok(listings.get(&listing_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Listing>, StoreError> {
        let listings = self.listings.read().await;
        let mut all: Vec<Listing> = listings.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn append_offer(&self, listing_id: i64, offer: NewOffer) -> Result<Offer, StoreError> {
        let mut listings = self.listings.write().await;
        let listing = listings
            .get_mut(&listing_id)
            .ok_or(StoreError::Missing(listing_id))?;

        let offer = Offer {
            id: self.next_offer_id.fetch_add(1, Ordering::SeqCst),
            bidder_name: offer.bidder_name,
            amount: offer.amount,
            created_at: offer.created_at,
        };
        listing.offers.push(offer.clone());
        Ok(offer)
    }

    async fn settle_if_open(&self, listing_id: i64, offer_id: i64) -> Result<bool, StoreError> {
        // 쓰기 락이 상태 확인과 전이를 한 단위로 묶는다
        let mut listings = self.listings.write().await;
        let Some(listing) = listings.get_mut(&listing_id) else {
            return Ok(false);
        };

        if listing.status != ListingStatus::Open {
            return Ok(false);
        }
        listing.status = ListingStatus::Sold;
        listing.accepted_offer_id = Some(offer_id);
        Ok(true)
    }

    async fn delete_listing(&self, listing_id: i64) -> Result<bool, StoreError> {
        let mut listings = self.listings.write().await;
        Ok(listings.remove(&listing_id).is_some())
    }

    async fn healthy(&self) -> bool {
        true
    }
}

// endregion: --- Memory Listing Store

// region:    --- Tests


// endregion: --- Tests
