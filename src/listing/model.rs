use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// 매물 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Textbook,
    Dorm,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Textbook => "textbook",
            Category::Dorm => "dorm",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "textbook" => Ok(Category::Textbook),
            "dorm" => Ok(Category::Dorm),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

// 매물 상태: OPEN에서 accept-offer로만 SOLD가 된다. CLOSED는 종료 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingStatus {
    Open,
    Sold,
    Closed,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Open => "OPEN",
            ListingStatus::Sold => "SOLD",
            ListingStatus::Closed => "CLOSED",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(ListingStatus::Open),
            "SOLD" => Ok(ListingStatus::Sold),
            "CLOSED" => Ok(ListingStatus::Closed),
            other => Err(format!("unknown listing status: {other}")),
        }
    }
}

// 매물 모델
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: i64,
    pub seller_id: Option<i64>,
    pub seller_name: String,
    pub image_url: Option<String>,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: ListingStatus,
    pub start_price: f64,
    pub floor_price: f64,
    pub starts_at: DateTime<Utc>,
    pub offer_window_ends_at: DateTime<Utc>,
    pub accepted_offer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub offers: Vec<Offer>,
}

// 오퍼 모델(입찰자 이름은 항상 인증 주체에서 복사된다)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: i64,
    pub bidder_name: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

// 매물 등록 페이로드(상태는 항상 OPEN으로 저장된다)
#[derive(Debug, Clone)]
pub struct NewListing {
    pub seller_id: Option<i64>,
    pub seller_name: String,
    pub image_url: Option<String>,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub start_price: f64,
    pub floor_price: f64,
    pub starts_at: DateTime<Utc>,
    pub offer_window_ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// 오퍼 추가 페이로드
#[derive(Debug, Clone)]
pub struct NewOffer {
    pub bidder_name: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}
