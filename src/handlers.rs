/// HTTP/WebSocket 핸들러와 라우터
// region:    --- Imports
use crate::error::ApiError;
use crate::fanout::{self, ChannelPublisher};
use crate::identity::{bearer_token, require_principal, IdentityProvider};
use crate::listing::commands::{self, AcceptOfferCommand, CreateListingCommand, PlaceOfferCommand};
use crate::listing::view::ListingView;
use crate::store::ListingStore;
use axum::extract::{DefaultBodyLimit, Path, Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

/// 핸들러 공유 상태: (저장소, 인증, 실시간 발행기)
pub type AppState = (
    Arc<dyn ListingStore>,
    Arc<dyn IdentityProvider>,
    Arc<ChannelPublisher>,
);

// 인라인 이미지(base64 data URL)를 담는 등록 본문 허용치
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

// region:    --- Router

pub fn routes(state: AppState) -> Router {
    // 브라우저 클라이언트를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/listings",
            get(handle_get_listings).post(handle_create_listing),
        )
        .route("/listings/:id/offers", post(handle_place_offer))
        .route("/listings/:id/accept-offer", post(handle_accept_offer))
        .route("/listings/:id", delete(handle_delete_listing))
        .route("/ws", get(handle_ws))
        .layer(cors)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}

// endregion: --- Router

// region:    --- Query Handlers

/// 헬스 체크(항상 200, db 연결 상태만 표시)
async fn handle_health(State((store, _, _)): State<AppState>) -> impl IntoResponse {
    let db = if store.healthy().await {
        "connected"
    } else {
        "disconnected"
    };
    Json(json!({ "ok": true, "service": "reverse-auction-api", "db": db }))
}

/// 매물 목록 조회(공개, 최신 등록순)
async fn handle_get_listings(
    State((store, _, _)): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    info!("{:<12} --> 매물 목록 조회", "HandlerQuery");
    let now = Utc::now();
    let listings = store.list_all().await?;
    let views: Vec<ListingView> = listings
        .iter()
        .map(|listing| ListingView::render(listing, now))
        .collect();
    Ok(Json(views))
}

// endregion: --- Query Handlers

// region:    --- Command Handlers

/// 매물 등록 요청 처리
async fn handle_create_listing(
    State((store, identity, publisher)): State<AppState>,
    headers: HeaderMap,
    Json(cmd): Json<CreateListingCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = require_principal(identity.as_ref(), &headers).await?;
    let listing =
        commands::create_listing(store.as_ref(), publisher.as_ref(), &caller, cmd).await?;
    let view = ListingView::render(&listing, Utc::now());
    Ok((StatusCode::CREATED, Json(view)))
}

/// 오퍼 제출 요청 처리
async fn handle_place_offer(
    State((store, identity, publisher)): State<AppState>,
    Path(listing_id): Path<i64>,
    headers: HeaderMap,
    Json(cmd): Json<PlaceOfferCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = require_principal(identity.as_ref(), &headers).await?;
    let offer =
        commands::place_offer(store.as_ref(), publisher.as_ref(), &caller, listing_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

/// 낙찰 요청 처리
async fn handle_accept_offer(
    State((store, identity, publisher)): State<AppState>,
    Path(listing_id): Path<i64>,
    headers: HeaderMap,
    Json(cmd): Json<AcceptOfferCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = require_principal(identity.as_ref(), &headers).await?;
    let settlement =
        commands::accept_offer(store.as_ref(), publisher.as_ref(), &caller, listing_id, cmd)
            .await?;
    Ok(Json(settlement))
}

/// 매물 삭제 요청 처리
async fn handle_delete_listing(
    State((store, identity, publisher)): State<AppState>,
    Path(listing_id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = require_principal(identity.as_ref(), &headers).await?;
    commands::delete_listing(store.as_ref(), publisher.as_ref(), &caller, listing_id).await?;
    Ok(Json(json!({ "ok": true })))
}

// endregion: --- Command Handlers

// region:    --- Realtime

#[derive(Debug, Deserialize)]
struct WsParams {
    #[serde(default)]
    token: Option<String>,
}

/// 실시간 구독 핸드셰이크
/// 토큰은 쿼리(?token=) 우선, 없으면 Authorization 헤더. 인증 실패는
/// 업그레이드 전에 401로 끊는다
async fn handle_ws(
    State((_, identity, publisher)): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let token = params
        .token
        .as_deref()
        .or_else(|| bearer_token(&headers))
        .ok_or(ApiError::Unauthorized)?;
    let principal = identity
        .authenticate(token)
        .await
        .ok_or(ApiError::Unauthorized)?;

    info!(
        "{:<12} --> 실시간 구독 연결: user={}",
        "Fanout", principal.id
    );
    let updates = publisher.subscribe();
    Ok(ws.on_upgrade(move |socket| fanout::subscriber_loop(socket, updates)))
}

// endregion: --- Realtime
