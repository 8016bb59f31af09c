/// 실시간 목록 전파
/// 변경이 생길 때마다 전체 목록 스냅샷을 WebSocket 구독자에게 밀어낸다.
/// 전달은 손실 허용(lossy)이고, 느린 구독자는 중간 프레임을 건너뛴다.
// region:    --- Imports
use crate::listing::view::ListingView;
use crate::store::ListingStore;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

// endregion: --- Imports

/// 목록 변경 이벤트 이름(클라이언트 계약)
pub const LISTINGS_UPDATED: &str = "listings:updated";

/// 구독자당 보관할 미수신 프레임 수. 밀리면 오래된 프레임부터 버린다
const CHANNEL_CAPACITY: usize = 64;

// region:    --- Publisher

/// 이벤트 발행 트레이트
#[async_trait]
pub trait ListingPublisher: Send + Sync {
    async fn publish(&self, event: &str, payload: Value) -> Result<(), String>;
}

/// 프로세스 내 broadcast 채널 구현체
/// 구독자는 `{"event": …, "payload": …}` 형태의 직렬화 프레임을 받는다.
#[derive(Clone)]
pub struct ChannelPublisher {
    sender: broadcast::Sender<String>,
}

impl ChannelPublisher {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        ChannelPublisher { sender }
    }

    /// 새 구독 수신기 반환
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

impl Default for ChannelPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingPublisher for ChannelPublisher {
    async fn publish(&self, event: &str, payload: Value) -> Result<(), String> {
        let frame = json!({ "event": event, "payload": payload }).to_string();

        // 구독자가 없으면 send가 Err를 돌려주지만 유실 허용 채널에서는 정상이다
        match self.sender.send(frame) {
            Ok(receivers) => {
                debug!(
                    "{:<12} --> 이벤트 발행: event={}, 구독자 {}명",
                    "Fanout", event, receivers
                );
                Ok(())
            }
            Err(_) => Ok(()),
        }
    }
}

/// 전체 목록 스냅샷을 구독자에게 전파한다
/// 전파 실패가 명령 처리를 되돌리지는 않는다. 기록만 남긴다
pub async fn broadcast_listings(
    publisher: &dyn ListingPublisher,
    store: &dyn ListingStore,
    now: DateTime<Utc>,
) {
    let listings = match store.list_all().await {
        Ok(listings) => listings,
        Err(e) => {
            warn!("{:<12} --> 목록 조회 실패로 전파 생략: {}", "Fanout", e);
            return;
        }
    };

    let views: Vec<ListingView> = listings
        .iter()
        .map(|listing| ListingView::render(listing, now))
        .collect();
    let payload = match serde_json::to_value(views) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("{:<12} --> 목록 직렬화 실패로 전파 생략: {}", "Fanout", e);
            return;
        }
    };

    if let Err(e) = publisher.publish(LISTINGS_UPDATED, payload).await {
        warn!("{:<12} --> 목록 전파 실패: {}", "Fanout", e);
    }
}

// endregion: --- Publisher

// region:    --- Subscriber

/// WebSocket 구독 루프
/// 접속 직후 connected 프레임을 보내고, 이후 발행 프레임을 그대로 중계한다.
pub async fn subscriber_loop(mut socket: WebSocket, mut updates: broadcast::Receiver<String>) {
    let hello = json!({ "event": "connected", "payload": { "ok": true } }).to_string();
    if socket.send(Message::Text(hello)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(frame) => {
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "{:<12} --> 느린 구독자: 프레임 {}개 건너뜀",
                        "Fanout", skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                // 클라이언트 발신 메시지는 받되 해석하지 않는다
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    debug!("{:<12} --> 구독 종료", "Fanout");
}

// endregion: --- Subscriber

// region:    --- Tests


// endregion: --- Tests
