// region:    --- Imports
use reverse_auction_service::demo;
use reverse_auction_service::fanout::ChannelPublisher;
use reverse_auction_service::handlers;
use reverse_auction_service::identity::{IdentityProvider, TokenRegistry};
use reverse_auction_service::store::memory::MemoryListingStore;
use reverse_auction_service::store::postgres::PostgresListingStore;
use reverse_auction_service::store::ListingStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 저장소 선택: DATABASE_URL이 연결되면 Postgres, 아니면 메모리 모드
    let store: Arc<dyn ListingStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => match PostgresListingStore::connect(&url).await {
            Ok(store) => {
                store.initialize_schema().await?;
                info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
                Arc::new(store)
            }
            Err(e) => {
                error!("{:<12} --> 데이터베이스 연결 실패: {:?}", "Main", e);
                warn!("{:<12} --> 메모리 저장소로 대체 기동", "Main");
                memory_store().await
            }
        },
        Err(_) => {
            warn!("{:<12} --> DATABASE_URL 미설정: 메모리 저장소로 기동", "Main");
            memory_store().await
        }
    };

    // 인증 토큰 테이블과 실시간 발행기
    let identity: Arc<dyn IdentityProvider> = Arc::new(TokenRegistry::from_env());
    let publisher = Arc::new(ChannelPublisher::new());

    // 라우터 설정
    let routes_all = handlers::routes((store, identity, publisher));

    // 리스너 생성
    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(4000);
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

/// 메모리 모드 기동(SEED_DEMO가 켜져 있으면 데모 픽스처 적재)
async fn memory_store() -> Arc<dyn ListingStore> {
    let store = MemoryListingStore::new();
    if matches!(
        std::env::var("SEED_DEMO").as_deref(),
        Ok("1") | Ok("true")
    ) {
        demo::seed(&store).await;
    }
    Arc::new(store)
}
// endregion: --- Main
