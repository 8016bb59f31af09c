/// 호출자 식별
/// 토큰 발급/세션 관리는 외부 시스템 몫이고, 여기서는 불투명 토큰을
/// 주체(Principal)로 바꾸는 경계만 둔다.
// region:    --- Imports
use crate::error::ApiError;
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::collections::HashMap;
use tracing::warn;

// endregion: --- Imports

// region:    --- Principal

/// 인증된 호출 주체
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub display_name: String,
}

// endregion: --- Principal

// region:    --- Identity Provider

/// 토큰 검증 트레이트
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> Option<Principal>;
}

/// 정적 토큰 테이블 구현체
/// 운영 배포에서는 실제 인증 서비스가 같은 트레이트 뒤에 들어간다.
pub struct TokenRegistry {
    tokens: HashMap<String, Principal>,
}

impl TokenRegistry {
    pub fn new(tokens: HashMap<String, Principal>) -> Self {
        Self { tokens }
    }

    /// AUTH_TOKENS 환경변수에서 로드
    /// 형식: "token:id:표시이름"을 쉼표로 나열. 미설정이면 데모 토큰으로 대체
    pub fn from_env() -> Self {
        match std::env::var("AUTH_TOKENS") {
            Ok(raw) => {
                let tokens = parse_auth_tokens(&raw);
                if tokens.is_empty() {
                    warn!(
                        "{:<12} --> AUTH_TOKENS 파싱 결과가 비어 있음: 데모 토큰 사용",
                        "Identity"
                    );
                    Self::demo()
                } else {
                    Self::new(tokens)
                }
            }
            Err(_) => {
                warn!(
                    "{:<12} --> AUTH_TOKENS 미설정: 데모 토큰 사용(운영 환경에서는 반드시 설정)",
                    "Identity"
                );
                Self::demo()
            }
        }
    }

    /// 데모 계정 토큰(데모 픽스처의 판매자/입찰자와 id가 맞물린다)
    pub fn demo() -> Self {
        let entries = [
            ("demo-maya", 1, "[DEMO] Maya Mentor"),
            ("demo-noah", 2, "[DEMO] Noah Fixit"),
            ("demo-ava", 3, "[DEMO] Ava Student"),
            ("demo-liam", 4, "[DEMO] Liam Student"),
            ("demo-zoe", 5, "[DEMO] Zoe Student"),
        ];
        let tokens = entries
            .into_iter()
            .map(|(token, id, name)| {
                (
                    token.to_string(),
                    Principal {
                        id,
                        display_name: name.to_string(),
                    },
                )
            })
            .collect();
        Self { tokens }
    }
}

#[async_trait]
impl IdentityProvider for TokenRegistry {
    async fn authenticate(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).cloned()
    }
}

/// "token:id:표시이름" 나열 파싱. 형식이 깨진 항목은 건너뛴다
fn parse_auth_tokens(raw: &str) -> HashMap<String, Principal> {
    let mut tokens = HashMap::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let mut parts = entry.splitn(3, ':');
        let (Some(token), Some(id), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            warn!("{:<12} --> AUTH_TOKENS 항목 형식 오류: {}", "Identity", entry);
            continue;
        };
        let Ok(id) = id.parse::<i64>() else {
            warn!("{:<12} --> AUTH_TOKENS id 파싱 실패: {}", "Identity", entry);
            continue;
        };
        tokens.insert(
            token.to_string(),
            Principal {
                id,
                display_name: name.to_string(),
            },
        );
    }
    tokens
}

// endregion: --- Identity Provider

// region:    --- Request Auth

/// Authorization 헤더에서 Bearer 토큰 추출(스킴은 대소문자 무시)
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// 요청 헤더에서 호출 주체를 확정한다. 실패는 일괄 401
pub async fn require_principal(
    identity: &dyn IdentityProvider,
    headers: &HeaderMap,
) -> Result<Principal, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    identity
        .authenticate(token)
        .await
        .ok_or(ApiError::Unauthorized)
}

// endregion: --- Request Auth

// region:    --- Tests


// endregion: --- Tests
