use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// Newsroom roles, parsed from the role string the identity service emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Writer,
    Reader,
}

impl Role {
    /// Case-insensitive parse. Unknown role strings fold to `Reader`, the
    /// least-privileged role, rather than failing.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "writer" => Role::Writer,
            _ => Role::Reader,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Writer => "writer",
            Role::Reader => "reader",
        }
    }

    /// Only staff roles see the notification bell at all. Readers get no
    /// notification surface; the embedding layout consults this before
    /// rendering it.
    pub fn sees_notifications(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Writer)
    }
}

/// JWT claims carried by the bearer token the client is configured with.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Who the client is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid bearer token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("invalid subject in token: {0}")]
    InvalidSubject(#[from] uuid::Error),
}

/// Decode the identity baked into a bearer token. The token's signature is
/// the server's to verify; the client only reads the claims, but it does
/// reject expired tokens up front.
pub fn decode_identity(token: &str) -> Result<Identity, SessionError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    let user_id = Uuid::parse_str(&data.claims.sub)?;

    Ok(Identity {
        user_id,
        role: Role::parse(&data.claims.role),
    })
}

/// Authentication state observed by the rest of the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Identity),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            SessionState::Authenticated(identity) => Some(identity.role),
            SessionState::Anonymous => None,
        }
    }
}

/// Owner of the authentication state. The fetcher and the live update
/// listener hold watch receivers from here: the fetcher skips network work
/// while the state is `Anonymous`, and the listener tears itself down when
/// the state transitions to it.
pub struct Session {
    state: watch::Sender<SessionState>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            state: watch::channel(SessionState::Anonymous).0,
        }
    }

    /// Start an authenticated session from a configured bearer token.
    pub fn from_token(token: &str) -> Result<Self, SessionError> {
        let identity = decode_identity(token)?;
        info!(
            "session started for user {} with role {}",
            identity.user_id,
            identity.role.as_str()
        );
        Ok(Self {
            state: watch::channel(SessionState::Authenticated(identity)).0,
        })
    }

    pub fn authenticate(&self, identity: Identity) {
        self.state
            .send_replace(SessionState::Authenticated(identity));
    }

    pub fn logout(&self) {
        info!("session ended");
        self.state.send_replace(SessionState::Anonymous);
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}
