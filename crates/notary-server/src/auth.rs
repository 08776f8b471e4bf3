use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::error::{ServerError, ServerResult};

/// Header carrying the caller's name when a trusted proxy authenticates
/// upstream.
pub const ACTOR_HEADER: &str = "x-notary-actor";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    anonymous: bool,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self { name: "anonymous".into(), anonymous: true }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self { name: name.into(), anonymous: false }
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Actor(String),
    Anonymous,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> ServerResult<Self> {
        match headers.get(ACTOR_HEADER) {
            None => Ok(Self::Anonymous),
            Some(value) => {
                let name = value
                    .to_str()
                    .map_err(|_| ServerError::AuthFailed(format!("{ACTOR_HEADER} is not valid text")))?;
                Ok(Self::Actor(name.to_string()))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Submit,
    Verify,
    Download,
    Read,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Verify => write!(f, "verify"),
            Self::Download => write!(f, "download"),
            Self::Read => write!(f, "read"),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
    async fn authorize(&self, identity: &Identity, action: Action) -> ServerResult<bool>;
}

/// Trusts the actor name forwarded in [`ACTOR_HEADER`].
///
/// Submissions and downloads need a named actor. Content checks may run
/// anonymously when `allow_anonymous_verify` is set.
pub struct TrustedHeaderAuth {
    pub allow_anonymous_verify: bool,
}

#[async_trait]
impl AuthProvider for TrustedHeaderAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Actor(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ServerError::AuthFailed(format!("{ACTOR_HEADER} is empty")));
                }
                Ok(Identity::user(name))
            }
            Credentials::Anonymous => Ok(Identity::anonymous()),
        }
    }

    async fn authorize(&self, identity: &Identity, action: Action) -> ServerResult<bool> {
        Ok(match action {
            Action::Read => true,
            Action::Verify => !identity.is_anonymous() || self.allow_anonymous_verify,
            Action::Submit | Action::Download => !identity.is_anonymous(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn identity_variants() {
        let a = Identity::anonymous();
        assert_eq!(a.name, "anonymous");
        assert!(a.is_anonymous());

        let u = Identity::user("alice");
        assert_eq!(u.name, "alice");
        assert!(!u.is_anonymous());

        // A user literally named "anonymous" is still a named actor.
        assert!(!Identity::user("anonymous").is_anonymous());
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Download.to_string(), "download");
        assert_eq!(Action::Submit.to_string(), "submit");
    }

    #[test]
    fn credentials_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(Credentials::from_headers(&headers).unwrap(), Credentials::Anonymous);

        headers.insert(ACTOR_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(
            Credentials::from_headers(&headers).unwrap(),
            Credentials::Actor("alice".into())
        );
    }

    #[tokio::test]
    async fn trusted_header_rules() {
        let auth = TrustedHeaderAuth { allow_anonymous_verify: true };
        let anon = auth.authenticate(&Credentials::Anonymous).await.unwrap();
        assert!(auth.authorize(&anon, Action::Verify).await.unwrap());
        assert!(auth.authorize(&anon, Action::Read).await.unwrap());
        assert!(!auth.authorize(&anon, Action::Submit).await.unwrap());
        assert!(!auth.authorize(&anon, Action::Download).await.unwrap());

        let alice = auth.authenticate(&Credentials::Actor(" alice ".into())).await.unwrap();
        assert_eq!(alice.name, "alice");
        assert!(auth.authorize(&alice, Action::Download).await.unwrap());
    }

    #[tokio::test]
    async fn anonymous_verify_can_be_disabled() {
        let auth = TrustedHeaderAuth { allow_anonymous_verify: false };
        let anon = Identity::anonymous();
        assert!(!auth.authorize(&anon, Action::Verify).await.unwrap());
    }

    #[tokio::test]
    async fn blank_actor_rejected() {
        let auth = TrustedHeaderAuth { allow_anonymous_verify: true };
        let err = auth.authenticate(&Credentials::Actor("  ".into())).await.unwrap_err();
        assert!(matches!(err, ServerError::AuthFailed(_)));
    }
}
