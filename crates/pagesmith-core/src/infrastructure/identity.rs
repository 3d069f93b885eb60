use async_trait::async_trait;
use secrecy::{
    ExposeSecret,
    SecretString,
};

use crate::domain::{
    Credentials,
    Session,
};

/// Source of the caller's session.
///
/// Returning `None` means the caller is not authenticated. A returned session
/// may still lack an access token; the orchestrator rejects those too.
#[async_trait]
pub trait IdentityGate: Send + Sync {
    async fn current_session(&self, credentials: &Credentials) -> Option<Session>;
}

/// Builds sessions from request headers.
///
/// A bearer token is taken as the caller's GitHub access token. When the
/// service runs behind an authenticating proxy, the proxy's forwarded user and
/// access token can be trusted instead.
#[derive(Debug, Clone, Default)]
pub struct HeaderIdentityGate {
    trust_forwarded_headers: bool,
}

impl HeaderIdentityGate {
    pub fn new(trust_forwarded_headers: bool) -> Self {
        Self {
            trust_forwarded_headers,
        }
    }
}

fn non_blank(token: &Option<SecretString>) -> Option<SecretString> {
    token
        .as_ref()
        .filter(|t| !t.expose_secret().trim().is_empty())
        .cloned()
}

#[async_trait]
impl IdentityGate for HeaderIdentityGate {
    async fn current_session(&self, credentials: &Credentials) -> Option<Session> {
        if self.trust_forwarded_headers {
            let user = credentials
                .forwarded_user
                .as_ref()
                .map(|u| u.trim())
                .filter(|u| !u.is_empty())
                .map(str::to_string);
            let token = non_blank(&credentials.forwarded_access_token);

            if user.is_some() || token.is_some() {
                return Some(Session::new(
                    user,
                    token.or_else(|| non_blank(&credentials.bearer_token)),
                ));
            }
        }

        non_blank(&credentials.bearer_token).map(|token| Session::new(None, Some(token)))
    }
}
