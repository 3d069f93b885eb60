use secrecy::{
    ExposeSecret,
    SecretString,
};

/// Authenticated context of the caller, as issued by the identity provider.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Option<String>,
    pub access_token: Option<SecretString>,
}

impl Session {
    pub fn new(user: Option<String>, access_token: Option<SecretString>) -> Self {
        Self { user, access_token }
    }

    /// The provider token, if present and non-blank.
    pub fn token(&self) -> Option<&SecretString> {
        self.access_token
            .as_ref()
            .filter(|token| !token.expose_secret().trim().is_empty())
    }
}

/// Raw credential material pulled off an inbound request.
///
/// The web layer fills this in from headers; the identity gate decides what,
/// if anything, it proves.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub bearer_token: Option<SecretString>,
    pub forwarded_user: Option<String>,
    pub forwarded_access_token: Option<SecretString>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(SecretString::from(token.into())),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}
