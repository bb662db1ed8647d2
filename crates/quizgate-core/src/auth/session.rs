use serde::{Deserialize, Serialize};

/// Identity record returned by the login exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Administrative capability flag.
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    pub fn new(id: i64, is_admin: bool) -> Self {
        Self {
            id,
            username: None,
            full_name: None,
            email: None,
            is_admin,
        }
    }

    /// Name to show in the UI, falling back from full name to username to id.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.username.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

/// An authenticated identity: bearer token plus the user it belongs to.
///
/// Both fields are always present together. The logged-out state is
/// `Option::<Session>::None`, so a half session cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.user.is_admin
    }
}

/// Successful body of the login exchange.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Session::new(resp.access_token, resp.user)
    }
}
