use crate::domain::payment::UserDetails;
use crate::error::RechargeError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_NAME_HEADER: &str = "X-User-Name";
pub const USER_EMAIL_HEADER: &str = "X-User-Email";

/// Identity forwarded by the session layer in front of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Caller {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: None,
            email: None,
        }
    }

    pub fn user_details(&self, contact: Option<String>) -> UserDetails {
        UserDetails {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            contact,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = RechargeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let user_id = header(USER_ID_HEADER).ok_or(RechargeError::Unauthenticated)?;
        Ok(Caller {
            user_id,
            name: header(USER_NAME_HEADER),
            email: header(USER_EMAIL_HEADER),
        })
    }
}
