//! Caller identity
//!
//! Sign-in happens upstream; requests arrive with the authenticated user id
//! in the `x-user-id` header.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use std::convert::Infallible;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Identity if the request carries one
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(Identity::new);

        Ok(Self(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn extract(request: Request<()>) -> Option<Identity> {
        let (mut parts, _) = request.into_parts();
        let OptionalIdentity(identity) =
            tokio_test::block_on(OptionalIdentity::from_request_parts(&mut parts, &())).unwrap();
        identity
    }

    #[test]
    fn test_reads_header() {
        let request = Request::builder()
            .header(USER_ID_HEADER, " user-42 ")
            .body(())
            .unwrap();
        assert_eq!(extract(request), Some(Identity::new("user-42")));
    }

    #[test]
    fn test_missing_or_blank_header() {
        assert_eq!(extract(Request::builder().body(()).unwrap()), None);

        let blank = Request::builder().header(USER_ID_HEADER, "").body(()).unwrap();
        assert_eq!(extract(blank), None);
    }
}
