//! Viewer identity.
//!
//! Every read takes the viewer so that per-viewer fields (`my_vote`,
//! `is_following`) can be joined in. Session issuance lives upstream; at the
//! HTTP boundary the upstream auth service hands us a [`ViewerToken`] signed
//! with a shared secret, which we only verify.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::ids::UserId;

/// Who is looking at the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Viewer {
    /// No authenticated identity; derived fields take neutral values.
    #[default]
    Anonymous,
    /// An authenticated user.
    User(UserId),
}

impl Viewer {
    /// Build from the `(userID, isAuthenticated)` pair handed over by the
    /// authentication layer.
    pub fn from_parts(user_id: Option<UserId>, is_authenticated: bool) -> Self {
        match (user_id, is_authenticated) {
            (Some(id), true) => Self::User(id),
            _ => Self::Anonymous,
        }
    }

    /// The authenticated user id, if any.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous => None,
        }
    }

    /// Whether the viewer is authenticated.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

/// Error verifying a viewer token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewerTokenError {
    /// Token is not `<user_id>.<hex mac>`.
    #[error("malformed viewer token")]
    Malformed,
    /// MAC does not match the claimed user id.
    #[error("viewer token signature mismatch")]
    BadSignature,
}

/// HMAC-SHA256 signed viewer identity: `<user_id>.<32 hex chars>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerToken(String);

impl ViewerToken {
    const TOKEN_VERSION: &'static str = "forum_viewer_v1";

    fn mac(secret: &[u8], user_id: UserId) -> Hmac<Sha256> {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret)
            .expect("HMAC accepts any key size");
        mac.update(format!("{}|{}", user_id.get(), Self::TOKEN_VERSION).as_bytes());
        mac
    }

    /// Sign a viewer token for `user_id`.
    pub fn issue(secret: &[u8], user_id: UserId) -> Self {
        let digest = Self::mac(secret, user_id).finalize().into_bytes();
        Self(format!("{}.{}", user_id.get(), hex::encode(&digest[..16])))
    }

    /// Verify `token` and return the user id it was issued for.
    pub fn verify(secret: &[u8], token: &str) -> Result<UserId, ViewerTokenError> {
        let (id_part, mac_part) = token.split_once('.').ok_or(ViewerTokenError::Malformed)?;
        let user_id: UserId = id_part.parse().map_err(|_| ViewerTokenError::Malformed)?;
        let given = hex::decode(mac_part).map_err(|_| ViewerTokenError::Malformed)?;
        if given.len() != 16 {
            return Err(ViewerTokenError::Malformed);
        }

        let expected = Self::mac(secret, user_id).finalize().into_bytes();
        // Constant-time comparison
        let matches = given
            .iter()
            .zip(expected[..16].iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0;

        if matches {
            Ok(user_id)
        } else {
            Err(ViewerTokenError::BadSignature)
        }
    }

    /// Token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_viewer_secret_32_bytes_min!";

    #[test]
    fn test_from_parts() {
        assert_eq!(Viewer::from_parts(Some(UserId::new(3)), true), Viewer::User(UserId::new(3)));
        assert_eq!(Viewer::from_parts(Some(UserId::new(3)), false), Viewer::Anonymous);
        assert_eq!(Viewer::from_parts(None, true), Viewer::Anonymous);
        assert!(!Viewer::Anonymous.is_authenticated());
    }

    #[test]
    fn test_token_verifies() {
        let token = ViewerToken::issue(SECRET, UserId::new(42));
        assert!(token.as_str().starts_with("42."));
        assert_eq!(ViewerToken::verify(SECRET, token.as_str()), Ok(UserId::new(42)));
    }

    #[test]
    fn test_token_is_unforgeable() {
        let token = ViewerToken::issue(SECRET, UserId::new(42));
        let mac = token.as_str().split_once('.').unwrap().1;
        let forged = format!("43.{}", mac);
        assert_eq!(
            ViewerToken::verify(SECRET, &forged),
            Err(ViewerTokenError::BadSignature)
        );
        assert_eq!(
            ViewerToken::verify(b"another_secret", token.as_str()),
            Err(ViewerTokenError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        for bad in ["", "42", "abc.def", "42.zz", "42.abcd"] {
            assert_eq!(ViewerToken::verify(SECRET, bad), Err(ViewerTokenError::Malformed));
        }
    }
}
