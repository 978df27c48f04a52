//! Service state management.

use axum::http::HeaderMap;
use std::sync::Arc;

use crate::store::ForumStore;
use crate::types::{UserId, Viewer, ViewerToken, ViewerTokenError};

/// Header carrying the signed viewer token.
pub const VIEWER_TOKEN_HEADER: &str = "x-viewer-token";

/// Shared service state.
///
/// Contains the forum store and the secret viewer tokens are signed with.
pub struct ServiceState<S: ForumStore> {
    /// The forum store.
    pub store: Arc<S>,
    /// HMAC secret shared with the upstream auth service.
    viewer_secret: Arc<Vec<u8>>,
}

impl<S: ForumStore> ServiceState<S> {
    /// Create new service state with a store and viewer-token secret.
    ///
    /// # Arguments
    /// * `store` - The forum store backend
    /// * `viewer_secret` - Secret for verifying viewer tokens (32+ bytes recommended)
    pub fn new(store: S, viewer_secret: Vec<u8>) -> Self {
        Self {
            store: Arc::new(store),
            viewer_secret: Arc::new(viewer_secret),
        }
    }

    /// Create service state from environment variables.
    ///
    /// Reads `FORUM_VIEWER_SECRET` from environment.
    /// Falls back to a fixed secret if not set (development mode).
    pub fn from_env(store: S) -> Self {
        let viewer_secret = match std::env::var("FORUM_VIEWER_SECRET") {
            Ok(s) if !s.is_empty() => s.into_bytes(),
            _ => {
                tracing::warn!(
                    "FORUM_VIEWER_SECRET not set, using development secret. \
                     Set this for production!"
                );
                b"development_only_secret_not_for_production".to_vec()
            }
        };
        Self::new(store, viewer_secret)
    }

    /// Sign a viewer token, for tooling and tests.
    pub fn issue_viewer_token(&self, user_id: UserId) -> ViewerToken {
        ViewerToken::issue(&self.viewer_secret, user_id)
    }

    /// Resolve the viewer of a request.
    ///
    /// No token means an anonymous viewer; a token that fails verification is
    /// an error rather than a silent downgrade.
    pub fn viewer(&self, headers: &HeaderMap) -> Result<Viewer, ViewerTokenError> {
        let Some(raw) = headers.get(VIEWER_TOKEN_HEADER) else {
            return Ok(Viewer::Anonymous);
        };
        let token = raw.to_str().map_err(|_| ViewerTokenError::Malformed)?;
        ViewerToken::verify(&self.viewer_secret, token.trim()).map(Viewer::User)
    }
}

impl<S: ForumStore> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            viewer_secret: Arc::clone(&self.viewer_secret),
        }
    }
}
