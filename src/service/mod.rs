//! Forum REST Service
//!
//! Exposes the forum core over HTTP. Handlers are generic over
//! [`ForumStore`](crate::store::ForumStore), so the same router serves the
//! PostgreSQL store in production and the in-memory store in tests.
//!
//! ## Endpoints
//!
//! - `GET /posts`, `POST /posts` - List and create posts
//! - `GET|PUT|DELETE /posts/:id` - Read, edit, soft-delete a post
//! - `POST /posts/:id/vote` - Vote on a post
//! - `POST /posts/:id/pin-comment` - Pin or unpin a comment
//! - `GET /comments`, `POST /comments` - List and create comments
//! - `GET|PUT|DELETE /comments/:id` - Read, edit, soft-delete a comment
//! - `POST /comments/:id/vote` - Vote on a comment
//! - `GET /topics`, `GET /topics-summary`, `GET /topics/:slug` - Topic reads
//! - `POST /topics/:slug/follow` - Follow or unfollow a topic
//! - `GET /users`, `GET /users/:username` - User reads
//! - `GET /health`, `GET /health/live`, `GET /health/ready` - Probes
//!
//! Mutations need an `X-Viewer-Token` header signed with the shared viewer
//! secret.

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_viewer_auth, record_vote, request_id_middleware};
pub use routes::{create_router, ApiError, ErrorResponse, RequestContext};
pub use state::{ServiceState, VIEWER_TOKEN_HEADER};
