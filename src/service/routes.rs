//! Axum routes for the forum service.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Json, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ForumError;
use crate::query::{
    ListCommentsRequest, ListPostsRequest, ListTopicsRequest, ListUsersRequest, Paged,
};
use crate::store::ForumStore;
use crate::types::{
    topic_name_from_slug, validate_pin_target, Comment, CommentId, NewComment, NewPost, Post,
    PostId, PostUpdate, Topic, TopicId, TopicSummary, User, UserId, Viewer, VoteTally,
    VoteValue,
};

use super::middleware::{record_viewer_auth, record_vote, REQUEST_ID_HEADER};
use super::state::{ServiceState, VIEWER_TOKEN_HEADER};

type AppState<S> = State<Arc<ServiceState<S>>>;
type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /posts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    /// Topic the post is filed under.
    pub topic_id: TopicId,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
}

/// Body of `PUT /posts/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    /// New title.
    pub title: String,
    /// New body.
    pub content: String,
}

/// Body of `POST /comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    /// Post being discussed.
    pub post_id: PostId,
    /// Comment being replied to; absent for top-level comments.
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    /// Comment body.
    pub content: String,
}

/// Body of `PUT /comments/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    /// New body.
    pub content: String,
}

/// Body of the vote endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    /// -1, 0 or 1.
    pub vote_value: i64,
}

/// Body of `POST /posts/:id/pin-comment`. A missing id unpins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinCommentRequest {
    /// Comment to pin.
    #[serde(default)]
    pub comment_id: Option<CommentId>,
}

/// Body of `POST /topics/:slug/follow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRequest {
    /// `true` to follow, `false` to unfollow.
    pub is_follow: bool,
}

/// Id of a freshly created row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// New row id.
    pub id: i64,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Store connectivity status.
    pub database: DatabaseHealth,
}

/// Store health information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_idle: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_max: Option<u32>,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: bool,
    pub details: Option<String>,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing (the request's `X-Request-Id`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// A failed request: status plus structured body.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// Create an error with status, code and message.
    pub fn new(status: StatusCode, code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                code: code.into(),
                correlation_id: None,
            },
        }
    }

    fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", error)
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "only the author may do this")
    }

    fn bad_request(code: &str, error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, error)
    }

    /// Attach a correlation id.
    pub fn with_correlation_id(mut self, id: Option<String>) -> Self {
        self.body.correlation_id = id;
        self
    }

    /// HTTP status of the error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ForumError> for ApiError {
    fn from(e: ForumError) -> Self {
        let status = match e {
            ForumError::NotFound | ForumError::NoRowsAffected => StatusCode::NOT_FOUND,
            ForumError::Validation(_) => StatusCode::BAD_REQUEST,
            ForumError::Conflict(_) => StatusCode::CONFLICT,
            ForumError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.code(), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(
                code = %self.body.code,
                error = %self.body.error,
                correlation_id = ?self.body.correlation_id,
                "Request failed"
            );
        } else {
            tracing::warn!(
                code = %self.body.code,
                error = %self.body.error,
                correlation_id = ?self.body.correlation_id,
                "Request error"
            );
        }
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Request Context
// ============================================================================

/// Per-request identity: the verified viewer and the correlation id.
#[derive(Debug, Clone)]
pub struct RequestContext {
    viewer: Viewer,
    correlation_id: Option<String>,
}

impl RequestContext {
    /// Turn a failure into a response carrying this request's correlation id.
    fn error(&self, e: impl Into<ApiError>) -> ApiError {
        e.into().with_correlation_id(self.correlation_id.clone())
    }

    /// The signed-in user, or 401.
    fn require_user(&self) -> ApiResult<UserId> {
        self.viewer
            .user_id()
            .ok_or_else(|| self.error(ApiError::unauthorized("a viewer token is required")))
    }

    /// 403 unless the signed-in user is `author`.
    fn ensure_author(&self, me: UserId, author: UserId) -> ApiResult<()> {
        if me == author {
            Ok(())
        } else {
            tracing::warn!(user_id = %me, author_id = %author, "Ownership check failed");
            Err(self.error(ApiError::forbidden()))
        }
    }
}

#[async_trait]
impl<S: ForumStore> FromRequestParts<Arc<ServiceState<S>>> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServiceState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let has_token = parts.headers.contains_key(VIEWER_TOKEN_HEADER);
        let viewer = state.viewer(&parts.headers);
        if has_token {
            record_viewer_auth(viewer.is_ok());
        }

        match viewer {
            Ok(viewer) => Ok(Self { viewer, correlation_id }),
            Err(e) => Err(ApiError::unauthorized(e.to_string()).with_correlation_id(correlation_id)),
        }
    }
}

fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(
            "VALIDATION",
            format!("{} must not be empty", field),
        ));
    }
    Ok(())
}

fn parse_vote(request: &VoteRequest) -> ApiResult<VoteValue> {
    VoteValue::try_from(request.vote_value)
        .map_err(|e| ApiError::bad_request("INVALID_VOTE", e.to_string()))
}

// ============================================================================
// Post Handlers
// ============================================================================

async fn list_posts_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Query(request): Query<ListPostsRequest>,
) -> ApiResult<Json<Paged<Post>>> {
    let query = request.into_query(&ctx.viewer).map_err(|e| ctx.error(e))?;
    let page = state
        .store
        .list_posts(&query, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(Json(page))
}

async fn create_post_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Json(request): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let me = ctx.require_user()?;
    require_text("title", &request.title).map_err(|e| ctx.error(e))?;
    require_text("content", &request.content).map_err(|e| ctx.error(e))?;

    let new = NewPost {
        topic_id: request.topic_id,
        user_id: me,
        title: request.title,
        content: request.content,
    };
    let id = state.store.create_post(&new).await.map_err(|e| ctx.error(e))?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.get() })))
}

async fn get_post_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Post>> {
    let post = state
        .store
        .get_post(id, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(Json(post))
}

async fn update_post_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<PostId>,
    Json(request): Json<UpdatePostRequest>,
) -> ApiResult<StatusCode> {
    let me = ctx.require_user()?;
    require_text("title", &request.title).map_err(|e| ctx.error(e))?;
    require_text("content", &request.content).map_err(|e| ctx.error(e))?;

    let post = state.store.get_post(id, &ctx.viewer).await.map_err(|e| ctx.error(e))?;
    ctx.ensure_author(me, post.user_id)?;

    let update = PostUpdate {
        title: request.title,
        content: request.content,
    };
    state.store.update_post(id, &update).await.map_err(|e| ctx.error(e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_post_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<PostId>,
) -> ApiResult<StatusCode> {
    let me = ctx.require_user()?;
    let post = state.store.get_post(id, &ctx.viewer).await.map_err(|e| ctx.error(e))?;
    ctx.ensure_author(me, post.user_id)?;

    state.store.delete_post(id).await.map_err(|e| ctx.error(e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn vote_post_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<PostId>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<VoteTally>> {
    let me = ctx.require_user()?;
    let value = parse_vote(&request).map_err(|e| ctx.error(e))?;

    let tally = state
        .store
        .vote_post(me, id, value)
        .await
        .map_err(|e| ctx.error(e))?;
    record_vote("post", tally.score);
    Ok(Json(tally))
}

async fn pin_comment_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<PostId>,
    Json(request): Json<PinCommentRequest>,
) -> ApiResult<StatusCode> {
    let me = ctx.require_user()?;
    let post = state.store.get_post(id, &ctx.viewer).await.map_err(|e| ctx.error(e))?;
    ctx.ensure_author(me, post.user_id)?;

    match request.comment_id {
        Some(comment_id) => {
            let comment = state
                .store
                .get_comment(comment_id, &ctx.viewer)
                .await
                .map_err(|e| ctx.error(e))?;
            validate_pin_target(id, &comment).map_err(|e| ctx.error(e))?;
            state
                .store
                .pin_comment(id, comment_id)
                .await
                .map_err(|e| ctx.error(e))?;
        }
        None => {
            state.store.unpin_comment(id).await.map_err(|e| ctx.error(e))?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Comment Handlers
// ============================================================================

async fn list_comments_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Query(request): Query<ListCommentsRequest>,
) -> ApiResult<Json<Paged<Comment>>> {
    let query = request.into_query(&ctx.viewer).map_err(|e| ctx.error(e))?;
    let page = state
        .store
        .list_comments(&query, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(Json(request.project(page)))
}

async fn create_comment_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Json(request): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let me = ctx.require_user()?;
    require_text("content", &request.content).map_err(|e| ctx.error(e))?;

    let new = NewComment {
        post_id: request.post_id,
        parent_id: request.parent_id,
        user_id: me,
        content: request.content,
    };
    let id = state
        .store
        .create_comment(&new)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.get() })))
}

async fn get_comment_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<CommentId>,
) -> ApiResult<Json<Comment>> {
    let comment = state
        .store
        .get_comment(id, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(Json(comment))
}

async fn update_comment_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<CommentId>,
    Json(request): Json<UpdateCommentRequest>,
) -> ApiResult<StatusCode> {
    let me = ctx.require_user()?;
    require_text("content", &request.content).map_err(|e| ctx.error(e))?;

    let comment = state
        .store
        .get_comment(id, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    ctx.ensure_author(me, comment.user_id)?;

    state
        .store
        .update_comment(id, &request.content)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_comment_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<CommentId>,
) -> ApiResult<StatusCode> {
    let me = ctx.require_user()?;
    let comment = state
        .store
        .get_comment(id, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    ctx.ensure_author(me, comment.user_id)?;

    state.store.delete_comment(id).await.map_err(|e| ctx.error(e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn vote_comment_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(id): Path<CommentId>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<VoteTally>> {
    let me = ctx.require_user()?;
    let value = parse_vote(&request).map_err(|e| ctx.error(e))?;

    let tally = state
        .store
        .vote_comment(me, id, value)
        .await
        .map_err(|e| ctx.error(e))?;
    record_vote("comment", tally.score);
    Ok(Json(tally))
}

// ============================================================================
// Topic and User Handlers
// ============================================================================

async fn list_topics_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Query(request): Query<ListTopicsRequest>,
) -> ApiResult<Json<Paged<Topic>>> {
    let query = request.into_query(&ctx.viewer).map_err(|e| ctx.error(e))?;
    let page = state
        .store
        .list_topics(&query, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(Json(page))
}

async fn topic_summaries_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
) -> ApiResult<Json<Vec<TopicSummary>>> {
    let topics = state
        .store
        .list_topic_summaries()
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(Json(topics))
}

async fn get_topic_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> ApiResult<Json<Topic>> {
    let name = topic_name_from_slug(&slug);
    let topic = state
        .store
        .get_topic(&name, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(Json(topic))
}

/// Follow or unfollow a topic.
///
/// A toggle that changes nothing (following twice, unfollowing a topic that
/// was never followed) is a conflict with the current state, not a missing
/// resource.
async fn follow_topic_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(slug): Path<String>,
    Json(request): Json<FollowRequest>,
) -> ApiResult<StatusCode> {
    let me = ctx.require_user()?;
    let name = topic_name_from_slug(&slug);

    let outcome = if request.is_follow {
        state.store.follow_topic(me, &name).await
    } else {
        state.store.unfollow_topic(me, &name).await
    };

    match outcome {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(ForumError::NoRowsAffected) => {
            let message = if request.is_follow {
                "topic is already followed"
            } else {
                "topic is not followed"
            };
            Err(ctx.error(ApiError::new(
                StatusCode::CONFLICT,
                ForumError::NoRowsAffected.code(),
                message,
            )))
        }
        Err(e) => Err(ctx.error(e)),
    }
}

async fn list_users_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Query(request): Query<ListUsersRequest>,
) -> ApiResult<Json<Paged<User>>> {
    let query = request.into_query(&ctx.viewer).map_err(|e| ctx.error(e))?;
    let page = state
        .store
        .list_users(&query, &ctx.viewer)
        .await
        .map_err(|e| ctx.error(e))?;
    Ok(Json(page))
}

/// Profile by username. The email is only shown to its owner.
async fn get_user_handler<S: ForumStore>(
    State(state): AppState<S>,
    ctx: RequestContext,
    Path(username): Path<String>,
) -> ApiResult<Json<User>> {
    let mut user = state
        .store
        .get_user_by_username(&username)
        .await
        .map_err(|e| ctx.error(e))?;
    if ctx.viewer.user_id() != Some(user.id) {
        user.email.clear();
    }
    Ok(Json(user))
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint (detailed).
///
/// Returns full service status including store health.
async fn health_handler<S: ForumStore>(State(state): AppState<S>) -> Json<HealthResponse> {
    let db_healthy = state.store.is_healthy().await;
    let pool_stats = state.store.pool_stats();

    Json(HealthResponse {
        status: if db_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            connected: db_healthy,
            pool_size: pool_stats.map(|s| s.size),
            pool_idle: pool_stats.map(|s| s.idle),
            pool_max: pool_stats.map(|s| s.max),
        },
    })
}

/// Liveness probe endpoint.
///
/// Simple check that the service is running. Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 if the store is reachable, 503 otherwise.
async fn readiness_handler<S: ForumStore>(
    State(state): AppState<S>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.store.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            database: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                database: false,
                details: Some("Database connection failed".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the forum service.
pub fn create_router<S: ForumStore>(state: ServiceState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Posts
        .route("/posts", get(list_posts_handler::<S>).post(create_post_handler::<S>))
        .route(
            "/posts/:id",
            get(get_post_handler::<S>)
                .put(update_post_handler::<S>)
                .delete(delete_post_handler::<S>),
        )
        .route("/posts/:id/vote", post(vote_post_handler::<S>))
        .route("/posts/:id/pin-comment", post(pin_comment_handler::<S>))
        // Comments
        .route(
            "/comments",
            get(list_comments_handler::<S>).post(create_comment_handler::<S>),
        )
        .route(
            "/comments/:id",
            get(get_comment_handler::<S>)
                .put(update_comment_handler::<S>)
                .delete(delete_comment_handler::<S>),
        )
        .route("/comments/:id/vote", post(vote_comment_handler::<S>))
        // Topics and the follow graph
        .route("/topics", get(list_topics_handler::<S>))
        .route("/topics-summary", get(topic_summaries_handler::<S>))
        .route("/topics/:slug", get(get_topic_handler::<S>))
        .route("/topics/:slug/follow", post(follow_topic_handler::<S>))
        // Users
        .route("/users", get(list_users_handler::<S>))
        .route("/users/:username", get(get_user_handler::<S>))
        // Health checks
        .route("/health", get(health_handler::<S>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .with_state(state)
}
