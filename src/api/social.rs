use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, AppState, FeedItemDto, MessageDto, UserSummaryDto};

/// Number of reviews returned by the feed.
const FEED_LIMIT: u64 = 20;

/// POST /api/social/follow/{user_id}
/// Both sides of the relationship are updated in one transaction.
pub async fn follow(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<MessageDto>, ApiError> {
    if current.id == user_id {
        return Err(ApiError::validation("Cannot follow yourself"));
    }

    if state.store().get_user(user_id).await?.is_none() {
        return Err(ApiError::user_not_found(user_id));
    }

    if !state.store().follow_user(current.id, user_id).await? {
        return Err(ApiError::validation("Already following this user"));
    }

    Ok(Json(MessageDto {
        message: "Successfully followed user".to_string(),
    }))
}

/// POST /api/social/unfollow/{user_id}
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<MessageDto>, ApiError> {
    if !state.store().unfollow_user(current.id, user_id).await? {
        return Err(ApiError::validation("Not following this user"));
    }

    Ok(Json(MessageDto {
        message: "Successfully unfollowed user".to_string(),
    }))
}

/// GET /api/social/followers/{user_id}
pub async fn followers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<UserSummaryDto>>, ApiError> {
    if state.store().get_user(user_id).await?.is_none() {
        return Err(ApiError::user_not_found(user_id));
    }

    let users = state.store().followers_of(user_id).await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /api/social/following/{user_id}
pub async fn following(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<UserSummaryDto>>, ApiError> {
    if state.store().get_user(user_id).await?.is_none() {
        return Err(ApiError::user_not_found(user_id));
    }

    let users = state.store().following_of(user_id).await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /api/social/feed
/// Latest reviews by users the acting user follows.
pub async fn feed(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<Vec<FeedItemDto>>, ApiError> {
    let following = state.store().following_ids(current.id).await?;
    let entries = state.store().review_feed(&following, FEED_LIMIT).await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
