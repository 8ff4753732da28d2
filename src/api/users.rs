use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{
    ApiError, AppState, MessageDto, MovieDto, Page, PaginationQuery, UserDto, UserProfileDto,
    WatchlistEntryDto,
};
use crate::api::validation::{validate_email, validate_pagination, validate_username};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchlistRequest {
    pub movie_id: i32,
}

/// GET /api/users/{id}
/// Public profile plus the user's review history.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<UserProfileDto>, ApiError> {
    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))?;

    let reviews = state.store().reviews_by_user(id).await?;

    Ok(Json(UserProfileDto {
        user: user.into(),
        reviews: reviews.into_iter().map(Into::into).collect(),
    }))
}

/// PUT /api/users/{id}
/// Users may only update their own profile.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    if current.id != id {
        return Err(ApiError::forbidden("Not authorized"));
    }

    let username = match &payload.username {
        Some(raw) => Some(validate_username(raw)?.to_string()),
        None => None,
    };
    let email = match &payload.email {
        Some(raw) => Some(validate_email(raw)?),
        None => None,
    };

    let probe_username = username.as_deref().unwrap_or("");
    let probe_email = email.as_deref().unwrap_or("");
    if (!probe_username.is_empty() || !probe_email.is_empty())
        && let Some(existing) = state
            .store()
            .find_user_by_username_or_email(probe_username, probe_email)
            .await?
        && existing.id != id
    {
        return Err(ApiError::validation("Username or email already taken"));
    }

    let updated = state
        .store()
        .update_user_profile(id, username, email, payload.profile_picture)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))?;

    Ok(Json(updated.into()))
}

/// GET /api/users/{id}/watchlist
/// Paginated movies on the watchlist, most recently added first.
pub async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<Page<MovieDto>>, ApiError> {
    let (page, limit) = validate_pagination(params.page, params.limit, &state.config().server)?;

    let (movies, total_pages, total_count) =
        state.store().watchlist_page(id, page, limit).await?;

    Ok(Json(Page {
        items: movies.into_iter().map(MovieDto::from).collect(),
        current_page: page,
        total_pages,
        total_count,
    }))
}

/// POST /api/users/{id}/watchlist
pub async fn add_watchlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Json(payload): Json<AddWatchlistRequest>,
) -> Result<(StatusCode, Json<WatchlistEntryDto>), ApiError> {
    if current.id != id {
        return Err(ApiError::forbidden("Not authorized"));
    }

    if state.store().get_movie(payload.movie_id).await?.is_none() {
        return Err(ApiError::movie_not_found(payload.movie_id));
    }

    let entry = state
        .store()
        .add_to_watchlist(id, payload.movie_id)
        .await?
        .ok_or_else(|| ApiError::validation("Movie already in watchlist"))?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// DELETE /api/users/{id}/watchlist/{movie_id}
pub async fn remove_watchlist(
    State(state): State<Arc<AppState>>,
    Path((id, movie_id)): Path<(i32, i32)>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<MessageDto>, ApiError> {
    if current.id != id {
        return Err(ApiError::forbidden("Not authorized"));
    }

    if !state.store().remove_from_watchlist(id, movie_id).await? {
        return Err(ApiError::NotFound(
            "Movie not found in watchlist".to_string(),
        ));
    }

    Ok(Json(MessageDto {
        message: "Movie removed from watchlist".to_string(),
    }))
}
