use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    AdminStatsDto, ApiError, AppState, MessageDto, Page, PaginationQuery, RatingBucketDto,
    StatsTotalsDto, UserDto,
};
use crate::api::validation::validate_pagination;

/// Number of rows in each "recent" section of the dashboard.
const RECENT_LIMIT: u64 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserAdminRequest {
    pub is_admin: bool,
}

/// GET /api/admin/stats
/// Dashboard totals, recent activity, and the rating distribution.
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<AdminStatsDto>, ApiError> {
    let store = state.store();

    let totals = StatsTotalsDto {
        users: store.count_users().await?,
        movies: store.count_movies().await?,
        reviews: store.count_reviews().await?,
    };

    let recent_users = store
        .recent_users(RECENT_LIMIT)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let recent_movies = store
        .recent_movies(RECENT_LIMIT)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let recent_reviews = store
        .recent_reviews(RECENT_LIMIT)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let rating_distribution = store
        .rating_distribution()
        .await?
        .into_iter()
        .map(|(rating, count)| RatingBucketDto { rating, count })
        .collect();

    Ok(Json(AdminStatsDto {
        totals,
        recent_users,
        recent_movies,
        recent_reviews,
        rating_distribution,
    }))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<Page<UserDto>>, ApiError> {
    let (page, limit) = validate_pagination(params.page, params.limit, &state.config().server)?;

    let (users, total_pages, total_count) = state.store().list_users_page(page, limit).await?;

    Ok(Json(Page {
        items: users.into_iter().map(UserDto::from).collect(),
        current_page: page,
        total_pages,
        total_count,
    }))
}

/// PUT /api/admin/users/{user_id}
/// Grant or revoke the admin flag.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserAdminRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state
        .store()
        .set_user_admin(user_id, payload.is_admin)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    Ok(Json(user.into()))
}

/// DELETE /api/admin/users/{user_id}
/// Removes the account with its reviews, watchlist, and follow edges;
/// affected movie averages are recomputed in the same transaction.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<MessageDto>, ApiError> {
    if !state.store().delete_user(user_id).await? {
        return Err(ApiError::user_not_found(user_id));
    }

    Ok(Json(MessageDto {
        message: "User deleted successfully".to_string(),
    }))
}

/// DELETE /api/admin/movies/{movie_id}
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i32>,
) -> Result<Json<MessageDto>, ApiError> {
    if !state.store().delete_movie(movie_id).await? {
        return Err(ApiError::movie_not_found(movie_id));
    }

    Ok(Json(MessageDto {
        message: "Movie deleted successfully".to_string(),
    }))
}
