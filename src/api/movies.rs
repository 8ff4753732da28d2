use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{
    ApiError, AppState, MovieDetailDto, MovieDto, Page, PaginationQuery, ReviewDto,
    ReviewWithAuthorDto,
};
use crate::api::validation::{validate_pagination, validate_rating, validate_review_text};
use crate::db::{MovieFilter, MovieSortKey};
use crate::models::movie::NewMovie;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_duration: Option<i32>,
    pub max_duration: Option<i32>,
    pub cast: Option<String>,
    pub director: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    pub title: String,
    pub genres: Vec<String>,
    pub release_year: i32,
    pub director: String,
    #[serde(default)]
    pub cast: Vec<String>,
    pub synopsis: String,
    pub poster_url: String,
    pub trailer_url: Option<String>,
    pub duration: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub review_text: String,
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /api/movies
/// Paginated catalog listing with filtering and sorting.
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MovieListQuery>,
) -> Result<Json<Page<MovieDto>>, ApiError> {
    let (page, limit) = validate_pagination(params.page, params.limit, &state.config().server)?;

    let sort_by = match params.sort_by.as_deref() {
        None => None,
        Some(raw) => Some(
            MovieSortKey::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("Unknown sort field: {raw}")))?,
        ),
    };

    let filter = MovieFilter {
        genres: params.genre.as_deref().map(split_csv).unwrap_or_default(),
        year: params.year,
        year_from: params.year_from,
        year_to: params.year_to,
        min_rating: params.min_rating,
        max_rating: params.max_rating,
        min_duration: params.min_duration,
        max_duration: params.max_duration,
        cast: params.cast.as_deref().map(split_csv).unwrap_or_default(),
        director: params.director,
        search: params.search,
        sort_by,
        descending: params.sort_order.as_deref() == Some("desc"),
    };

    let (movies, total_pages, total_count) =
        state.store().list_movies(&filter, page, limit).await?;

    Ok(Json(Page {
        items: movies.into_iter().map(MovieDto::from).collect(),
        current_page: page,
        total_pages,
        total_count,
    }))
}

/// GET /api/movies/{id}
/// One movie with all of its reviews, newest first.
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<MovieDetailDto>, ApiError> {
    let movie = state
        .store()
        .get_movie(id)
        .await?
        .ok_or_else(|| ApiError::movie_not_found(id))?;

    let reviews = state.store().reviews_for_movie(id).await?;

    Ok(Json(MovieDetailDto {
        movie: movie.into(),
        reviews: reviews.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/movies (admin)
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateMovieRequest>,
) -> Result<(StatusCode, Json<MovieDto>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Please provide a movie title"));
    }
    if payload.genres.is_empty() {
        return Err(ApiError::validation("Please provide at least one genre"));
    }
    if payload.director.trim().is_empty() {
        return Err(ApiError::validation("Please provide a director"));
    }
    if payload.synopsis.trim().is_empty() {
        return Err(ApiError::validation("Please provide a synopsis"));
    }
    if payload.poster_url.trim().is_empty() {
        return Err(ApiError::validation("Please provide a poster URL"));
    }
    if !(1888..=3000).contains(&payload.release_year) {
        return Err(ApiError::validation("Release year is out of range"));
    }
    if let Some(duration) = payload.duration
        && duration <= 0
    {
        return Err(ApiError::validation("Duration must be positive"));
    }

    let movie = state
        .store()
        .add_movie(&NewMovie {
            title: payload.title.trim().to_string(),
            genres: payload.genres,
            release_year: payload.release_year,
            director: payload.director.trim().to_string(),
            cast: payload.cast,
            synopsis: payload.synopsis,
            poster_url: payload.poster_url,
            trailer_url: payload.trailer_url,
            duration: payload.duration,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(movie.into())))
}

/// GET /api/movies/{id}/reviews
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<Page<ReviewWithAuthorDto>>, ApiError> {
    let (page, limit) = validate_pagination(params.page, params.limit, &state.config().server)?;

    let (reviews, total_pages, total_count) = state
        .store()
        .reviews_page_for_movie(id, page, limit)
        .await?;

    Ok(Json(Page {
        items: reviews.into_iter().map(Into::into).collect(),
        current_page: page,
        total_pages,
        total_count,
    }))
}

/// POST /api/movies/{id}/reviews
/// Submit the acting user's review; the movie's average is recomputed in the
/// same transaction.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewDto>), ApiError> {
    validate_rating(payload.rating)?;
    let text = validate_review_text(&payload.review_text)?;

    if state.store().get_movie(id).await?.is_none() {
        return Err(ApiError::movie_not_found(id));
    }

    let review = state
        .store()
        .add_review(user.id, id, payload.rating, text)
        .await?
        .ok_or_else(|| ApiError::validation("You have already reviewed this movie"))?;

    Ok((StatusCode::CREATED, Json(review.into())))
}
