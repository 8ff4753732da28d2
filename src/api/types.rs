use serde::{Deserialize, Serialize};

use crate::db::WatchlistEntry;
use crate::models::movie::{Movie, MovieSummary};
use crate::models::review::{FeedEntry, Review, ReviewWithAuthor, ReviewWithMovie};
use crate::models::user::{User, UserSummary};

/// Error body fixed by the web client: numeric HTTP status plus message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

/// Pagination envelope fixed by the web client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
    pub join_date: String,
    pub is_admin: bool,
    pub followers_count: i32,
    pub following_count: i32,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            profile_picture: user.profile_picture,
            join_date: user.join_date,
            is_admin: user.is_admin,
            followers_count: user.followers_count,
            following_count: user.following_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub id: i32,
    pub username: String,
    pub profile_picture: String,
}

impl From<UserSummary> for UserSummaryDto {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.username,
            profile_picture: user.profile_picture,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDto {
    pub id: i32,
    pub title: String,
    pub genres: Vec<String>,
    pub release_year: i32,
    pub director: String,
    pub cast: Vec<String>,
    pub synopsis: String,
    pub poster_url: String,
    pub trailer_url: Option<String>,
    pub duration: Option<i32>,
    pub average_rating: f64,
    pub created_at: String,
}

impl From<Movie> for MovieDto {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            genres: movie.genres,
            release_year: movie.release_year,
            director: movie.director,
            cast: movie.cast,
            synopsis: movie.synopsis,
            poster_url: movie.poster_url,
            trailer_url: movie.trailer_url,
            duration: movie.duration,
            average_rating: movie.average_rating,
            created_at: movie.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummaryDto {
    pub id: i32,
    pub title: String,
    pub poster_url: String,
}

impl From<MovieSummary> for MovieSummaryDto {
    fn from(movie: MovieSummary) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            poster_url: movie.poster_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: i32,
    pub review_text: String,
    pub timestamp: String,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            user_id: review.user_id,
            movie_id: review.movie_id,
            rating: review.rating,
            review_text: review.review_text,
            timestamp: review.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewWithAuthorDto {
    #[serde(flatten)]
    pub review: ReviewDto,
    pub user: Option<UserSummaryDto>,
}

impl From<ReviewWithAuthor> for ReviewWithAuthorDto {
    fn from(entry: ReviewWithAuthor) -> Self {
        Self {
            review: entry.review.into(),
            user: entry.author.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewWithMovieDto {
    #[serde(flatten)]
    pub review: ReviewDto,
    pub movie: Option<MovieSummaryDto>,
}

impl From<ReviewWithMovie> for ReviewWithMovieDto {
    fn from(entry: ReviewWithMovie) -> Self {
        Self {
            review: entry.review.into(),
            movie: entry.movie.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedItemDto {
    #[serde(flatten)]
    pub review: ReviewDto,
    pub user: Option<UserSummaryDto>,
    pub movie: Option<MovieSummaryDto>,
}

impl From<FeedEntry> for FeedItemDto {
    fn from(entry: FeedEntry) -> Self {
        Self {
            review: entry.review.into(),
            user: entry.author.map(Into::into),
            movie: entry.movie.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieDetailDto {
    pub movie: MovieDto,
    pub reviews: Vec<ReviewWithAuthorDto>,
}

#[derive(Debug, Serialize)]
pub struct UserProfileDto {
    pub user: UserDto,
    pub reviews: Vec<ReviewWithMovieDto>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponseDto {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntryDto {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub date_added: String,
}

impl From<WatchlistEntry> for WatchlistEntryDto {
    fn from(entry: WatchlistEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            movie_id: entry.movie_id,
            date_added: entry.date_added,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsTotalsDto {
    pub users: u64,
    pub movies: u64,
    pub reviews: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucketDto {
    pub rating: i32,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsDto {
    pub totals: StatsTotalsDto,
    pub recent_users: Vec<UserDto>,
    pub recent_movies: Vec<MovieDto>,
    pub recent_reviews: Vec<FeedItemDto>,
    pub rating_distribution: Vec<RatingBucketDto>,
}
