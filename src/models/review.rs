use super::movie::MovieSummary;
use super::user::UserSummary;
use crate::entities::reviews;

#[derive(Debug, Clone)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: i32,
    pub review_text: String,
    pub created_at: String,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            movie_id: model.movie_id,
            rating: model.rating,
            review_text: model.review_text,
            created_at: model.created_at,
        }
    }
}

/// Review joined with its author, as listed on a movie page.
#[derive(Debug, Clone)]
pub struct ReviewWithAuthor {
    pub review: Review,
    pub author: Option<UserSummary>,
}

/// Review joined with the reviewed movie, as listed on a user profile.
#[derive(Debug, Clone)]
pub struct ReviewWithMovie {
    pub review: Review,
    pub movie: Option<MovieSummary>,
}

/// Review joined with both sides, as shown in the social feed.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub review: Review,
    pub author: Option<UserSummary>,
    pub movie: Option<MovieSummary>,
}
