use std::collections::HashMap;

use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{movies, prelude::*, reviews};
use crate::models::movie::MovieSummary;
use crate::models::review::{FeedEntry, Review, ReviewWithAuthor, ReviewWithMovie};
use crate::models::user::UserSummary;

pub struct ReviewRepository {
    conn: DatabaseConnection,
}

impl ReviewRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a review and recompute the movie's average in one transaction,
    /// so a failed aggregate write rolls the review back. Returns `None` when
    /// the user already reviewed the movie.
    pub async fn add(
        &self,
        user_id: i32,
        movie_id: i32,
        rating: i32,
        review_text: &str,
    ) -> Result<Option<Review>> {
        let txn = self.conn.begin().await?;

        let existing = Reviews::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .filter(reviews::Column::MovieId.eq(movie_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Ok(None);
        }

        let model = reviews::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            rating: Set(rating),
            review_text: Set(review_text.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        recompute_average(&txn, movie_id).await?;

        txn.commit().await?;
        Ok(Some(Review::from(model)))
    }

    /// All reviews for a movie with their authors, newest first.
    pub async fn for_movie(&self, movie_id: i32) -> Result<Vec<ReviewWithAuthor>> {
        let rows = Reviews::find()
            .filter(reviews::Column::MovieId.eq(movie_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .find_also_related(Users)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(review, author)| ReviewWithAuthor {
                review: Review::from(review),
                author: author.map(UserSummary::from),
            })
            .collect())
    }

    pub async fn page_for_movie(
        &self,
        movie_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ReviewWithAuthor>, u64, u64)> {
        let paginator = Reviews::find()
            .filter(reviews::Column::MovieId.eq(movie_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .find_also_related(Users)
            .paginate(&self.conn, per_page);

        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok((
            items
                .into_iter()
                .map(|(review, author)| ReviewWithAuthor {
                    review: Review::from(review),
                    author: author.map(UserSummary::from),
                })
                .collect(),
            totals.number_of_pages,
            totals.number_of_items,
        ))
    }

    /// A user's reviews with the reviewed movies, newest first.
    pub async fn by_user(&self, user_id: i32) -> Result<Vec<ReviewWithMovie>> {
        let rows = Reviews::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .find_also_related(Movies)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(review, movie)| ReviewWithMovie {
                review: Review::from(review),
                movie: movie.map(MovieSummary::from),
            })
            .collect())
    }

    /// Latest reviews by the given authors, with both sides of the join.
    pub async fn feed(&self, author_ids: &[i32], limit: u64) -> Result<Vec<FeedEntry>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = Reviews::find()
            .filter(reviews::Column::UserId.is_in(author_ids.to_vec()))
            .order_by_desc(reviews::Column::CreatedAt)
            .limit(limit);

        self.with_context(query).await
    }

    /// Latest reviews overall, used by the admin dashboard.
    pub async fn recent(&self, limit: u64) -> Result<Vec<FeedEntry>> {
        let query = Reviews::find()
            .order_by_desc(reviews::Column::CreatedAt)
            .limit(limit);

        self.with_context(query).await
    }

    async fn with_context(&self, query: sea_orm::Select<Reviews>) -> Result<Vec<FeedEntry>> {
        let rows = query.find_also_related(Users).all(&self.conn).await?;

        let movie_ids: Vec<i32> = rows.iter().map(|(review, _)| review.movie_id).collect();
        let movie_map: HashMap<i32, movies::Model> = if movie_ids.is_empty() {
            HashMap::new()
        } else {
            Movies::find()
                .filter(movies::Column::Id.is_in(movie_ids))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|m| (m.id, m))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|(review, author)| {
                let movie = movie_map.get(&review.movie_id).cloned();
                FeedEntry {
                    review: Review::from(review),
                    author: author.map(UserSummary::from),
                    movie: movie.map(MovieSummary::from),
                }
            })
            .collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Reviews::find().count(&self.conn).await?)
    }

    /// Review counts grouped by rating, ascending.
    pub async fn rating_distribution(&self) -> Result<Vec<(i32, i64)>> {
        let buckets = Reviews::find()
            .select_only()
            .column(reviews::Column::Rating)
            .column_as(reviews::Column::Id.count(), "count")
            .group_by(reviews::Column::Rating)
            .order_by_asc(reviews::Column::Rating)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(buckets)
    }
}

/// Full recompute of a movie's denormalized average; never incremental.
/// Callers run this inside the transaction that changed the review set.
pub(crate) async fn recompute_average<C: ConnectionTrait>(conn: &C, movie_id: i32) -> Result<f64> {
    let ratings: Vec<i32> = Reviews::find()
        .select_only()
        .column(reviews::Column::Rating)
        .filter(reviews::Column::MovieId.eq(movie_id))
        .into_tuple()
        .all(conn)
        .await?;

    let average = mean_rating(&ratings);

    Movies::update_many()
        .col_expr(movies::Column::AverageRating, Expr::value(average))
        .filter(movies::Column::Id.eq(movie_id))
        .exec(conn)
        .await?;

    Ok(average)
}

pub(crate) fn mean_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i32 = ratings.iter().sum();
    f64::from(sum) / ratings.len() as f64
}
