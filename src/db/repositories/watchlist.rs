use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{prelude::*, watchlist};
use crate::models::movie::Movie;

pub struct WatchlistRepository {
    conn: DatabaseConnection,
}

impl WatchlistRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Add a movie to a user's watchlist. Returns `None` when it is already
    /// there.
    pub async fn add(&self, user_id: i32, movie_id: i32) -> Result<Option<watchlist::Model>> {
        let existing = Watchlist::find()
            .filter(watchlist::Column::UserId.eq(user_id))
            .filter(watchlist::Column::MovieId.eq(movie_id))
            .one(&self.conn)
            .await?;
        if existing.is_some() {
            return Ok(None);
        }

        let model = watchlist::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            date_added: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(Some(model))
    }

    /// Returns `false` when the movie was not on the watchlist.
    pub async fn remove(&self, user_id: i32, movie_id: i32) -> Result<bool> {
        let result = Watchlist::delete_many()
            .filter(watchlist::Column::UserId.eq(user_id))
            .filter(watchlist::Column::MovieId.eq(movie_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Movies on a user's watchlist, most recently added first.
    pub async fn page_movies(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Movie>, u64, u64)> {
        let paginator = Watchlist::find()
            .filter(watchlist::Column::UserId.eq(user_id))
            .order_by_desc(watchlist::Column::DateAdded)
            .find_also_related(Movies)
            .paginate(&self.conn, per_page);

        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok((
            items
                .into_iter()
                .filter_map(|(_, movie)| movie)
                .map(Movie::from)
                .collect(),
            totals.number_of_pages,
            totals.number_of_items,
        ))
    }
}
