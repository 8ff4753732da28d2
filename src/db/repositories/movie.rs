use anyhow::Result;
use sea_orm::sea_query::Order;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{movies, prelude::*, reviews, watchlist};
use crate::models::movie::{Movie, NewMovie};

/// Whitelisted sort keys for the catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieSortKey {
    Title,
    ReleaseYear,
    AverageRating,
    Duration,
    CreatedAt,
}

impl MovieSortKey {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "title" => Some(Self::Title),
            "releaseYear" => Some(Self::ReleaseYear),
            "averageRating" => Some(Self::AverageRating),
            "duration" => Some(Self::Duration),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    const fn column(self) -> movies::Column {
        match self {
            Self::Title => movies::Column::Title,
            Self::ReleaseYear => movies::Column::ReleaseYear,
            Self::AverageRating => movies::Column::AverageRating,
            Self::Duration => movies::Column::Duration,
            Self::CreatedAt => movies::Column::CreatedAt,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MovieFilter {
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_duration: Option<i32>,
    pub max_duration: Option<i32>,
    pub cast: Vec<String>,
    pub director: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<MovieSortKey>,
    pub descending: bool,
}

pub struct MovieRepository {
    conn: DatabaseConnection,
}

impl MovieRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, movie: &NewMovie) -> Result<Movie> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = movies::ActiveModel {
            title: Set(movie.title.clone()),
            genres: Set(serde_json::to_string(&movie.genres).unwrap_or_else(|_| "[]".to_string())),
            release_year: Set(movie.release_year),
            director: Set(movie.director.clone()),
            cast: Set(serde_json::to_string(&movie.cast).unwrap_or_else(|_| "[]".to_string())),
            synopsis: Set(movie.synopsis.clone()),
            poster_url: Set(movie.poster_url.clone()),
            trailer_url: Set(movie.trailer_url.clone()),
            duration: Set(movie.duration),
            average_rating: Set(0.0),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        info!("Added movie: {}", model.title);
        Ok(Movie::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Movie>> {
        let movie = Movies::find_by_id(id).one(&self.conn).await?;
        Ok(movie.map(Movie::from))
    }

    pub async fn list(
        &self,
        filter: &MovieFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Movie>, u64, u64)> {
        let mut query = Movies::find();

        if !filter.genres.is_empty() {
            // Genres are stored as a JSON array string; match the quoted element.
            let mut cond = Condition::any();
            for genre in &filter.genres {
                cond = cond.add(movies::Column::Genres.contains(format!("\"{genre}\"")));
            }
            query = query.filter(cond);
        }

        // An explicit year range wins over an exact year, matching the
        // reference client's request shape.
        if filter.year_from.is_some() || filter.year_to.is_some() {
            if let Some(from) = filter.year_from {
                query = query.filter(movies::Column::ReleaseYear.gte(from));
            }
            if let Some(to) = filter.year_to {
                query = query.filter(movies::Column::ReleaseYear.lte(to));
            }
        } else if let Some(year) = filter.year {
            query = query.filter(movies::Column::ReleaseYear.eq(year));
        }

        if let Some(min) = filter.min_rating {
            query = query.filter(movies::Column::AverageRating.gte(min));
        }
        if let Some(max) = filter.max_rating {
            query = query.filter(movies::Column::AverageRating.lte(max));
        }
        if let Some(min) = filter.min_duration {
            query = query.filter(movies::Column::Duration.gte(min));
        }
        if let Some(max) = filter.max_duration {
            query = query.filter(movies::Column::Duration.lte(max));
        }

        if !filter.cast.is_empty() {
            let mut cond = Condition::any();
            for name in &filter.cast {
                cond = cond.add(movies::Column::Cast.contains(name.as_str()));
            }
            query = query.filter(cond);
        }
        if let Some(director) = &filter.director {
            query = query.filter(movies::Column::Director.contains(director.as_str()));
        }
        if let Some(search) = &filter.search {
            query = query.filter(movies::Column::Title.contains(search.as_str()));
        }

        query = match filter.sort_by {
            Some(key) => {
                let order = if filter.descending {
                    Order::Desc
                } else {
                    Order::Asc
                };
                query.order_by(key.column(), order)
            }
            None => query
                .order_by_desc(movies::Column::AverageRating)
                .order_by_asc(movies::Column::Title),
        };

        let paginator = query.paginate(&self.conn, per_page);
        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok((
            items.into_iter().map(Movie::from).collect(),
            totals.number_of_pages,
            totals.number_of_items,
        ))
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Movies::find().count(&self.conn).await?)
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<Movie>> {
        let rows = Movies::find()
            .order_by_desc(movies::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    /// Delete a catalog entry along with its reviews and watchlist entries.
    pub async fn remove_cascade(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        if Movies::find_by_id(id).one(&txn).await?.is_none() {
            return Ok(false);
        }

        Reviews::delete_many()
            .filter(reviews::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;

        Watchlist::delete_many()
            .filter(watchlist::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;

        Movies::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!("Removed movie with ID: {}", id);
        Ok(true)
    }
}
