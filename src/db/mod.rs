use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use crate::entities::watchlist::Model as WatchlistEntry;
pub use repositories::movie::{MovieFilter, MovieSortKey};

use crate::config::SecurityConfig;
use crate::models::movie::{Movie, NewMovie};
use crate::models::review::{FeedEntry, Review, ReviewWithAuthor, ReviewWithMovie};
use crate::models::user::{User, UserSummary};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn movie_repo(&self) -> repositories::movie::MovieRepository {
        repositories::movie::MovieRepository::new(self.conn.clone())
    }

    fn review_repo(&self) -> repositories::review::ReviewRepository {
        repositories::review::ReviewRepository::new(self.conn.clone())
    }

    fn watchlist_repo(&self) -> repositories::watchlist::WatchlistRepository {
        repositories::watchlist::WatchlistRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, email, password, security)
            .await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get(id).await
    }

    pub async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        self.user_repo()
            .find_by_username_or_email(username, email)
            .await
    }

    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        profile_picture: Option<String>,
    ) -> Result<Option<User>> {
        self.user_repo()
            .update_profile(id, username, email, profile_picture)
            .await
    }

    pub async fn set_user_admin(&self, id: i32, is_admin: bool) -> Result<Option<User>> {
        self.user_repo().set_admin(id, is_admin).await
    }

    pub async fn list_users_page(&self, page: u64, per_page: u64) -> Result<(Vec<User>, u64, u64)> {
        self.user_repo().list_page(page, per_page).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn recent_users(&self, limit: u64) -> Result<Vec<User>> {
        self.user_repo().recent(limit).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete_cascade(id).await
    }

    // Follow graph

    pub async fn follow_user(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.user_repo().follow(follower_id, followed_id).await
    }

    pub async fn unfollow_user(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.user_repo().unfollow(follower_id, followed_id).await
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.user_repo()
            .is_following(follower_id, followed_id)
            .await
    }

    pub async fn followers_of(&self, user_id: i32) -> Result<Vec<UserSummary>> {
        self.user_repo().followers_of(user_id).await
    }

    pub async fn following_of(&self, user_id: i32) -> Result<Vec<UserSummary>> {
        self.user_repo().following_of(user_id).await
    }

    pub async fn following_ids(&self, user_id: i32) -> Result<Vec<i32>> {
        self.user_repo().following_ids(user_id).await
    }

    // Movies

    pub async fn add_movie(&self, movie: &NewMovie) -> Result<Movie> {
        self.movie_repo().add(movie).await
    }

    pub async fn get_movie(&self, id: i32) -> Result<Option<Movie>> {
        self.movie_repo().get(id).await
    }

    pub async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Movie>, u64, u64)> {
        self.movie_repo().list(filter, page, per_page).await
    }

    pub async fn count_movies(&self) -> Result<u64> {
        self.movie_repo().count().await
    }

    pub async fn recent_movies(&self, limit: u64) -> Result<Vec<Movie>> {
        self.movie_repo().recent(limit).await
    }

    pub async fn delete_movie(&self, id: i32) -> Result<bool> {
        self.movie_repo().remove_cascade(id).await
    }

    // Reviews

    pub async fn add_review(
        &self,
        user_id: i32,
        movie_id: i32,
        rating: i32,
        review_text: &str,
    ) -> Result<Option<Review>> {
        self.review_repo()
            .add(user_id, movie_id, rating, review_text)
            .await
    }

    pub async fn reviews_for_movie(&self, movie_id: i32) -> Result<Vec<ReviewWithAuthor>> {
        self.review_repo().for_movie(movie_id).await
    }

    pub async fn reviews_page_for_movie(
        &self,
        movie_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ReviewWithAuthor>, u64, u64)> {
        self.review_repo()
            .page_for_movie(movie_id, page, per_page)
            .await
    }

    pub async fn reviews_by_user(&self, user_id: i32) -> Result<Vec<ReviewWithMovie>> {
        self.review_repo().by_user(user_id).await
    }

    pub async fn review_feed(&self, author_ids: &[i32], limit: u64) -> Result<Vec<FeedEntry>> {
        self.review_repo().feed(author_ids, limit).await
    }

    pub async fn recent_reviews(&self, limit: u64) -> Result<Vec<FeedEntry>> {
        self.review_repo().recent(limit).await
    }

    pub async fn count_reviews(&self) -> Result<u64> {
        self.review_repo().count().await
    }

    pub async fn rating_distribution(&self) -> Result<Vec<(i32, i64)>> {
        self.review_repo().rating_distribution().await
    }

    // Watchlist

    pub async fn add_to_watchlist(
        &self,
        user_id: i32,
        movie_id: i32,
    ) -> Result<Option<WatchlistEntry>> {
        self.watchlist_repo().add(user_id, movie_id).await
    }

    pub async fn remove_from_watchlist(&self, user_id: i32, movie_id: i32) -> Result<bool> {
        self.watchlist_repo().remove(user_id, movie_id).await
    }

    pub async fn watchlist_page(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Movie>, u64, u64)> {
        self.watchlist_repo()
            .page_movies(user_id, page, per_page)
            .await
    }
}
