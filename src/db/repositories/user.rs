use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{follows, prelude::*, reviews, users, watchlist};
use crate::models::user::{User, UserSummary};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create an account. The caller is responsible for having checked that
    /// the username and email are free.
    /// Note: Argon2 hashing runs on `spawn_blocking` because it is
    /// CPU-intensive and would stall the async runtime if run directly.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_lowercase()),
            password_hash: Set(password_hash),
            profile_picture: Set(String::new()),
            join_date: Set(now),
            is_admin: Set(false),
            followers_count: Set(0),
            following_count: Set(0),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        info!("Registered user: {}", model.username);
        Ok(User::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(users::Column::Id.is_in(ids.to_vec()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Used by registration and profile updates to reject taken identifiers.
    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let user = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(username))
                    .add(users::Column::Email.eq(email.to_lowercase())),
            )
            .one(&self.conn)
            .await
            .context("Failed to query user by username/email")?;

        Ok(user.map(User::from))
    }

    /// Verify an email/password pair, returning the account when it matches.
    /// Note: Argon2 verification runs on `spawn_blocking` for the same reason
    /// hashing does.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    pub async fn update_profile(
        &self,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        profile_picture: Option<String>,
    ) -> Result<Option<User>> {
        let Some(model) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        if let Some(username) = username {
            active.username = Set(username);
        }
        if let Some(email) = email {
            active.email = Set(email.to_lowercase());
        }
        if let Some(profile_picture) = profile_picture {
            active.profile_picture = Set(profile_picture);
        }

        let updated = active.update(&self.conn).await?;
        Ok(Some(User::from(updated)))
    }

    pub async fn set_admin(&self, id: i32, is_admin: bool) -> Result<Option<User>> {
        let Some(model) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        active.is_admin = Set(is_admin);
        let updated = active.update(&self.conn).await?;

        info!("Set admin={} for user {}", is_admin, id);
        Ok(Some(User::from(updated)))
    }

    pub async fn list_page(&self, page: u64, per_page: u64) -> Result<(Vec<User>, u64, u64)> {
        let paginator = Users::find()
            .order_by_desc(users::Column::JoinDate)
            .paginate(&self.conn, per_page);

        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok((
            items.into_iter().map(User::from).collect(),
            totals.number_of_pages,
            totals.number_of_items,
        ))
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Users::find().count(&self.conn).await?)
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_desc(users::Column::JoinDate)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Insert a follow edge and bump both denormalized counts in one
    /// transaction. Returns `false` when the edge already exists.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let existing = Follows::find_by_id((follower_id, followed_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        Follows::insert(follows::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        })
        .exec(&txn)
        .await?;

        Users::update_many()
            .col_expr(
                users::Column::FollowingCount,
                Expr::col(users::Column::FollowingCount).add(1),
            )
            .filter(users::Column::Id.eq(follower_id))
            .exec(&txn)
            .await?;

        Users::update_many()
            .col_expr(
                users::Column::FollowersCount,
                Expr::col(users::Column::FollowersCount).add(1),
            )
            .filter(users::Column::Id.eq(followed_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Remove a follow edge and decrement both counts in one transaction.
    /// Returns `false` when no edge existed.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let result = Follows::delete_by_id((follower_id, followed_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(false);
        }

        Users::update_many()
            .col_expr(
                users::Column::FollowingCount,
                Expr::col(users::Column::FollowingCount).sub(1),
            )
            .filter(users::Column::Id.eq(follower_id))
            .exec(&txn)
            .await?;

        Users::update_many()
            .col_expr(
                users::Column::FollowersCount,
                Expr::col(users::Column::FollowersCount).sub(1),
            )
            .filter(users::Column::Id.eq(followed_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(true)
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let edge = Follows::find_by_id((follower_id, followed_id))
            .one(&self.conn)
            .await?;
        Ok(edge.is_some())
    }

    pub async fn followers_of(&self, user_id: i32) -> Result<Vec<UserSummary>> {
        let ids: Vec<i32> = Follows::find()
            .select_only()
            .column(follows::Column::FollowerId)
            .filter(follows::Column::FollowedId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await?;

        self.summaries_by_ids(&ids).await
    }

    pub async fn following_of(&self, user_id: i32) -> Result<Vec<UserSummary>> {
        let ids = self.following_ids(user_id).await?;
        self.summaries_by_ids(&ids).await
    }

    pub async fn following_ids(&self, user_id: i32) -> Result<Vec<i32>> {
        let ids = Follows::find()
            .select_only()
            .column(follows::Column::FollowedId)
            .filter(follows::Column::FollowerId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(ids)
    }

    async fn summaries_by_ids(&self, ids: &[i32]) -> Result<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(users::Column::Id.is_in(ids.to_vec()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(UserSummary::from).collect())
    }

    /// Delete an account along with its reviews, watchlist entries, and
    /// follow edges, fixing counterparties' counts and the averages of the
    /// movies the account had reviewed. One transaction end to end.
    pub async fn delete_cascade(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        if Users::find_by_id(id).one(&txn).await?.is_none() {
            return Ok(false);
        }

        // Movies whose averages change once this user's ratings are gone.
        let movie_ids: Vec<i32> = Reviews::find()
            .select_only()
            .column(reviews::Column::MovieId)
            .filter(reviews::Column::UserId.eq(id))
            .distinct()
            .into_tuple()
            .all(&txn)
            .await?;

        Reviews::delete_many()
            .filter(reviews::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        Watchlist::delete_many()
            .filter(watchlist::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        let followed: Vec<i32> = Follows::find()
            .select_only()
            .column(follows::Column::FollowedId)
            .filter(follows::Column::FollowerId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        let followers: Vec<i32> = Follows::find()
            .select_only()
            .column(follows::Column::FollowerId)
            .filter(follows::Column::FollowedId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !followed.is_empty() {
            Users::update_many()
                .col_expr(
                    users::Column::FollowersCount,
                    Expr::col(users::Column::FollowersCount).sub(1),
                )
                .filter(users::Column::Id.is_in(followed))
                .exec(&txn)
                .await?;
        }

        if !followers.is_empty() {
            Users::update_many()
                .col_expr(
                    users::Column::FollowingCount,
                    Expr::col(users::Column::FollowingCount).sub(1),
                )
                .filter(users::Column::Id.is_in(followers))
                .exec(&txn)
                .await?;
        }

        Follows::delete_many()
            .filter(
                Condition::any()
                    .add(follows::Column::FollowerId.eq(id))
                    .add(follows::Column::FollowedId.eq(id)),
            )
            .exec(&txn)
            .await?;

        Users::delete_by_id(id).exec(&txn).await?;

        for movie_id in movie_ids {
            super::review::recompute_average(&txn, movie_id).await?;
        }

        txn.commit().await?;

        info!("Removed user with ID: {}", id);
        Ok(true)
    }
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None, // output length (use default)
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
