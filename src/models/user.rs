use crate::entities::users;

/// Account data as handed to the rest of the crate (without the password hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
    pub join_date: String,
    pub is_admin: bool,
    pub followers_count: i32,
    pub following_count: i32,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            profile_picture: model.profile_picture,
            join_date: model.join_date,
            is_admin: model.is_admin,
            followers_count: model.followers_count,
            following_count: model.following_count,
        }
    }
}

/// The slice of a user shown next to reviews and in follower lists.
#[derive(Debug, Clone)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub profile_picture: String,
}

impl From<users::Model> for UserSummary {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            profile_picture: model.profile_picture,
        }
    }
}
