use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    /// JSON array of genre names, e.g. `["Drama","Thriller"]`.
    pub genres: String,

    pub release_year: i32,

    pub director: String,

    /// JSON array of cast member names.
    pub cast: String,

    #[sea_orm(column_type = "Text")]
    pub synopsis: String,

    pub poster_url: String,

    pub trailer_url: Option<String>,

    /// Runtime in minutes.
    pub duration: Option<i32>,

    /// Denormalized mean of this movie's review ratings; 0 when unreviewed.
    pub average_rating: f64,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::watchlist::Entity")]
    Watchlist,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::watchlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Watchlist.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
