use crate::entities::movies;

#[derive(Debug, Clone)]
pub struct Movie {
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

impl From<movies::Model> for Movie {
    fn from(model: movies::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            genres: serde_json::from_str(&model.genres).unwrap_or_default(),
            release_year: model.release_year,
            director: model.director,
            cast: serde_json::from_str(&model.cast).unwrap_or_default(),
            synopsis: model.synopsis,
            poster_url: model.poster_url,
            trailer_url: model.trailer_url,
            duration: model.duration,
            average_rating: model.average_rating,
            created_at: model.created_at,
        }
    }
}

/// The slice of a movie shown next to reviews in feeds and profiles.
#[derive(Debug, Clone)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub poster_url: String,
}

impl From<movies::Model> for MovieSummary {
    fn from(model: movies::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            poster_url: model.poster_url,
        }
    }
}

/// Catalog entry as submitted for creation; the id, average, and creation
/// timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub genres: Vec<String>,
    pub release_year: i32,
    pub director: String,
    pub cast: Vec<String>,
    pub synopsis: String,
    pub poster_url: String,
    pub trailer_url: Option<String>,
    pub duration: Option<i32>,
}
