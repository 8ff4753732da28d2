pub mod auth;

pub use auth::{AuthError, AuthService, AuthenticatedUser, JwtAuthService, generate_secret};
