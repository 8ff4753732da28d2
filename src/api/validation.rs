use super::ApiError;
use crate::config::ServerConfig;

pub const MAX_REVIEW_LENGTH: usize = 1000;

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();

    if trimmed.chars().count() < 3 {
        return Err(ApiError::validation(
            "Username must be at least 3 characters long",
        ));
    }

    if trimmed.chars().count() > 50 {
        return Err(ApiError::validation(
            "Username must be 50 characters or less",
        ));
    }

    Ok(trimmed)
}

/// Lightweight shape check, not RFC-grade parsing.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim();

    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !trimmed.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ApiError::validation("Please provide a valid email"));
    }

    Ok(trimmed.to_lowercase())
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.chars().count() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters long",
        ));
    }
    Ok(password)
}

pub fn validate_rating(rating: i32) -> Result<i32, ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::validation(format!(
            "Invalid rating: {}. Rating must be between 1 and 5",
            rating
        )));
    }
    Ok(rating)
}

pub fn validate_review_text(text: &str) -> Result<&str, ApiError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation("Please provide a review text"));
    }

    if trimmed.chars().count() > MAX_REVIEW_LENGTH {
        return Err(ApiError::validation(format!(
            "Review cannot be longer than {} characters",
            MAX_REVIEW_LENGTH
        )));
    }

    Ok(trimmed)
}

pub fn validate_pagination(
    page: Option<u64>,
    limit: Option<u64>,
    server: &ServerConfig,
) -> Result<(u64, u64), ApiError> {
    let page = page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::validation("Page must be a positive integer"));
    }

    let limit = limit.unwrap_or(server.default_page_size);
    if limit == 0 || limit > server.max_page_size {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between 1 and {}",
            limit, server.max_page_size
        )));
    }

    Ok((page, limit))
}
