use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cached value under {key} is not {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
