pub mod availability;
pub mod cache;
pub mod filter;
pub mod genres;
pub mod load;
pub mod logos;
pub mod reports;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("lookup file error: {0}")]
    Lookup(String),
}
