use rollcall_http::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("no database found for {0}")]
    DatabaseNotFound(String),
}
