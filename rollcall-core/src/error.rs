use thiserror::Error;

/// Errors surfaced by range extraction. Everything else (unreadable rows,
/// failed scroll steps, slow loads) degrades into a partial result.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("scroll panel unavailable: {0}")]
    PanelUnavailable(String),
}
