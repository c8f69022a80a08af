//! Error taxonomy for the extraction layer.
//!
//! Zero products is a valid empty result, never an error; the only hard
//! failure the extractor can raise is input that cannot be parsed at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page input could not be parsed as HTML at all.
    #[error("unparsable page input: {0}")]
    ParseFailure(String),
}
