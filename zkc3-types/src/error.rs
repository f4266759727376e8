pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Value outside the range the panel accepts
    #[error("Validation error: {0}")]
    Validation(String),
    
    /// Malformed textual value
    #[error("Parse error: {0}")]
    Parse(String),
}
