/// The single failure condition surfaced by the state aggregator.
///
/// Updates and suggestions never fail on well-typed input; missing values fall
/// back to defaults. Only documents whose values have the wrong type (a
/// non-numeric rating, an unknown stage, an event for the other domain) are
/// rejected, and all of them are reported the same way.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StateError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
