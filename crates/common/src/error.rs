/// Error returned when a severity name or rank is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeverityError {
    #[error("unknown severity name: {0:?}")]
    UnknownName(String),

    #[error("severity rank {0} is outside the range 0..=5")]
    UnknownRank(i64),
}
