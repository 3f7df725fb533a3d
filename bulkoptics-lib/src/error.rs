use std::fmt;

#[derive(Debug)]
pub enum OpticsError {
    InvalidDistribution(String),
    InvalidParameter(String),
    OutOfRange { value: f64, min: f64, max: f64 },
    TableMismatch(String),
    DataError(String),
    /// Failure reported by an external efficiency source.
    Source(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, OpticsError>;

impl fmt::Display for OpticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDistribution(msg) => write!(f, "invalid size distribution: {msg}"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::OutOfRange { value, min, max } => {
                write!(f, "diameter {value} out of tabulated range [{min}, {max}]")
            }
            Self::TableMismatch(msg) => write!(f, "efficiency table mismatch: {msg}"),
            Self::DataError(msg) => write!(f, "data error: {msg}"),
            Self::Source(err) => write!(f, "efficiency source failed: {err}"),
        }
    }
}

impl std::error::Error for OpticsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
