use thiserror::Error;

/// Unified error type for the zonecraft engine
#[derive(Debug, Error)]
pub enum ZoneCraftError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Record type / schema errors
    #[error("unknown or unsupported record type: {0}")]
    UnknownType(String),

    // Zone file errors
    #[error("zone parse error: {0}")]
    ZoneParse(String),
    #[error("invalid TTL value: {0}")]
    InvalidTtl(String),
    #[error("invalid resource record type: {0}")]
    InvalidRRType(String),
    #[error("zone missing required SOA record")]
    MissingSoa,
    #[error("zone contains duplicate SOA records")]
    DuplicateSoa,

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

/// Stable error kind surfaced to the boundary layer. The transport adapter
/// (HTTP or otherwise) maps these to status codes; the engine never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    BadGateway,
    Internal,
}

impl ZoneCraftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::BadRequest(_)
            | Self::UnknownType(_)
            | Self::InvalidTtl(_)
            | Self::InvalidRRType(_)
            | Self::MissingSoa
            | Self::DuplicateSoa => ErrorKind::BadRequest,
            Self::BadGateway(_) => ErrorKind::BadGateway,
            Self::Internal(_) | Self::Io(_) | Self::ZoneParse(_) | Self::Config(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ZoneCraftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ZoneCraftError::NotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ZoneCraftError::UnknownType("BOGUS".into()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            ZoneCraftError::ZoneParse("bad line".into()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            ZoneCraftError::BadGateway("timed out".into()).kind(),
            ErrorKind::BadGateway
        );
    }
}
