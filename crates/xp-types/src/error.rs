/// Malformed request input. Reported to the caller, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingWallet,
    MalformedWallet(String),
    UnknownAction(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingWallet => write!(f, "wallet address is required"),
            Self::MalformedWallet(w) => write!(f, "malformed wallet address: {w}"),
            Self::UnknownAction(a) => write!(f, "unknown action: {a}"),
        }
    }
}

impl std::error::Error for ValidationError {}
