//! Error types for the session layer.

/// Errors that can occur while establishing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The video token provider failed or refused to mint a token.
    /// The join that triggered the mint is aborted; no player state is
    /// left behind.
    #[error("video token request failed: {0}")]
    TokenMint(String),
}
