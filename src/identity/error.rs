//! Identity provider failures.

/// Why the identity provider did not produce an identity.
///
/// `Display` is the provider's own text so it can be shown to the user
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The provider refused the request (bad credentials, malformed email,
    /// weak password, duplicate account, ...).
    #[error("{message}")]
    Rejected {
        /// Provider error code, e.g. `auth/wrong-password` or `EMAIL_NOT_FOUND`.
        code: String,
        /// Provider error message.
        message: String,
    },

    /// The user closed the federated sign-in flow before it finished.
    #[error("The popup has been closed by the user before finalizing the operation.")]
    Cancelled,

    /// The provider could not be reached or answered with garbage.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    /// Builds a [`IdentityError::Rejected`].
    #[must_use]
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Provider error code, if the provider rejected the request.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code),
            Self::Cancelled => Some("auth/popup-closed-by-user"),
            Self::Unavailable(_) => None,
        }
    }
}
