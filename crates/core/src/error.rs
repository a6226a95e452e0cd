/// Domain-level error type shared across crates.
///
/// HTTP-specific concerns (status codes, response envelopes) live in the
/// api crate; this enum only describes what went wrong in domain terms.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed a domain validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}
