use thiserror::Error;

/// Errors raised while turning a grammar expression string into a
/// builder tree. Resolution failures from the builder pass through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unexpected character '{ch}' at position {pos} in grammar expression")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected '{token}' in grammar expression")]
    UnexpectedToken { token: String },

    #[error("expected an interface name after '#'")]
    MissingName,

    #[error("missing closing parenthesis in grammar expression")]
    UnbalancedParen,

    #[error("empty group in grammar expression")]
    EmptyGroup,

    #[error("extra characters at the end of the grammar expression")]
    TrailingInput,

    #[error(transparent)]
    Grammar(#[from] typeweave_core::Error),
}
