use thiserror::Error;

/// The grammar tree itself is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The builder holds no nodes at all; there is nothing to compile.
    #[error("the fluent structure contains no calls")]
    EmptyGrammar,

    /// A sequence node with no children reached the compiler.
    #[error("a sequence in the fluent structure contains no calls")]
    EmptySequence,

    /// An alternation node with no alternatives reached the compiler.
    #[error("an alternation in the fluent structure has no alternatives")]
    EmptyAlternation,

    /// A one-terminal alternation may only list plain calls.
    #[error("a one-terminal alternation may only contain plain calls, found subtree '{node}'")]
    NonTerminalAlternative { node: String },

    /// A node carries a modifier that is meaningless in its position,
    /// e.g. a terminal flagged as an alternation.
    #[error("inconsistent fluent tree: {detail}")]
    InconsistentTree { detail: String },
}

/// A call name in the grammar could not be tied to exactly one operation
/// of the subject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("method '{name}' is not found on subject '{subject}'")]
    MethodNotFound { name: String, subject: String },

    #[error("method name '{name}' is ambiguous on subject '{subject}', use the full signature")]
    AmbiguousMethod { name: String, subject: String },

    #[error("cannot compose fluent grammars built for different subjects: '{expected}' and '{found}'")]
    SubjectMismatch { expected: String, found: String },
}

/// The tail of the grammar does not determine a single exit type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExitTypeError {
    #[error("the last call in the fluent structure cannot be optional: '{node}'")]
    OptionalLast { node: String },

    #[error("the last call in the fluent structure cannot repeat: '{node}'")]
    RepeatingLast { node: String },

    #[error("the alternatives disagree on the exit type: {}", types.join(", "))]
    DisagreeingExitTypes { types: Vec<String> },

    #[error("the fluent structure has no exit type")]
    NoExitType,
}

/// The builder was configured against the catalog in an impossible way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("method '{name}' does not exist on subject '{subject}' and cannot be excluded from the chain")]
    UnknownExclusion { name: String, subject: String },

    #[error("two subject methods normalize to the same signature '{signature}'")]
    DuplicateMethod { signature: String },

    #[error("cloner method '{name}' must not take parameters")]
    ClonerHasParameters { name: String },

    #[error("cloner method '{name}' must return the subject type '{subject}'")]
    ClonerWrongReturnType { name: String, subject: String },

    #[error("interface name '{name}' is used for more than one node")]
    DuplicateInterfaceName { name: String },
}

/// Any failure the compiler can surface. All variants are fatal; the
/// compilation that raised one produces no output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    ExitType(#[from] ExitTypeError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
