//! Errors raised while reading schema metadata.
//!
//! Only malformed input is raised. Conditions that are expected while the
//! schema is still propagating (an unknown user defined type, a view whose
//! base table is not known yet, an unreadable option block) degrade to a
//! documented fallback and a log line instead.

use cql_types::InvalidTypeError;
use thiserror::Error;

/// A textual type name violates the type grammar.
///
/// Type names are read from the server's own schema tables, so these
/// errors point at a bug or a grammar this crate does not know rather
/// than at bad user input.
///
/// Positions are 1-based and counted in characters of `input`, which is
/// always the full text handed to the parser.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypeParseError {
    /// `list`, `set`, `map` or `frozen` got the wrong number of parameters.
    #[error(
        "Type {input:?}: {keyword} expects {expected} parameter(s), got {got} (at char {position})"
    )]
    InvalidParameterCount {
        /// Text being parsed.
        input: String,
        /// Position of the keyword.
        position: usize,
        /// The keyword whose parameter list is wrong.
        keyword: &'static str,
        /// Expected number of parameters.
        expected: usize,
        /// Number of parameters found.
        got: usize,
    },
    /// A character that cannot appear at this point of a type name.
    #[error("Type {input:?}: unexpected character {found:?} at char {position}, expected {expected}")]
    UnexpectedCharacter {
        /// Text being parsed.
        input: String,
        /// Position of the offending character.
        position: usize,
        /// The character found.
        found: char,
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// The input ended inside a parameter list.
    #[error("Type {input:?}: unexpected end of input at char {position}")]
    UnexpectedEndOfInput {
        /// Text being parsed.
        input: String,
        /// Position just past the end of the input.
        position: usize,
    },
    /// A raw parameter's angle brackets are not balanced.
    #[error("Type {input:?}: non closed angle brackets starting at char {position}")]
    UnclosedAngleBrackets {
        /// Text being parsed.
        input: String,
        /// Position of the opening `<`.
        position: usize,
    },
    /// No type name where one was expected, e.g. `<int>` or `map<int,,int>`.
    #[error("Type {input:?}: missing type name at char {position}")]
    MissingTypeName {
        /// Text being parsed.
        input: String,
        /// Position where the name should start.
        position: usize,
    },
    /// Type parameters are nested deeper than the configured limit.
    #[error("Type {input:?}: nesting deeper than {limit} levels at char {position}")]
    NestingTooDeep {
        /// Text being parsed.
        input: String,
        /// Position of the parameter exceeding the limit.
        position: usize,
        /// The configured limit.
        limit: usize,
    },
}

impl TypeParseError {
    /// The 1-based character position the error refers to.
    pub fn position(&self) -> usize {
        match self {
            TypeParseError::InvalidParameterCount { position, .. }
            | TypeParseError::UnexpectedCharacter { position, .. }
            | TypeParseError::UnexpectedEndOfInput { position, .. }
            | TypeParseError::UnclosedAngleBrackets { position, .. }
            | TypeParseError::MissingTypeName { position, .. }
            | TypeParseError::NestingTooDeep { position, .. } => *position,
        }
    }
}

/// Failure to build keyspace, table or view metadata.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum MetadataError {
    /// A column or field type could not be parsed.
    #[error(transparent)]
    Type(#[from] TypeParseError),
    /// Some partition key position has no column.
    #[error("Partition key column with position {0} is missing from metadata")]
    IncompletePartitionKey(i32),
    /// Some clustering key position has no column.
    #[error("Clustering key column with position {0} is missing from metadata")]
    IncompleteClusteringKey(i32),
    /// User defined types of a keyspace reference each other in a cycle.
    #[error("Detected circular dependency between user defined types")]
    CircularTypeDependency,
    /// A user defined type row lists a different number of field names and field types.
    #[error("User defined type {type_name} has {names} field names but {types} field types")]
    UdtFieldCountMismatch {
        /// Name of the type.
        type_name: String,
        /// Number of field names in the row.
        names: usize,
        /// Number of field types in the row.
        types: usize,
    },
    /// The column kind string is none of the known kinds.
    #[error("Unknown column kind {kind:?} of column {column}")]
    UnknownColumnKind {
        /// The column carrying the kind.
        column: String,
        /// The unrecognized kind string.
        kind: String,
    },
}

/// A table option literal could not be read.
#[derive(Clone, Debug, Error)]
#[error("Invalid value of table option {option}: {source}")]
pub struct TableOptionError {
    /// Name of the option.
    pub option: String,
    /// What was wrong with its literal.
    #[source]
    pub source: InvalidTypeError,
}
