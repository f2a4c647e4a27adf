use crate::TypeKind;
use thiserror::Error;

/// Misuse when assembling types and constraints.
///
/// These abort the pass outright, unlike ordinary verification failures which are collected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("{constraint} constraint needs a {expected} type, but `{found}` is a {found_kind} type")]
    KindMismatch {
        constraint: &'static str,
        expected: TypeKind,
        found: String,
        found_kind: TypeKind,
    },

    #[error("dependent type is missing its {component}")]
    MissingComponent { component: &'static str },

    #[error("`{0}` is already defined")]
    DuplicateName(String),

    #[error("`{0}` is not defined")]
    UnknownName(String),

    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    #[error("unknown mapping kind `{0}`")]
    UnknownMapping(String),

    #[error("invalid type syntax at {at}: {message}")]
    TypeSyntax { at: usize, message: String },
}

impl ConstructionError {
    pub(crate) fn kind_mismatch(
        constraint: &'static str,
        expected: TypeKind,
        found: &crate::Type,
    ) -> Self {
        ConstructionError::KindMismatch {
            constraint,
            expected,
            found: found.to_string(),
            found_kind: found.kind(),
        }
    }
}
