mod r#type;
pub use r#type::{BasicType, Chain, QuantumType, Representation, TopologyType, Type, TypeKind};

mod hierarchy;
pub use hierarchy::Hierarchy;

pub mod traits;
pub use traits::{
    AnyProperty, Property, PropertyState, QuantumProperty, QuantumTraits, TopologyProperty,
    TopologyTraits, Traits,
};

pub mod mapping;
pub use mapping::{MappingKind, QuantumOperation};

pub mod dependent;
pub use dependent::{DependentType, DependentTypeBuilder, Predicate};

mod check;
pub use check::{CheckResult, ErrorHandler, Failure, RefinementPart, TypeContext};

mod constraint;
pub use constraint::{Constraint, ConstraintKind, ConstraintSystem, Report, Verdict};

mod env;
pub use env::TypeEnvironment;

pub mod infer;
pub use infer::{Goal, InferenceEngine, InferenceError, Solution, TEnv, VarId};

mod config;
pub use config::Config;

mod error;
pub use error::ConstructionError;

pub mod frontend;

#[cfg(test)]
mod tests;
