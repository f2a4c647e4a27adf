use crate::error::ConstructionError;
use crate::traits::{QuantumProperty, TopologyProperty};
use crate::{Hierarchy, Type};
use std::fmt;
use std::sync::Arc;

/// A refinement over a type, evaluated against the base of a dependent type
pub type Predicate = Arc<dyn Fn(&Type) -> bool + Send + Sync>;

/// A base type refined by a predicate plus one topological and one quantum constraint.
///
/// All four components are always present; use `DependentTypeBuilder` to assemble one
/// incrementally.
#[derive(Clone)]
pub struct DependentType {
    base: Box<Type>,
    predicate: Predicate,
    topology: Predicate,
    quantum: Predicate,
}

impl DependentType {
    pub fn new(base: Type, predicate: Predicate, topology: Predicate, quantum: Predicate) -> Self {
        Self {
            base: Box::new(base),
            predicate,
            topology,
            quantum,
        }
    }

    pub fn base(&self) -> &Type {
        &self.base
    }

    pub fn predicate(&self, t: &Type) -> bool {
        (self.predicate)(t)
    }

    pub fn topology_constraint(&self, t: &Type) -> bool {
        (self.topology)(t)
    }

    pub fn quantum_constraint(&self, t: &Type) -> bool {
        (self.quantum)(t)
    }

    /// Whether `t` satisfies the predicate and both constraints
    pub fn refines(&self, t: &Type) -> bool {
        self.predicate(t) && self.topology_constraint(t) && self.quantum_constraint(t)
    }

    pub fn verify(&self) -> bool {
        self.base.verify() && self.refines(&self.base)
    }

    /// Whether `self ⊑ other`, see `Type::is_subtype_of`
    pub fn is_subtype_of(&self, other: &Type, hierarchy: &Hierarchy) -> bool {
        match other {
            Type::Dependent(r) => {
                self.base.is_subtype_of(r.base(), hierarchy)
                    && (self.same_refinements(r) || r.refines(&self.base))
            }
            _ => self.base.is_subtype_of(other, hierarchy),
        }
    }

    /// Whether both dependent types were built from the very same refinement closures
    pub fn same_refinements(&self, other: &DependentType) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
            && Arc::ptr_eq(&self.topology, &other.topology)
            && Arc::ptr_eq(&self.quantum, &other.quantum)
    }
}

pub fn always() -> Predicate {
    Arc::new(|_: &Type| true)
}

pub fn never() -> Predicate {
    Arc::new(|_: &Type| false)
}

pub fn predicate(f: impl Fn(&Type) -> bool + Send + Sync + 'static) -> Predicate {
    Arc::new(f)
}

/// Every predicate holds. An empty list always holds.
pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
    Arc::new(move |t: &Type| predicates.iter().all(|p| p(t)))
}

/// The type is a topology type whose registry has every one of `props`
pub fn topology_requires(props: &[TopologyProperty]) -> Predicate {
    let props = props.to_vec();
    Arc::new(move |t: &Type| {
        t.topology_traits()
            .map_or(false, |traits| traits.verify_all(&props))
    })
}

/// The type is a quantum type whose registry has every one of `props`
pub fn quantum_requires(props: &[QuantumProperty]) -> Predicate {
    let props = props.to_vec();
    Arc::new(move |t: &Type| {
        t.quantum_traits()
            .map_or(false, |traits| traits.verify_all(&props))
    })
}

/// Incremental construction of a `DependentType`.
///
/// Leaving out any component is a construction error rather than an implicit default.
#[derive(Default)]
pub struct DependentTypeBuilder {
    base: Option<Type>,
    predicate: Option<Predicate>,
    topology: Option<Predicate>,
    quantum: Option<Predicate>,
}

impl DependentTypeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn base(mut self, base: Type) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn predicate(mut self, p: Predicate) -> Self {
        self.predicate = Some(p);
        self
    }

    #[must_use]
    pub fn topology(mut self, p: Predicate) -> Self {
        self.topology = Some(p);
        self
    }

    #[must_use]
    pub fn quantum(mut self, p: Predicate) -> Self {
        self.quantum = Some(p);
        self
    }

    pub fn build(self) -> Result<DependentType, ConstructionError> {
        let missing = |component| ConstructionError::MissingComponent { component };

        Ok(DependentType::new(
            self.base.ok_or_else(|| missing("base type"))?,
            self.predicate.ok_or_else(|| missing("predicate"))?,
            self.topology.ok_or_else(|| missing("topology constraint"))?,
            self.quantum.ok_or_else(|| missing("quantum constraint"))?,
        ))
    }

    pub fn create_refinement_type(
        base: Type,
        refinement: Predicate,
        topology: Predicate,
        quantum: Predicate,
    ) -> DependentType {
        DependentType::new(base, refinement, topology, quantum)
    }

    pub fn create_quantum_dependent_type(base: Type, quantum: Predicate) -> DependentType {
        Self::create_refinement_type(base, always(), always(), quantum)
    }

    pub fn create_topological_dependent_type(base: Type, topology: Predicate) -> DependentType {
        Self::create_refinement_type(base, always(), topology, always())
    }

    pub fn create_composite_dependent_type(
        base: Type,
        topology: Vec<Predicate>,
        quantum: Vec<Predicate>,
    ) -> DependentType {
        Self::create_refinement_type(base, always(), all_of(topology), all_of(quantum))
    }
}

impl fmt::Display for DependentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dependent<{}>", self.base)
    }
}

impl fmt::Debug for DependentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DependentType")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}
