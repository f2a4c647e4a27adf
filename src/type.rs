use crate::dependent::DependentType;
use crate::traits::{QuantumProperty, QuantumTraits, TopologyProperty, TopologyTraits};
use crate::Hierarchy;
use std::fmt;

/// A declared type.
///
/// Every refined type exclusively owns its base, so a `Type` is always a finite tree.
#[derive(Debug, Clone)]
pub enum Type {
    Basic(BasicType),
    Topology(TopologyType),
    Quantum(QuantumType),
    Dependent(DependentType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Basic,
    Topology,
    Quantum,
    Dependent,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicType {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TopologyType {
    base: Box<Type>,
    pub traits: TopologyTraits,
}

#[derive(Debug, Clone)]
pub struct QuantumType {
    base: Box<Type>,
    pub traits: QuantumTraits,
}

/// Which runtime representation a value of a verified type lowers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Classical,
    Topological,
    Quantum,
}

impl Type {
    pub fn basic(name: impl Into<String>) -> Self {
        Type::Basic(BasicType { name: name.into() })
    }

    pub fn topology(base: Type) -> Self {
        Type::Topology(TopologyType::new(base))
    }

    pub fn quantum(base: Type) -> Self {
        Type::Quantum(QuantumType::new(base))
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Basic(_) => TypeKind::Basic,
            Type::Topology(_) => TypeKind::Topology,
            Type::Quantum(_) => TypeKind::Quantum,
            Type::Dependent(_) => TypeKind::Dependent,
        }
    }

    /// Human-readable name of the type constructor
    pub fn name(&self) -> &str {
        match self {
            Type::Basic(b) => &b.name,
            Type::Topology(_) => "Topology",
            Type::Quantum(_) => "Quantum",
            Type::Dependent(_) => "Dependent",
        }
    }

    pub fn base(&self) -> Option<&Type> {
        match self {
            Type::Basic(_) => None,
            Type::Topology(t) => Some(t.base()),
            Type::Quantum(q) => Some(q.base()),
            Type::Dependent(d) => Some(d.base()),
        }
    }

    /// This type followed by each of its transitive bases, outermost first
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// The basic type at the bottom of the chain
    pub fn innermost(&self) -> &BasicType {
        match self {
            Type::Basic(b) => b,
            Type::Topology(t) => t.base().innermost(),
            Type::Quantum(q) => q.base().innermost(),
            Type::Dependent(d) => d.base().innermost(),
        }
    }

    pub fn as_topology(&self) -> Option<&TopologyType> {
        match self {
            Type::Topology(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_quantum(&self) -> Option<&QuantumType> {
        match self {
            Type::Quantum(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_dependent(&self) -> Option<&DependentType> {
        match self {
            Type::Dependent(d) => Some(d),
            _ => None,
        }
    }

    pub fn topology_traits(&self) -> Option<&TopologyTraits> {
        self.as_topology().map(|t| &t.traits)
    }

    pub fn quantum_traits(&self) -> Option<&QuantumTraits> {
        self.as_quantum().map(|q| &q.traits)
    }

    pub fn topology_traits_mut(&mut self) -> Option<&mut TopologyTraits> {
        match self {
            Type::Topology(t) => Some(&mut t.traits),
            _ => None,
        }
    }

    pub fn quantum_traits_mut(&mut self) -> Option<&mut QuantumTraits> {
        match self {
            Type::Quantum(q) => Some(&mut q.traits),
            _ => None,
        }
    }

    /// Whether `self ⊑ other`.
    ///
    /// Refinement kinds are invariant: a topology type is only ever a subtype of another topology
    /// type, likewise for quantum types. Dependent types are subtypes of whatever their base is a
    /// subtype of, and a type is a subtype of a dependent type when it is a subtype of its base and
    /// satisfies all of its refinements.
    pub fn is_subtype_of(&self, other: &Type, hierarchy: &Hierarchy) -> bool {
        match (self, other) {
            (Type::Basic(l), Type::Basic(r)) => hierarchy.is_subtype(&l.name, &r.name),
            (Type::Topology(l), Type::Topology(r)) => l.base().is_subtype_of(r.base(), hierarchy),
            (Type::Quantum(l), Type::Quantum(r)) => l.base().is_subtype_of(r.base(), hierarchy),

            (Type::Dependent(l), _) => l.is_subtype_of(other, hierarchy),
            (_, Type::Dependent(r)) => {
                self.is_subtype_of(r.base(), hierarchy) && r.refines(self)
            }

            _ => false,
        }
    }

    /// Whether this type is well-formed, see `TypeContext::verify` for the detailed form
    pub fn verify(&self) -> bool {
        match self {
            Type::Basic(_) => true,
            Type::Topology(t) => t.verify(),
            Type::Quantum(q) => q.verify(),
            Type::Dependent(d) => d.verify(),
        }
    }

    pub fn representation(&self) -> Representation {
        self.chain().fold(Representation::Classical, |repr, t| match (repr, t) {
            (Representation::Quantum, _) | (_, Type::Quantum(_)) => Representation::Quantum,
            (_, Type::Topology(_)) => Representation::Topological,
            (repr, _) => repr,
        })
    }
}

impl TopologyType {
    /// Properties a topology type must have to be well-formed
    pub const REQUIRED: &'static [TopologyProperty] = &[TopologyProperty::Continuous];

    pub fn new(base: Type) -> Self {
        Self::with_traits(base, TopologyTraits::new())
    }

    pub fn with_traits(base: Type, traits: TopologyTraits) -> Self {
        Self {
            base: Box::new(base),
            traits,
        }
    }

    pub fn base(&self) -> &Type {
        &self.base
    }

    pub fn set_property(&mut self, prop: TopologyProperty, value: bool) -> Option<bool> {
        self.traits.set_property(prop, value)
    }

    pub fn verify_property(&self, prop: TopologyProperty) -> bool {
        self.traits.verify_property(prop)
    }

    pub fn verify_continuity(&self) -> bool {
        self.traits.verify_all(Self::REQUIRED)
    }

    pub fn verify_preservation(&self) -> bool {
        self.traits.verify_axioms()
    }

    pub fn verify(&self) -> bool {
        self.base.verify() && self.verify_continuity() && self.verify_preservation()
    }
}

impl QuantumType {
    /// Properties a quantum type must have to be well-formed
    pub const REQUIRED: &'static [QuantumProperty] = &[QuantumProperty::Normalized];

    pub fn new(base: Type) -> Self {
        Self::with_traits(base, QuantumTraits::new())
    }

    pub fn with_traits(base: Type, traits: QuantumTraits) -> Self {
        Self {
            base: Box::new(base),
            traits,
        }
    }

    pub fn base(&self) -> &Type {
        &self.base
    }

    pub fn set_property(&mut self, prop: QuantumProperty, value: bool) -> Option<bool> {
        self.traits.set_property(prop, value)
    }

    pub fn verify_property(&self, prop: QuantumProperty) -> bool {
        self.traits.verify_property(prop)
    }

    pub fn verify(&self) -> bool {
        self.base.verify()
            && self.traits.verify_all(Self::REQUIRED)
            && self.traits.verify_consistent()
    }
}

pub struct Chain<'a> {
    next: Option<&'a Type>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Type;

    fn next(&mut self) -> Option<&'a Type> {
        let current = self.next?;
        self.next = current.base();
        Some(current)
    }
}

impl TypeKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TypeKind::Basic => "basic",
            TypeKind::Topology => "topology",
            TypeKind::Quantum => "quantum",
            TypeKind::Dependent => "dependent",
        }
    }
}

impl From<BasicType> for Type {
    fn from(b: BasicType) -> Self {
        Type::Basic(b)
    }
}

impl From<TopologyType> for Type {
    fn from(t: TopologyType) -> Self {
        Type::Topology(t)
    }
}

impl From<QuantumType> for Type {
    fn from(q: QuantumType) -> Self {
        Type::Quantum(q)
    }
}

impl From<DependentType> for Type {
    fn from(d: DependentType) -> Self {
        Type::Dependent(d)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Basic(b) => b.name.fmt(f),
            Type::Topology(t) => t.fmt(f),
            Type::Quantum(q) => q.fmt(f),
            Type::Dependent(d) => d.fmt(f),
        }
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Topology<{}>", self.base)
    }
}

impl fmt::Display for QuantumType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Quantum<{}>", self.base)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.describe().fmt(f)
    }
}
