use crate::traits::{QuantumProperty, QuantumTraits, TopologyProperty, TopologyTraits};
use std::fmt;

/// Kinds of maps between two topological spaces
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MappingKind {
    Homeomorphism,
    Homotopy,
    Embedding,
}

/// Kinds of operations between two quantum states
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum QuantumOperation {
    Gate,
    Measurement,
    Evolution,
}

impl MappingKind {
    /// The property both sides of the mapping must have
    pub fn requirement(self) -> TopologyProperty {
        match self {
            MappingKind::Homeomorphism => TopologyProperty::Continuous,
            MappingKind::Homotopy => TopologyProperty::Connected,
            MappingKind::Embedding => TopologyProperty::Hausdorff,
        }
    }

    /// Properties carried over from the source to the target of the mapping
    pub fn preserves(self) -> &'static [TopologyProperty] {
        use TopologyProperty::*;

        match self {
            // homeomorphic spaces agree on every topological property
            MappingKind::Homeomorphism => &[
                Continuous,
                Connected,
                Compact,
                Hausdorff,
                Metrizable,
                T0,
                T1,
                T2,
                Regular,
                Normal,
                Paracompact,
                LocallyCompact,
            ],
            MappingKind::Homotopy => &[Connected],
            // hereditary properties survive passing to a subspace
            MappingKind::Embedding => &[Hausdorff, Metrizable, T0, T1, T2, Regular],
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "homeomorphism" => Some(MappingKind::Homeomorphism),
            "homotopy" => Some(MappingKind::Homotopy),
            "embedding" => Some(MappingKind::Embedding),
            _ => None,
        }
    }
}

pub fn verify_mapping(kind: MappingKind, source: &TopologyTraits, target: &TopologyTraits) -> bool {
    let prop = kind.requirement();
    source.verify_property(prop) && target.verify_property(prop)
}

pub fn verify_operation(op: QuantumOperation, source: &QuantumTraits, target: &QuantumTraits) -> bool {
    match op {
        QuantumOperation::Gate => {
            source.verify_quantum_gate() && target.verify_property(QuantumProperty::Normalized)
        }
        QuantumOperation::Measurement => target.verify_measurement(),
        QuantumOperation::Evolution => {
            source.verify_property(QuantumProperty::Unitary)
                && source.verify_property(QuantumProperty::Coherent)
                && target.verify_property(QuantumProperty::Coherent)
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MappingKind::Homeomorphism => "homeomorphism",
            MappingKind::Homotopy => "homotopy",
            MappingKind::Embedding => "embedding",
        }
        .fmt(f)
    }
}

impl fmt::Display for QuantumOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuantumOperation::Gate => "gate",
            QuantumOperation::Measurement => "measurement",
            QuantumOperation::Evolution => "evolution",
        }
        .fmt(f)
    }
}
