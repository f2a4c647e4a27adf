use crate::mapping::MappingKind;
use crate::traits::{Missing, QuantumProperty, Rule, TopologyProperty};
use crate::{DependentType, Hierarchy, QuantumType, TopologyType, Type};
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt;

/// Everything verification needs besides the types themselves
#[derive(Clone, Copy, Debug)]
pub struct TypeContext<'a> {
    hierarchy: &'a Hierarchy,
    ehandler: ErrorHandler,
}

/// How much detail a verification failure carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorHandler {
    PanicOnError,
    Cheap,
    Expensive,
}

/// Why a verification did not hold.
///
/// Failures are expected outcomes and are reported in batch; they are not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    NotSubtype {
        sub: String,
        sup: String,
    },
    MissingProperties {
        subject: String,
        missing: SmallVec<[Missing; 2]>,
    },
    AxiomViolated {
        subject: String,
        rule: &'static Rule,
    },
    /// An entangled quantum type declared to not be in superposition
    Incoherent {
        subject: String,
    },
    Refinement {
        subject: String,
        part: RefinementPart,
    },
    Mapping {
        kind: MappingKind,
        source: String,
        target: String,
        missing: SmallVec<[Missing; 2]>,
    },
    InBase {
        subject: String,
        inner: Box<Failure>,
    },
    Composite {
        index: usize,
        inner: Box<Failure>,
    },

    /// When the handler is `ErrorHandler::Cheap`
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementPart {
    Predicate,
    Topology,
    Quantum,
}

pub type CheckResult = Result<(), Failure>;

impl<'a> TypeContext<'a> {
    pub fn new(hierarchy: &'a Hierarchy, ehandler: ErrorHandler) -> Self {
        Self {
            hierarchy,
            ehandler,
        }
    }

    pub fn hierarchy(&self) -> &'a Hierarchy {
        self.hierarchy
    }

    pub fn ehandler(&self) -> ErrorHandler {
        self.ehandler
    }

    #[must_use]
    pub fn with_handler(self, ehandler: ErrorHandler) -> Self {
        Self { ehandler, ..self }
    }

    pub fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        sub.is_subtype_of(sup, self.hierarchy)
    }

    pub fn check_subtype(&self, sub: &Type, sup: &Type) -> CheckResult {
        if self.is_subtype(sub, sup) {
            Ok(())
        } else {
            Err(self.ehandler.fail(|| Failure::NotSubtype {
                sub: sub.to_string(),
                sup: sup.to_string(),
            }))
        }
    }

    /// Detailed form of `Type::verify`, agreeing with it on every input
    pub fn verify(&self, t: &Type) -> CheckResult {
        match t {
            Type::Basic(_) => Ok(()),
            Type::Topology(topo) => self.verify_topology(topo),
            Type::Quantum(q) => self.verify_quantum(q),
            Type::Dependent(d) => self.verify_dependent(d),
        }
    }

    fn verify_base(&self, t: &dyn fmt::Display, base: &Type) -> CheckResult {
        self.verify(base).map_err(|inner| {
            self.ehandler.fail(|| Failure::InBase {
                subject: t.to_string(),
                inner: Box::new(inner),
            })
        })
    }

    pub fn verify_topology(&self, t: &TopologyType) -> CheckResult {
        self.verify_base(t, t.base())?;
        self.require_topology(t, TopologyType::REQUIRED)?;

        match t.traits.violated_rule() {
            None => Ok(()),
            Some(rule) => Err(self.ehandler.fail(|| Failure::AxiomViolated {
                subject: t.to_string(),
                rule,
            })),
        }
    }

    pub fn verify_quantum(&self, t: &QuantumType) -> CheckResult {
        self.verify_base(t, t.base())?;
        self.require_quantum(t, QuantumType::REQUIRED)?;

        if t.traits.verify_consistent() {
            Ok(())
        } else {
            Err(self.ehandler.fail(|| Failure::Incoherent {
                subject: t.to_string(),
            }))
        }
    }

    pub fn verify_dependent(&self, d: &DependentType) -> CheckResult {
        self.verify_base(d, d.base())?;

        let part = if !d.predicate(d.base()) {
            RefinementPart::Predicate
        } else if !d.topology_constraint(d.base()) {
            RefinementPart::Topology
        } else if !d.quantum_constraint(d.base()) {
            RefinementPart::Quantum
        } else {
            return Ok(());
        };

        Err(self.ehandler.fail(|| Failure::Refinement {
            subject: d.to_string(),
            part,
        }))
    }

    pub fn require_topology(&self, t: &TopologyType, props: &[TopologyProperty]) -> CheckResult {
        self.missing_properties(t, t.traits.missing(props))
    }

    pub fn require_quantum(&self, t: &QuantumType, props: &[QuantumProperty]) -> CheckResult {
        self.missing_properties(t, t.traits.missing(props))
    }

    fn missing_properties(
        &self,
        t: &dyn fmt::Display,
        missing: SmallVec<[Missing; 2]>,
    ) -> CheckResult {
        if missing.is_empty() {
            Ok(())
        } else {
            Err(self.ehandler.fail(|| Failure::MissingProperties {
                subject: t.to_string(),
                missing,
            }))
        }
    }

    pub fn check_mapping(
        &self,
        kind: MappingKind,
        source: &TopologyType,
        target: &TopologyType,
    ) -> CheckResult {
        if source.traits.verify_mapping(kind, &target.traits) {
            return Ok(());
        }

        let prop = [kind.requirement()];
        Err(self.ehandler.fail(|| Failure::Mapping {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            missing: source
                .traits
                .missing(&prop)
                .into_iter()
                .chain(target.traits.missing(&prop))
                .collect(),
        }))
    }
}

impl ErrorHandler {
    /// Builds the failure only when this handler wants the detail
    pub fn fail(self, failure: impl FnOnce() -> Failure) -> Failure {
        match self {
            ErrorHandler::Cheap => Failure::Discarded,
            ErrorHandler::PanicOnError => panic!("verification failed: {}", failure()),
            ErrorHandler::Expensive => failure(),
        }
    }
}

impl Failure {
    /// The innermost failure, skipping through base and composite wrappers
    pub fn root(&self) -> &Failure {
        match self {
            Failure::InBase { inner, .. } | Failure::Composite { inner, .. } => inner.root(),
            other => other,
        }
    }

    pub fn missing(&self) -> &[Missing] {
        match self.root() {
            Failure::MissingProperties { missing, .. } | Failure::Mapping { missing, .. } => {
                missing.as_slice()
            }
            _ => &[],
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Failure::NotSubtype { sub, sup } => write!(f, "{} is not a subtype of {}", sub, sup),
            Failure::MissingProperties { subject, missing } => write!(
                f,
                "{} does not have {}",
                subject,
                missing.iter().format(", ")
            ),
            Failure::AxiomViolated { subject, rule } => {
                write!(f, "{} violates {}", subject, rule)
            }
            Failure::Incoherent { subject } => {
                write!(f, "{} is entangled but not in superposition", subject)
            }
            Failure::Refinement { subject, part } => {
                write!(f, "{} fails its {} refinement", subject, part)
            }
            Failure::Mapping {
                kind,
                source,
                target,
                missing,
            } => write!(
                f,
                "{} from {} to {} requires {}",
                kind,
                source,
                target,
                missing.iter().format(", ")
            ),
            Failure::InBase { subject, inner } => write!(f, "in base of {}: {}", subject, inner),
            Failure::Composite { index, inner } => write!(f, "in part {}: {}", index, inner),
            Failure::Discarded => "verification failed".fmt(f),
        }
    }
}

impl fmt::Display for RefinementPart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RefinementPart::Predicate => "predicate",
            RefinementPart::Topology => "topological",
            RefinementPart::Quantum => "quantum",
        }
        .fmt(f)
    }
}
