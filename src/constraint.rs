use crate::check::{CheckResult, ErrorHandler, Failure, RefinementPart, TypeContext};
use crate::error::ConstructionError;
use crate::mapping::MappingKind;
use crate::traits::{QuantumProperty, TopologyProperty};
use crate::{DependentType, QuantumType, TopologyType, Type, TypeKind};
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::fmt;

/// A verifiable claim about one or two types.
///
/// Constraints only borrow their operands, so verifying one never changes a type.
#[derive(Clone, Debug)]
pub enum Constraint<'t> {
    Subtype {
        sub: &'t Type,
        sup: &'t Type,
    },
    Topological(&'t TopologyType),
    Quantum(&'t QuantumType),
    Dependent {
        base: &'t Type,
        dependent: &'t DependentType,
    },
    Mapping {
        kind: MappingKind,
        source: &'t TopologyType,
        target: &'t TopologyType,
    },
    /// Holds when every part holds, checked in order
    Composite(Vec<Constraint<'t>>),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ConstraintKind {
    Subtype,
    Topological,
    Quantum,
    Dependent,
    Mapping,
    Composite,
}

impl<'t> Constraint<'t> {
    /// What a topological constraint demands of its operand
    pub const TOPOLOGICAL: &'static [TopologyProperty] = &[
        TopologyProperty::Connected,
        TopologyProperty::Continuous,
        TopologyProperty::Compact,
    ];

    /// What a quantum constraint demands of its operand
    pub const QUANTUM: &'static [QuantumProperty] = &[
        QuantumProperty::Unitary,
        QuantumProperty::Normalized,
        QuantumProperty::Entangled,
    ];

    pub fn subtype(sub: &'t Type, sup: &'t Type) -> Self {
        Constraint::Subtype { sub, sup }
    }

    /// Both types are subtypes of each other
    pub fn equal(a: &'t Type, b: &'t Type) -> Self {
        Constraint::Composite(vec![Self::subtype(a, b), Self::subtype(b, a)])
    }

    pub fn topological(t: &'t Type) -> Result<Self, ConstructionError> {
        t.as_topology()
            .map(Constraint::Topological)
            .ok_or_else(|| ConstructionError::kind_mismatch("topological", TypeKind::Topology, t))
    }

    pub fn quantum(t: &'t Type) -> Result<Self, ConstructionError> {
        t.as_quantum()
            .map(Constraint::Quantum)
            .ok_or_else(|| ConstructionError::kind_mismatch("quantum", TypeKind::Quantum, t))
    }

    pub fn dependent(base: &'t Type, dependent: &'t Type) -> Result<Self, ConstructionError> {
        let dependent = dependent.as_dependent().ok_or_else(|| {
            ConstructionError::kind_mismatch("dependent", TypeKind::Dependent, dependent)
        })?;
        Ok(Constraint::Dependent { base, dependent })
    }

    pub fn mapping(
        kind: MappingKind,
        source: &'t Type,
        target: &'t Type,
    ) -> Result<Self, ConstructionError> {
        let operand = |t: &'t Type| {
            t.as_topology()
                .ok_or_else(|| ConstructionError::kind_mismatch("mapping", TypeKind::Topology, t))
        };

        Ok(Constraint::Mapping {
            kind,
            source: operand(source)?,
            target: operand(target)?,
        })
    }

    pub fn composite(parts: Vec<Constraint<'t>>) -> Self {
        Constraint::Composite(parts)
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Subtype { .. } => ConstraintKind::Subtype,
            Constraint::Topological(_) => ConstraintKind::Topological,
            Constraint::Quantum(_) => ConstraintKind::Quantum,
            Constraint::Dependent { .. } => ConstraintKind::Dependent,
            Constraint::Mapping { .. } => ConstraintKind::Mapping,
            Constraint::Composite(_) => ConstraintKind::Composite,
        }
    }

    /// Whether the constraint holds, without building any diagnostics
    pub fn verify(&self, ctx: &TypeContext) -> bool {
        self.check(&ctx.with_handler(ErrorHandler::Cheap)).is_ok()
    }

    pub fn check(&self, ctx: &TypeContext) -> CheckResult {
        match self {
            Constraint::Subtype { sub, sup } => ctx.check_subtype(sub, sup),
            Constraint::Topological(t) => ctx.require_topology(t, Self::TOPOLOGICAL),
            Constraint::Quantum(t) => ctx.require_quantum(t, Self::QUANTUM),
            Constraint::Dependent { base, dependent } => {
                ctx.verify_dependent(dependent)?;

                if !dependent.predicate(base) {
                    return Err(ctx.ehandler().fail(|| Failure::Refinement {
                        subject: base.to_string(),
                        part: RefinementPart::Predicate,
                    }));
                }

                if dependent.is_subtype_of(base, ctx.hierarchy()) {
                    Ok(())
                } else {
                    Err(ctx.ehandler().fail(|| Failure::NotSubtype {
                        sub: dependent.to_string(),
                        sup: base.to_string(),
                    }))
                }
            }
            Constraint::Mapping {
                kind,
                source,
                target,
            } => ctx.check_mapping(*kind, source, target),
            Constraint::Composite(parts) => parts
                .iter()
                .enumerate()
                .try_for_each(|(index, part)| {
                    part.check(ctx).map_err(|inner| {
                        ctx.ehandler().fail(|| Failure::Composite {
                            index,
                            inner: Box::new(inner),
                        })
                    })
                }),
        }
    }

    /// The operands as a human would name them
    pub fn describe(&self) -> String {
        match self {
            Constraint::Subtype { sub, sup } => format!("{} <: {}", sub, sup),
            Constraint::Topological(t) => t.to_string(),
            Constraint::Quantum(t) => t.to_string(),
            Constraint::Dependent { base, dependent } => format!("{} over {}", dependent, base),
            Constraint::Mapping {
                kind,
                source,
                target,
            } => format!("{} {} -> {}", kind, source, target),
            Constraint::Composite(parts) => {
                format!("({})", parts.iter().map(Constraint::describe).format(", "))
            }
        }
    }
}

/// One constraint plus an optional name to report it under
#[derive(Clone, Debug)]
struct Entry<'t> {
    label: Option<String>,
    constraint: Constraint<'t>,
}

/// Owns a set of constraints and verifies them as a batch.
///
/// Every failing constraint is recorded, not just the first one.
#[derive(Clone, Debug)]
pub struct ConstraintSystem<'t> {
    ctx: TypeContext<'t>,
    entries: Vec<Entry<'t>>,
    failures: Vec<(usize, Failure)>,
}

impl<'t> ConstraintSystem<'t> {
    pub fn new(ctx: TypeContext<'t>) -> Self {
        Self {
            ctx,
            entries: vec![],
            failures: vec![],
        }
    }

    /// Appends a constraint, returning its index
    pub fn add_constraint(&mut self, constraint: Constraint<'t>) -> usize {
        self.entries.push(Entry {
            label: None,
            constraint,
        });
        self.entries.len() - 1
    }

    pub fn add_labeled(&mut self, label: impl Into<String>, constraint: Constraint<'t>) -> usize {
        let index = self.add_constraint(constraint);
        self.entries[index].label = Some(label.into());
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Constraint<'t>> {
        self.entries.get(index).map(|entry| &entry.constraint)
    }

    pub fn context(&self) -> &TypeContext<'t> {
        &self.ctx
    }

    /// Checks every constraint in insertion order, keeping the failures for `failures`.
    ///
    /// Returns whether they all hold.
    pub fn verify_all(&mut self) -> bool {
        let report = self.check();
        self.failures = report
            .verdicts
            .into_iter()
            .filter_map(|verdict| {
                let index = verdict.index;
                verdict.outcome.err().map(|failure| (index, failure))
            })
            .collect();
        self.failures.is_empty()
    }

    /// Failures recorded by the last `verify_all`
    pub fn failures(&self) -> &[(usize, Failure)] {
        &self.failures
    }

    pub fn last_error(&self) -> Option<&Failure> {
        self.failures.last().map(|(_, failure)| failure)
    }

    /// Checks every constraint without recording anything
    pub fn check(&self) -> Report {
        log::debug!("checking {} constraints", self.entries.len());

        let verdicts = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let outcome = entry.constraint.check(&self.ctx);
                log::trace!(
                    " #{} {} {}: {}",
                    index,
                    entry.constraint.kind(),
                    entry.constraint.describe(),
                    if outcome.is_ok() { "holds" } else { "fails" }
                );

                Verdict {
                    index,
                    subject: entry
                        .label
                        .clone()
                        .unwrap_or_else(|| entry.constraint.describe()),
                    kind: entry.constraint.kind(),
                    outcome,
                }
            })
            .collect();

        Report { verdicts }
    }
}

/// The outcome of checking one constraint
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    pub index: usize,
    /// The constraint's label, or a description of its operands
    pub subject: String,
    pub kind: ConstraintKind,
    pub outcome: CheckResult,
}

/// Every verdict of a constraint system run, in insertion order
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Report {
    pub verdicts: Vec<Verdict>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl Report {
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(Verdict::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Verdict> + '_ {
        self.verdicts.iter().filter(|verdict| !verdict.passed())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

impl ConstraintKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ConstraintKind::Subtype => "subtype",
            ConstraintKind::Topological => "topological",
            ConstraintKind::Quantum => "quantum",
            ConstraintKind::Dependent => "dependent",
            ConstraintKind::Mapping => "mapping",
            ConstraintKind::Composite => "composite",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.describe().fmt(f)
    }
}

impl<'t> fmt::Display for Constraint<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.describe())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for verdict in &self.verdicts {
            write!(f, "{} {} {}", verdict.index, verdict.kind.purple(), verdict.subject)?;
            match &verdict.outcome {
                Ok(()) => writeln!(f, " {}", "ok".green())?,
                Err(failure) => writeln!(f, " {}: {}", "failed".red(), failure)?,
            }
        }

        write!(
            f,
            "{} of {} constraints failed",
            self.failure_count(),
            self.verdicts.len()
        )
    }
}
