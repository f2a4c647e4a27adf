use super::{Decl, Invariant};
use crate::error::ConstructionError;
use crate::infer::{Goal, InferenceEngine, InferenceError, Solution, VarId};
use crate::mapping::MappingKind;
use crate::traits::AnyProperty;
use crate::{Config, Constraint, ConstraintSystem, Report, TypeEnvironment};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("property `{0}` is not declared inside a space or shape")]
    StrayProperty(String),
}

/// The outcome of checking a whole program
#[derive(Debug)]
pub struct Checked {
    pub env: TypeEnvironment,
    /// One verdict per mapping and invariant, in declaration order
    pub report: Report,
    /// Declarations whose types are not well-formed, sorted
    pub ill_formed: Vec<String>,
}

impl Checked {
    /// Whether every type is well-formed and every constraint holds
    pub fn passed(&self) -> bool {
        self.ill_formed.is_empty() && self.report.passed()
    }
}

/// Turns declarations into type variables and goals for the inference engine
pub struct Collector<'c> {
    engine: InferenceEngine<'c>,
    vars: HashMap<String, VarId>,
    derive_axioms: bool,

    mappings: Vec<(String, MappingKind, String, String)>,
    invariants: Vec<Invariant>,
}

impl<'c> Collector<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            engine: InferenceEngine::new(config),
            vars: HashMap::new(),
            derive_axioms: config.derive_axioms,
            mappings: vec![],
            invariants: vec![],
        }
    }

    /// Collects every declaration, in two passes so names may be used before they are declared
    pub fn collect(&mut self, decls: &[Decl]) -> Result<(), CompileError> {
        self.declare(decls)?;
        self.goals(decls, None)?;

        if self.derive_axioms {
            let mut vars = self.vars.values().copied().collect::<Vec<_>>();
            vars.sort_by_key(|var| var.index());
            for var in vars {
                self.engine.add_goal(Goal::Derive(var));
            }
        }

        Ok(())
    }

    fn declare(&mut self, decls: &[Decl]) -> Result<(), CompileError> {
        for decl in decls {
            let var = match decl {
                Decl::Space { name, ty, .. } => self.engine.var_with(name.as_str(), ty.to_type()),
                Decl::Shape {
                    name, ty: Some(ty), ..
                } => self.engine.var_with(name.as_str(), ty.to_type()),
                Decl::Shape { name, ty: None, .. } => self.engine.var(name.as_str()),
                _ => continue,
            };

            let name = self.engine.tenv().name(var).to_string();
            if self.vars.insert(name.clone(), var).is_some() {
                return Err(ConstructionError::DuplicateName(name).into());
            }

            self.declare(decl.body())?;
        }

        Ok(())
    }

    fn goals(&mut self, decls: &[Decl], scope: Option<VarId>) -> Result<(), CompileError> {
        for decl in decls {
            match decl {
                Decl::Space { name, body, .. } => {
                    let var = self.lookup(name)?;
                    self.goals(body, Some(var))?;
                }
                Decl::Shape { name, ty, body } => {
                    let var = self.lookup(name)?;
                    if let Some(space) = scope {
                        self.engine.add_goal(match ty {
                            None => Goal::SameAs { var, source: space },
                            Some(_) => Goal::Subtype {
                                sub: var,
                                sup: space,
                            },
                        });
                    }
                    self.goals(body, Some(var))?;
                }
                Decl::Mapping {
                    name,
                    kind,
                    source,
                    target,
                } => {
                    let mapping = MappingKind::from_name(kind)
                        .ok_or_else(|| ConstructionError::UnknownMapping(kind.clone()))?;
                    let (s, t) = (self.lookup(source)?, self.lookup(target)?);
                    self.engine.add_goal(Goal::Preserve {
                        source: s,
                        target: t,
                        mapping,
                    });
                    self.mappings
                        .push((name.clone(), mapping, source.clone(), target.clone()));
                }
                Decl::Property { name, value } => {
                    let var = scope.ok_or_else(|| CompileError::StrayProperty(name.clone()))?;
                    let prop = AnyProperty::from_name(name)
                        .ok_or_else(|| ConstructionError::UnknownProperty(name.clone()))?;
                    self.engine.add_goal(Goal::Property {
                        var,
                        prop,
                        value: *value,
                    });
                }
                Decl::Invariant(inv) => {
                    for name in inv.names() {
                        self.lookup(name)?;
                    }
                    self.invariants.push(inv.clone());
                }
            }
        }

        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<VarId, ConstructionError> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| ConstructionError::UnknownName(name.to_string()))
    }

    pub fn infer(self) -> Result<Collected, CompileError> {
        let solution = self.engine.infer()?;
        Ok(Collected {
            solution,
            mappings: self.mappings,
            invariants: self.invariants,
        })
    }
}

/// Inference results plus what remains to be verified
pub struct Collected {
    pub solution: Solution,
    mappings: Vec<(String, MappingKind, String, String)>,
    invariants: Vec<Invariant>,
}

impl Collected {
    /// Verifies every mapping and invariant against the inferred types
    pub fn verify(self, config: &Config) -> Result<Checked, CompileError> {
        let env = self.solution.into_environment()?;

        let report = {
            let mut system = ConstraintSystem::new(config.context());
            let get = |name: &str| {
                env.lookup_type(name)
                    .ok_or_else(|| ConstructionError::UnknownName(name.to_string()))
            };

            for (name, kind, source, target) in &self.mappings {
                let constraint =
                    Constraint::mapping(*kind, get(source.as_str())?, get(target.as_str())?)?;
                system.add_labeled(name.as_str(), constraint);
            }

            for inv in &self.invariants {
                let constraint = match inv {
                    Invariant::Subtype { sub, sup } => {
                        Constraint::subtype(get(sub.as_str())?, get(sup.as_str())?)
                    }
                    Invariant::Equal { left, right } => {
                        Constraint::equal(get(left.as_str())?, get(right.as_str())?)
                    }
                    Invariant::Topological(name) => Constraint::topological(get(name.as_str())?)?,
                    Invariant::Quantum(name) => Constraint::quantum(get(name.as_str())?)?,
                };
                system.add_labeled(inv.to_string(), constraint);
            }

            system.check()
        };

        let ill_formed = env
            .verify_all()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        log::debug!(
            "{} of {} constraints failed, {} ill-formed types",
            report.failure_count(),
            report.verdicts.len(),
            ill_formed.len()
        );

        Ok(Checked {
            env,
            report,
            ill_formed,
        })
    }
}

/// Infers the types of every declaration, then verifies every mapping and invariant.
///
/// Construction errors and failed inference abort the pass. Failing constraints and ill-formed
/// types do not, they are all collected into the returned `Checked`.
pub fn check_program(decls: &[Decl], config: &Config) -> Result<Checked, CompileError> {
    let mut collector = Collector::new(config);
    collector.collect(decls)?;
    collector.infer()?.verify(config)
}
