use crate::error::ConstructionError;
use crate::mapping::MappingKind;
use crate::traits::{AnyProperty, Property, QuantumProperty, TopologyProperty, Traits};
use crate::{Config, Type, TypeEnvironment, TypeKind};
use itertools::Itertools;
use owo_colors::OwoColorize;
use smallvec::{smallvec, SmallVec};
use std::fmt;
use thiserror::Error;

crate::define_key!(VarId, "A type variable of the inference engine");

/// Type variables and whatever has been inferred for them so far
#[derive(Clone, Debug, Default)]
pub struct TEnv {
    vars: Vec<TEntry>,
}

#[derive(Clone, Debug)]
pub struct TEntry {
    pub name: String,
    pub assignment: Option<Type>,
}

impl TEnv {
    pub fn new() -> Self {
        Self { vars: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn spawn(&mut self, name: impl Into<String>) -> VarId {
        let var = VarId::from(self.vars.len());
        self.vars.push(TEntry {
            name: name.into(),
            assignment: None,
        });
        var
    }

    pub fn assign(&mut self, var: VarId, value: Type) {
        assert!(
            std::mem::replace(&mut self.vars[var.index()].assignment, Some(value)).is_none(),
            "type variable already assigned"
        );
    }

    pub fn name(&self, var: VarId) -> &str {
        &self.vars[var.index()].name
    }

    pub fn get(&self, var: VarId) -> Option<&Type> {
        self.vars.get(var.index())?.assignment.as_ref()
    }

    pub fn get_mut(&mut self, var: VarId) -> Option<&mut Type> {
        self.vars.get_mut(var.index())?.assignment.as_mut()
    }

    /// Variables nothing has been inferred for
    pub fn free(&self) -> impl Iterator<Item = VarId> + '_ {
        self.iter()
            .filter(|(_, entry)| entry.assignment.is_none())
            .map(|(var, _)| var)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &TEntry)> + '_ {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, entry)| (VarId::from(i), entry))
    }
}

/// Something the engine keeps applying until nothing changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Goal {
    /// `var` has the type of `source`, along with every property `source` ends up with
    SameAs { var: VarId, source: VarId },
    /// Checked once both sides are known
    Subtype { sub: VarId, sup: VarId },
    Property {
        var: VarId,
        prop: AnyProperty,
        value: bool,
    },
    /// Whatever `mapping` preserves and `source` has, `target` has as well unless it says otherwise
    Preserve {
        source: VarId,
        target: VarId,
        mapping: MappingKind,
    },
    /// Forward-chains the separation axioms of a topology type
    Derive(VarId),
}

/// What applying a goal changed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Bound(VarId),
    Set {
        var: VarId,
        prop: AnyProperty,
        value: bool,
    },
    Derived {
        var: VarId,
        props: SmallVec<[TopologyProperty; 4]>,
    },
}

type Effects = SmallVec<[Effect; 4]>;

/// One entry of the inference path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub pass: usize,
    pub goal: usize,
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("inference did not converge within {passes} passes")]
    DidNotConverge { passes: usize },

    #[error("could not infer a type for {}", .names.join(", "))]
    Unresolved { names: Vec<String> },

    #[error("conflicting information for `{var}`: {detail}")]
    Conflict { var: String, detail: String },

    #[error("`{var}` is inconsistent: {detail}")]
    Inconsistent { var: String, detail: String },

    #[error("`{sub}` is not a subtype of `{sup}`")]
    NotSubtype { sub: String, sup: String },

    #[error("`{var}` needs to be a {expected} type, but is a {found} type")]
    KindMismatch {
        var: String,
        expected: TypeKind,
        found: TypeKind,
    },
}

impl InferenceError {
    /// Whether inference stopped without an answer, as opposed to finding a type error
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            InferenceError::DidNotConverge { .. } | InferenceError::Unresolved { .. }
        )
    }
}

/// Propagates goals over type variables until a fixpoint is reached
pub struct InferenceEngine<'c> {
    config: &'c Config,
    tenv: TEnv,
    goals: Vec<Goal>,
    path: Vec<Step>,
}

impl<'c> InferenceEngine<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            tenv: TEnv::new(),
            goals: vec![],
            path: vec![],
        }
    }

    /// A fresh type variable with nothing known about it
    pub fn var(&mut self, name: impl Into<String>) -> VarId {
        self.tenv.spawn(name)
    }

    pub fn var_with(&mut self, name: impl Into<String>, t: Type) -> VarId {
        let var = self.tenv.spawn(name);
        self.tenv.assign(var, t);
        var
    }

    pub fn assign(&mut self, var: VarId, t: Type) -> Result<(), InferenceError> {
        if let Some(existing) = self.tenv.get(var) {
            return Err(InferenceError::Conflict {
                var: self.tenv.name(var).to_string(),
                detail: format!("already {}, cannot also be {}", existing, t),
            });
        }
        self.tenv.assign(var, t);
        Ok(())
    }

    pub fn add_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn tenv(&self) -> &TEnv {
        &self.tenv
    }

    /// Passes allowed when the config does not cap them.
    ///
    /// A pass either binds a variable, fills in a property that was unset, or ends inference.
    fn pass_bound(&self) -> usize {
        let per_var = 1 + TopologyProperty::ALL.len() + QuantumProperty::ALL.len();
        self.tenv.len() * per_var + self.goals.len() + 1
    }

    pub fn infer(mut self) -> Result<Solution, InferenceError> {
        let passes = self
            .config
            .max_iterations
            .unwrap_or_else(|| self.pass_bound());

        for pass in 0..passes {
            let before = self.path.len();

            for goal in 0..self.goals.len() {
                for effect in self.resolve_one_step(self.goals[goal])? {
                    log::trace!(" pass {} goal {}: {:?}", pass, goal, effect);
                    self.path.push(Step { pass, goal, effect });
                }
            }

            self.check_consistency()?;

            let progress = self.path.len() - before;
            log::debug!("inference pass {} made {} changes", pass, progress);

            if progress == 0 {
                let names = self
                    .tenv
                    .free()
                    .map(|var| self.tenv.name(var).to_string())
                    .collect::<Vec<_>>();

                return if names.is_empty() {
                    Ok(Solution {
                        tenv: self.tenv,
                        path: self.path,
                    })
                } else {
                    Err(InferenceError::Unresolved { names })
                };
            }
        }

        log::warn!("inference did not converge within {} passes", passes);

        Err(InferenceError::DidNotConverge { passes })
    }

    fn resolve_one_step(&mut self, goal: Goal) -> Result<Effects, InferenceError> {
        match goal {
            Goal::SameAs { var, source } => {
                let source_t = match self.tenv.get(source) {
                    None => return Ok(Effects::new()),
                    Some(t) => t.clone(),
                };

                let current = match self.tenv.get(var) {
                    None => {
                        self.tenv.assign(var, source_t);
                        return Ok(smallvec![Effect::Bound(var)]);
                    }
                    Some(t) => t,
                };

                let hierarchy = &self.config.hierarchy;
                if !(current.is_subtype_of(&source_t, hierarchy)
                    && source_t.is_subtype_of(current, hierarchy))
                {
                    return Err(InferenceError::Conflict {
                        var: self.tenv.name(var).to_string(),
                        detail: format!(
                            "is {} but should be the same as `{}` which is {}",
                            current,
                            self.tenv.name(source),
                            source_t
                        ),
                    });
                }

                let known: SmallVec<[(AnyProperty, bool); 8]> = match &source_t {
                    Type::Topology(t) => t.traits.iter().map(|(p, v)| (p.erase(), v)).collect(),
                    Type::Quantum(q) => q.traits.iter().map(|(p, v)| (p.erase(), v)).collect(),
                    _ => SmallVec::new(),
                };

                let mut effects = Effects::new();
                for (prop, value) in known {
                    effects.extend(self.set(var, prop, value)?);
                }

                Ok(effects)
            }

            Goal::Subtype { sub, sup } => {
                if let (Some(l), Some(r)) = (self.tenv.get(sub), self.tenv.get(sup)) {
                    if !l.is_subtype_of(r, &self.config.hierarchy) {
                        return Err(InferenceError::NotSubtype {
                            sub: self.tenv.name(sub).to_string(),
                            sup: self.tenv.name(sup).to_string(),
                        });
                    }
                }
                Ok(Effects::new())
            }

            Goal::Property { var, prop, value } => {
                if self.tenv.get(var).is_none() {
                    return Ok(Effects::new());
                }
                Ok(self.set(var, prop, value)?.into_iter().collect())
            }

            Goal::Preserve {
                source,
                target,
                mapping,
            } => {
                let (source_t, target_t) = match (self.tenv.get(source), self.tenv.get(target)) {
                    (Some(s), Some(t)) => (s, t),
                    _ => return Ok(Effects::new()),
                };

                let held = self
                    .expect_topology(source, source_t)?
                    .iter()
                    .filter(|&(p, v)| v && mapping.preserves().contains(&p))
                    .map(|(p, _)| p)
                    .collect::<SmallVec<[TopologyProperty; 4]>>();
                self.expect_topology(target, target_t)?;

                let mut effects = Effects::new();
                for prop in held {
                    effects.extend(self.fill(target, prop)?);
                }

                Ok(effects)
            }

            Goal::Derive(var) => match self.tenv.get_mut(var) {
                Some(Type::Topology(t)) => {
                    let props = t.traits.saturate();
                    if props.is_empty() {
                        Ok(Effects::new())
                    } else {
                        Ok(smallvec![Effect::Derived { var, props }])
                    }
                }
                _ => Ok(Effects::new()),
            },
        }
    }

    /// Sets a property that was unset, erroring if it was set to something else
    fn set(
        &mut self,
        var: VarId,
        prop: AnyProperty,
        value: bool,
    ) -> Result<Option<Effect>, InferenceError> {
        let name = self.tenv.name(var).to_string();
        let t = match self.tenv.get_mut(var) {
            Some(t) => t,
            None => return Ok(None),
        };

        let previous = match (prop, &mut *t) {
            (AnyProperty::Topology(p), Type::Topology(topo)) => set_if_unset(&mut topo.traits, p, value),
            (AnyProperty::Quantum(p), Type::Quantum(q)) => set_if_unset(&mut q.traits, p, value),
            (AnyProperty::Topology(_), other) => {
                return Err(InferenceError::KindMismatch {
                    var: name,
                    expected: TypeKind::Topology,
                    found: other.kind(),
                })
            }
            (AnyProperty::Quantum(_), other) => {
                return Err(InferenceError::KindMismatch {
                    var: name,
                    expected: TypeKind::Quantum,
                    found: other.kind(),
                })
            }
        };

        match previous {
            None => Ok(Some(Effect::Set { var, prop, value })),
            Some(v) if v == value => Ok(None),
            Some(v) => Err(InferenceError::Conflict {
                var: name,
                detail: format!("{} is {} but is required to be {}", prop, v, value),
            }),
        }
    }

    /// Sets a topology property to true unless it already has a value.
    ///
    /// A target declaring the property false is left alone, the mapping check reports it.
    fn fill(&mut self, var: VarId, prop: TopologyProperty) -> Result<Option<Effect>, InferenceError> {
        let known = self
            .tenv
            .get(var)
            .and_then(|t| t.topology_traits())
            .and_then(|traits| traits.get(prop));

        match known {
            Some(_) => Ok(None),
            None => self.set(var, prop.erase(), true),
        }
    }

    fn expect_topology<'t>(
        &self,
        var: VarId,
        t: &'t Type,
    ) -> Result<&'t Traits<TopologyProperty>, InferenceError> {
        t.topology_traits().ok_or_else(|| InferenceError::KindMismatch {
            var: self.tenv.name(var).to_string(),
            expected: TypeKind::Topology,
            found: t.kind(),
        })
    }

    fn check_consistency(&self) -> Result<(), InferenceError> {
        for (var, entry) in self.tenv.iter() {
            let detail = match &entry.assignment {
                Some(Type::Topology(t)) => t.traits.violated_rule().map(|rule| rule.to_string()),
                Some(Type::Quantum(q)) if !q.traits.verify_consistent() => Some(format!(
                    "{} but not {}",
                    QuantumProperty::Entangled,
                    QuantumProperty::Superposition
                )),
                _ => None,
            };

            if let Some(detail) = detail {
                return Err(InferenceError::Inconsistent {
                    var: self.tenv.name(var).to_string(),
                    detail,
                });
            }
        }

        Ok(())
    }
}

/// Returns the value the property already had, leaving it untouched if it had one
fn set_if_unset<P: Property>(traits: &mut Traits<P>, prop: P, value: bool) -> Option<bool> {
    match traits.get(prop) {
        None => {
            traits.set_property(prop, value);
            None
        }
        previous => previous,
    }
}

/// Every type variable bound, plus how they got there
#[derive(Clone, Debug)]
pub struct Solution {
    tenv: TEnv,
    path: Vec<Step>,
}

impl Solution {
    /// Always bound in a solution
    pub fn get(&self, var: VarId) -> Option<&Type> {
        self.tenv.get(var)
    }

    pub fn tenv(&self) -> &TEnv {
        &self.tenv
    }

    pub fn path(&self) -> &[Step] {
        &self.path
    }

    pub fn into_environment(self) -> Result<TypeEnvironment, ConstructionError> {
        let mut env = TypeEnvironment::new();
        for entry in self.tenv.vars {
            if let Some(t) = entry.assignment {
                env.add_type(entry.name, t)?;
            }
        }
        Ok(env)
    }
}

impl fmt::Display for TEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\n  {}",
            "with tenv".green(),
            self.vars.iter().format_with("\n  ", |entry, f| f(&format_args!(
                "{} {} {}",
                entry.name,
                "->".purple(),
                entry
            ))),
        )
    }
}

impl fmt::Display for TEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.assignment.as_ref() {
            Some(Type::Topology(t)) => write!(f, "{} {}", t, t.traits),
            Some(Type::Quantum(q)) => write!(f, "{} {}", q, q.traits),
            Some(t) => t.fmt(f),
            None => "?".fmt(f),
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.tenv.fmt(f)?;
        write!(f, "\n{}", "via".green())?;
        for step in &self.path {
            write!(f, "\n  {} {} ", step.pass, "|".purple())?;
            match &step.effect {
                Effect::Bound(var) => write!(f, "bound {}", self.tenv.name(*var))?,
                Effect::Set { var, prop, value } => {
                    write!(f, "{}.{} = {}", self.tenv.name(*var), prop, value)?
                }
                Effect::Derived { var, props } => write!(
                    f,
                    "{} derives {}",
                    self.tenv.name(*var),
                    props.iter().format(", ")
                )?,
            }
        }
        Ok(())
    }
}
