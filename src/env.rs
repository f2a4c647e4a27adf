use crate::error::ConstructionError;
use crate::traits::{AnyProperty, QuantumProperty, TopologyProperty};
use crate::{Type, TypeKind};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

/// Named types of a single compilation unit.
///
/// Names are unique. Redefining one is an error rather than shadowing.
#[derive(Clone, Debug, Default)]
pub struct TypeEnvironment {
    types: HashMap<String, Type>,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, name: impl Into<String>, t: Type) -> Result<(), ConstructionError> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(ConstructionError::DuplicateName(name));
        }
        self.types.insert(name, t);
        Ok(())
    }

    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Type> {
        self.types.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// An undefined name never verifies
    pub fn verify_type(&self, name: &str) -> bool {
        self.lookup_type(name).map_or(false, Type::verify)
    }

    pub fn remove(&mut self, name: &str) -> Option<Type> {
        self.types.remove(name)
    }

    pub fn set_topology_property(
        &mut self,
        name: &str,
        prop: TopologyProperty,
        value: bool,
    ) -> Result<Option<bool>, ConstructionError> {
        let t = self.defined_mut(name)?;
        match t.topology_traits_mut() {
            Some(traits) => Ok(traits.set_property(prop, value)),
            None => Err(ConstructionError::kind_mismatch(
                "topological property",
                TypeKind::Topology,
                t,
            )),
        }
    }

    pub fn set_quantum_property(
        &mut self,
        name: &str,
        prop: QuantumProperty,
        value: bool,
    ) -> Result<Option<bool>, ConstructionError> {
        let t = self.defined_mut(name)?;
        match t.quantum_traits_mut() {
            Some(traits) => Ok(traits.set_property(prop, value)),
            None => Err(ConstructionError::kind_mismatch(
                "quantum property",
                TypeKind::Quantum,
                t,
            )),
        }
    }

    pub fn set_property(
        &mut self,
        name: &str,
        prop: AnyProperty,
        value: bool,
    ) -> Result<Option<bool>, ConstructionError> {
        match prop {
            AnyProperty::Topology(p) => self.set_topology_property(name, p, value),
            AnyProperty::Quantum(p) => self.set_quantum_property(name, p, value),
        }
    }

    fn defined_mut(&mut self, name: &str) -> Result<&mut Type, ConstructionError> {
        self.types
            .get_mut(name)
            .ok_or_else(|| ConstructionError::UnknownName(name.to_string()))
    }

    /// Names of every type that does not verify, sorted
    pub fn verify_all(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, t)| !t.verify())
            .map(|(name, _)| name)
            .collect()
    }

    /// Every entry sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> + '_ {
        self.types
            .iter()
            .map(|(name, t)| (name.as_str(), t))
            .sorted_by(|(l, _), (r, _)| l.cmp(r))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Display for TypeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (name, t) in self.iter() {
            writeln!(f, "{}: {}", name, t)?;
        }
        Ok(())
    }
}
