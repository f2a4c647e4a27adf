use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Nominal supertype relation between basic types.
///
/// Queries walk the declared edges, so the relation is always the reflexive transitive closure of
/// what was declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hierarchy {
    supers: HashMap<String, Vec<String>>,
}

impl Default for Hierarchy {
    fn default() -> Self {
        let mut hierarchy = Hierarchy::empty();
        hierarchy.declare("int", "number");
        hierarchy.declare("float", "number");
        hierarchy
    }
}

impl Hierarchy {
    pub fn empty() -> Self {
        Self {
            supers: HashMap::new(),
        }
    }

    /// Declares `sub ⊑ sup`
    pub fn declare(&mut self, sub: impl Into<String>, sup: impl Into<String>) {
        let sup = sup.into();
        let entry = self.supers.entry(sub.into()).or_insert_with(Vec::new);
        if !entry.contains(&sup) {
            entry.push(sup);
        }
    }

    #[must_use]
    pub fn with(mut self, sub: impl Into<String>, sup: impl Into<String>) -> Self {
        self.declare(sub, sup);
        self
    }

    pub fn direct_supertypes(&self, name: &str) -> &[String] {
        self.supers.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }

        let mut visited = HashSet::new();
        let mut stack = vec![sub];

        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            for parent in self.direct_supertypes(name) {
                if parent == sup {
                    return true;
                }
                stack.push(parent);
            }
        }

        false
    }

    /// Every strict supertype of `name`, sorted
    pub fn supertypes(&self, name: &str) -> Vec<&str> {
        let mut found = HashSet::new();
        let mut stack = vec![name];

        while let Some(n) = stack.pop() {
            for parent in self.direct_supertypes(n) {
                if parent != name && found.insert(parent.as_str()) {
                    stack.push(parent);
                }
            }
        }

        found.into_iter().sorted().collect()
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.supers
            .iter()
            .sorted_by(|(l, _), (r, _)| l.cmp(r))
            .format_with(", ", |(sub, sups), f| {
                f(&format_args!("{} <: {}", sub, sups.iter().format(" | ")))
            })
            .fmt(f)
    }
}
