use crate::{ErrorHandler, Hierarchy, TypeContext};

/// Knobs for a checking pass
#[derive(Clone, Debug)]
pub struct Config {
    pub hierarchy: Hierarchy,
    /// Inference gives up with `InferenceError::DidNotConverge` after this many passes.
    /// Without a cap the bound follows from the number of variables and goals.
    pub max_iterations: Option<usize>,
    pub ehandler: ErrorHandler,
    /// Whether inference forward-chains the separation axioms into unset properties
    pub derive_axioms: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hierarchy: Hierarchy::default(),
            max_iterations: None,
            ehandler: ErrorHandler::Expensive,
            derive_axioms: true,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    #[must_use]
    pub fn with_supertype(mut self, sub: impl Into<String>, sup: impl Into<String>) -> Self {
        self.hierarchy.declare(sub, sup);
        self
    }

    #[must_use]
    pub fn with_handler(mut self, ehandler: ErrorHandler) -> Self {
        self.ehandler = ehandler;
        self
    }

    #[must_use]
    pub fn without_axioms(mut self) -> Self {
        self.derive_axioms = false;
        self
    }

    pub fn context(&self) -> TypeContext<'_> {
        TypeContext::new(&self.hierarchy, self.ehandler)
    }
}
