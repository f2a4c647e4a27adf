use super::TypeRef;
use itertools::Itertools;
use std::fmt;

/// A declaration as handed over by the parser.
///
/// Names are global to the program regardless of nesting. Property declarations refine the
/// innermost enclosing space or shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decl {
    Space {
        name: String,
        ty: TypeRef,
        body: Vec<Decl>,
    },
    /// A shape without a type of its own has the type of its space
    Shape {
        name: String,
        ty: Option<TypeRef>,
        body: Vec<Decl>,
    },
    /// A map between two spaces or shapes, referred to by name
    Mapping {
        name: String,
        kind: String,
        source: String,
        target: String,
    },
    Property {
        name: String,
        value: bool,
    },
    Invariant(Invariant),
}

/// A claim about named declarations that is checked after inference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invariant {
    Subtype { sub: String, sup: String },
    Equal { left: String, right: String },
    Topological(String),
    Quantum(String),
}

impl Decl {
    pub fn space(name: impl Into<String>, ty: TypeRef, body: Vec<Decl>) -> Self {
        Decl::Space {
            name: name.into(),
            ty,
            body,
        }
    }

    pub fn shape(name: impl Into<String>, ty: Option<TypeRef>, body: Vec<Decl>) -> Self {
        Decl::Shape {
            name: name.into(),
            ty,
            body,
        }
    }

    pub fn mapping(
        name: impl Into<String>,
        kind: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Decl::Mapping {
            name: name.into(),
            kind: kind.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn property(name: impl Into<String>, value: bool) -> Self {
        Decl::Property {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Decl::Space { name, .. }
            | Decl::Shape { name, .. }
            | Decl::Mapping { name, .. }
            | Decl::Property { name, .. } => Some(name.as_str()),
            Decl::Invariant(_) => None,
        }
    }

    pub fn body(&self) -> &[Decl] {
        match self {
            Decl::Space { body, .. } | Decl::Shape { body, .. } => body.as_slice(),
            _ => &[],
        }
    }
}

impl Invariant {
    /// Names this invariant refers to
    pub fn names(&self) -> Vec<&str> {
        match self {
            Invariant::Subtype { sub: l, sup: r } | Invariant::Equal { left: l, right: r } => {
                vec![l.as_str(), r.as_str()]
            }
            Invariant::Topological(name) | Invariant::Quantum(name) => vec![name.as_str()],
        }
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Decl::Space { name, ty, body } => {
                write!(f, "space {}: {} {{{}}}", name, ty, body.iter().format("; "))
            }
            Decl::Shape { name, ty, body } => {
                write!(f, "shape {}", name)?;
                if let Some(ty) = ty {
                    write!(f, ": {}", ty)?;
                }
                write!(f, " {{{}}}", body.iter().format("; "))
            }
            Decl::Mapping {
                name,
                kind,
                source,
                target,
            } => write!(f, "mapping {}: {} {} -> {}", name, kind, source, target),
            Decl::Property { name, value } => write!(f, "{} = {}", name, value),
            Decl::Invariant(inv) => write!(f, "invariant {}", inv),
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Invariant::Subtype { sub, sup } => write!(f, "{} <: {}", sub, sup),
            Invariant::Equal { left, right } => write!(f, "{} == {}", left, right),
            Invariant::Topological(name) => write!(f, "topological({})", name),
            Invariant::Quantum(name) => write!(f, "quantum({})", name),
        }
    }
}
