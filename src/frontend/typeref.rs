use crate::error::ConstructionError;
use crate::{Type, TypeKind};
use std::fmt;
use std::str::FromStr;

/// A type as written in source, `Kind<Base>` or a bare name
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Basic(String),
    Topology(Box<TypeRef>),
    Quantum(Box<TypeRef>),
}

impl TypeRef {
    pub fn basic(name: impl Into<String>) -> Self {
        TypeRef::Basic(name.into())
    }

    pub fn topology(base: TypeRef) -> Self {
        TypeRef::Topology(Box::new(base))
    }

    pub fn quantum(base: TypeRef) -> Self {
        TypeRef::Quantum(Box::new(base))
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeRef::Basic(_) => TypeKind::Basic,
            TypeRef::Topology(_) => TypeKind::Topology,
            TypeRef::Quantum(_) => TypeKind::Quantum,
        }
    }

    pub fn base(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Basic(_) => None,
            TypeRef::Topology(base) | TypeRef::Quantum(base) => Some(base),
        }
    }

    /// Parses the `Topology<int>` form. Whitespace between tokens is ignored.
    pub fn parse(src: &str) -> Result<Self, ConstructionError> {
        let mut parser = Parser {
            src,
            at: 0,
            depth: 0,
        };
        let t = parser.typeref()?;

        parser.skip_whitespace();
        if parser.at != src.len() {
            return Err(parser.error("unexpected input after type"));
        }

        Ok(t)
    }

    /// Lowers to a type with empty property registries
    pub fn to_type(&self) -> Type {
        match self {
            TypeRef::Basic(name) => Type::basic(name.as_str()),
            TypeRef::Topology(base) => Type::topology(base.to_type()),
            TypeRef::Quantum(base) => Type::quantum(base.to_type()),
        }
    }
}

impl FromStr for TypeRef {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeRef::parse(s)
    }
}

/// Deepest `Kind<...>` nesting a type reference may have
pub const MAX_DEPTH: usize = 64;

struct Parser<'s> {
    src: &'s str,
    at: usize,
    depth: usize,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<char> {
        self.src[self.at..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.at += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.at += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<&'s str, ConstructionError> {
        self.skip_whitespace();
        let start = self.at;

        while let Some(c) = self.peek().filter(|&c| c.is_alphanumeric() || c == '_') {
            self.at += c.len_utf8();
        }

        if start == self.at {
            Err(self.error("expected a type name"))
        } else {
            Ok(&self.src[start..self.at])
        }
    }

    fn typeref(&mut self) -> Result<TypeRef, ConstructionError> {
        let name = self.ident()?;
        let name_at = self.at - name.len();

        match (name, self.eat('<')) {
            ("Topology", true) | ("Quantum", true) => {
                if self.depth == MAX_DEPTH {
                    return Err(ConstructionError::TypeSyntax {
                        at: name_at,
                        message: "type nested too deeply".to_string(),
                    });
                }

                self.depth += 1;
                let base = self.typeref()?;
                self.depth -= 1;
                if !self.eat('>') {
                    return Err(self.error("expected `>`"));
                }

                Ok(if name == "Topology" {
                    TypeRef::topology(base)
                } else {
                    TypeRef::quantum(base)
                })
            }
            ("Topology", false) | ("Quantum", false) => Err(ConstructionError::TypeSyntax {
                at: name_at,
                message: format!("`{}` needs a base type, as in `{}<int>`", name, name),
            }),
            (_, true) => Err(ConstructionError::TypeSyntax {
                at: name_at,
                message: format!("`{}` does not take a base type", name),
            }),
            (_, false) => Ok(TypeRef::basic(name)),
        }
    }

    fn error(&self, message: &str) -> ConstructionError {
        ConstructionError::TypeSyntax {
            at: self.at,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeRef::Basic(name) => name.fmt(f),
            TypeRef::Topology(base) => write!(f, "Topology<{}>", base),
            TypeRef::Quantum(base) => write!(f, "Quantum<{}>", base),
        }
    }
}
