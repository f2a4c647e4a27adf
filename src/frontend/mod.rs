//! The declaration-facing side: type references as written, the declaration tree, and the pass
//! that infers and checks a whole program.

mod collect;
mod decl;
mod typeref;

pub use collect::{check_program, Checked, Collected, Collector, CompileError};
pub use decl::{Decl, Invariant};
pub use typeref::{TypeRef, MAX_DEPTH};

#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        $crate::define_key!($name, "");
    };
    ($name:ident, $comment:literal) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        #[doc=$comment]
        pub struct $name(usize);

        impl From<usize> for $name {
            fn from(i: usize) -> $name {
                $name(i)
            }
        }

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}
