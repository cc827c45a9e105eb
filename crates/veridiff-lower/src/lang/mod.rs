//! Concrete language bindings

mod boogie;
mod c;
mod dafny;
mod sql;

pub use boogie::BoogieBinding;
pub use c::{CBinding, EXECUTE_MACRO};
pub use dafny::DafnyBinding;
pub use sql::{SqlBinding, TABLE};

use crate::binding::{Language, LanguageBinding};

/// The binding for `language`
#[must_use]
pub fn binding_for(language: Language) -> Box<dyn LanguageBinding> {
    match language {
        Language::C => Box::new(CBinding),
        Language::Dafny => Box::new(DafnyBinding),
        Language::Boogie => Box::new(BoogieBinding),
        Language::Sql => Box::new(SqlBinding),
    }
}
