//! Wiki-specific source transformations applied before markdown parsing.

mod directives;
mod tags;

pub use directives::{DirectiveFn, DirectiveTable, table_of_contents};
pub use tags::{TagTable, wikify};
