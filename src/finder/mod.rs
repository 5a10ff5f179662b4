//! Dynamic finders: method names such as `find_by_name_and_email` or
//! `find_all_by_role` rewritten into attribute lookups.

mod dispatcher;
mod pattern;

pub use dispatcher::{ConventionDispatcher, MethodHandler, UnknownMethodHandler};
pub use pattern::{parse_finder, Cardinality, FinderMatch, FinderPattern, QueryIntent};
