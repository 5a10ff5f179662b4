//! Finder method name parsing and argument binding.

use crate::error::FinderError;
use crate::lookup::Conditions;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::Value;

static FINDER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^find_(all_by|by)_(\w+)$").expect("finder name pattern is valid")
});

static ATTRIBUTE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("attribute segment pattern is valid"));

/// How many records a finder returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    First,
    All,
}

/// A method name that encodes a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderPattern {
    pub cardinality: Cardinality,
    /// Attribute tokens in the order they appear in the name
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinderMatch {
    Finder(FinderPattern),
    NoMatch,
}

/// Attribute/value mapping plus cardinality for one finder call
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    pub conditions: Conditions,
    pub cardinality: Cardinality,
}

/// Parse a method name such as `find_by_name_and_email` or `find_all_by_role`.
///
/// Names that do not follow the convention, including ones with an empty or
/// malformed attribute segment, are [`FinderMatch::NoMatch`].
///
/// ```
/// use lifeguard_finders::finder::{parse_finder, Cardinality, FinderMatch};
///
/// match parse_finder("find_all_by_first_name_and_age") {
///     FinderMatch::Finder(pattern) => {
///         assert_eq!(pattern.cardinality, Cardinality::All);
///         assert_eq!(pattern.attributes, vec!["first_name", "age"]);
///     }
///     FinderMatch::NoMatch => unreachable!(),
/// }
/// assert_eq!(parse_finder("save"), FinderMatch::NoMatch);
/// ```
pub fn parse_finder(method: &str) -> FinderMatch {
    let Some(captures) = FINDER_NAME.captures(method) else {
        return FinderMatch::NoMatch;
    };
    let cardinality = match &captures[1] {
        "all_by" => Cardinality::All,
        _ => Cardinality::First,
    };

    let mut attributes = Vec::new();
    for segment in captures[2].split("_and_") {
        if !ATTRIBUTE_SEGMENT.is_match(segment) {
            return FinderMatch::NoMatch;
        }
        attributes.push(segment.to_string());
    }

    FinderMatch::Finder(FinderPattern {
        cardinality,
        attributes,
    })
}

impl FinderPattern {
    /// Pair the Nth attribute with the Nth argument.
    ///
    /// With `strict_arity` a count mismatch is an error; otherwise the longer
    /// side is truncated.
    ///
    /// # Errors
    ///
    /// Returns `BindingArityMismatch` in strict mode when the counts differ.
    pub fn bind(&self, method: &str, args: Vec<Value>, strict_arity: bool) -> Result<QueryIntent, FinderError> {
        if strict_arity && args.len() != self.attributes.len() {
            return Err(FinderError::BindingArityMismatch {
                method: method.to_string(),
                expected: self.attributes.len(),
                actual: args.len(),
            });
        }
        if args.len() != self.attributes.len() {
            log::debug!(
                "{method}: binding {} attribute(s) to {} argument(s), dropping the rest",
                self.attributes.len(),
                args.len()
            );
        }

        let conditions = self.attributes.iter().cloned().zip(args).collect();
        Ok(QueryIntent {
            conditions,
            cardinality: self.cardinality,
        })
    }
}
