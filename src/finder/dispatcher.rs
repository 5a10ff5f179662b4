//! Chain of responsibility for calls to undeclared methods.

use super::pattern::{parse_finder, Cardinality, FinderMatch};
use crate::config::DispatchConfig;
use crate::error::FinderError;
use crate::lookup::{FinderOutput, Lookup};
use sea_query::Value;

#[cfg(feature = "tracing")]
use crate::telemetry::tracing_helpers;

/// A link in the method dispatch chain
pub trait MethodHandler {
    /// Handle `method` called with `args` on `target`, or pass it on
    fn handle(&self, target: &dyn Lookup, method: &str, args: Vec<Value>) -> Result<FinderOutput, FinderError>;
}

/// End of the chain: every method reaching it is undefined
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownMethodHandler;

impl MethodHandler for UnknownMethodHandler {
    fn handle(&self, _target: &dyn Lookup, method: &str, args: Vec<Value>) -> Result<FinderOutput, FinderError> {
        Err(FinderError::UnknownMethod {
            method: method.to_string(),
            args,
        })
    }
}

/// Turns `find_by_*` and `find_all_by_*` calls into attribute lookups and
/// forwards everything else, untouched, to the next handler
pub struct ConventionDispatcher {
    config: DispatchConfig,
    next: Box<dyn MethodHandler>,
}

impl ConventionDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self::with_next(config, Box::new(UnknownMethodHandler))
    }

    pub fn with_next(config: DispatchConfig, next: Box<dyn MethodHandler>) -> Self {
        Self { config, next }
    }
}

impl Default for ConventionDispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl MethodHandler for ConventionDispatcher {
    fn handle(&self, target: &dyn Lookup, method: &str, args: Vec<Value>) -> Result<FinderOutput, FinderError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::dispatch_span(target.descriptor().name(), method).entered();

        let pattern = match parse_finder(method) {
            FinderMatch::Finder(pattern) => pattern,
            FinderMatch::NoMatch => {
                log::trace!("{method} is not a finder, forwarding");
                return self.next.handle(target, method, args);
            }
        };

        let model = target.descriptor();
        for attribute in &pattern.attributes {
            model.require_attribute(attribute)?;
        }
        let intent = pattern.bind(method, args, self.config.strict_arity)?;
        log::debug!(
            "{}.{method}: {:?} lookup on {} condition(s)",
            model.name(),
            intent.cardinality,
            intent.conditions.len()
        );

        match intent.cardinality {
            Cardinality::First => target.find_first(&intent.conditions).map(FinderOutput::One),
            Cardinality::All => target.find_all(&intent.conditions).map(FinderOutput::Many),
        }
    }
}
