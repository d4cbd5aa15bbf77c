//! # Domain Invariants
//!
//! Rules checked locally before anything reaches the network.

use super::cadence::{Argument, ParamType};
use super::errors::BuzzError;
use super::templates::MISSING_CAPABILITY_MESSAGE;

/// Default compute limit attached to every transaction.
pub const DEFAULT_COMPUTE_LIMIT: u64 = 1000;

/// One declared parameter of a fixed template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name in the Cadence source.
    pub name: &'static str,
    /// Declared type.
    pub ty: ParamType,
}

impl ParamSpec {
    /// Shorthand constructor for the static schemas.
    pub const fn new(name: &'static str, ty: ParamType) -> Self {
        Self { name, ty }
    }
}

/// Invariant: arguments match the declared schema positionally.
///
/// Arity is checked first, then each position's type.
pub fn invariant_arguments_match(
    operation: &str,
    schema: &[ParamSpec],
    arguments: &[Argument],
) -> Result<(), BuzzError> {
    if arguments.len() != schema.len() {
        return Err(BuzzError::InvalidArgument {
            operation: operation.to_string(),
            reason: format!(
                "expected {} arguments, got {}",
                schema.len(),
                arguments.len()
            ),
        });
    }

    for (position, (spec, argument)) in schema.iter().zip(arguments).enumerate() {
        if argument.param_type() != spec.ty {
            return Err(BuzzError::InvalidArgument {
                operation: operation.to_string(),
                reason: format!(
                    "argument {} ({}) must be {}, got {}",
                    position,
                    spec.name,
                    spec.ty,
                    argument.param_type()
                ),
            });
        }
    }

    Ok(())
}

/// Whether a script failure means the account has no public collection.
pub fn is_missing_capability(message: &str) -> bool {
    message.contains(MISSING_CAPABILITY_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &[ParamSpec] = &[
        ParamSpec::new("id", ParamType::UInt64),
        ParamSpec::new("newName", ParamType::String),
    ];

    #[test]
    fn test_matching_arguments() {
        let args = vec![Argument::UInt64(1), Argument::String("a".into())];
        assert!(invariant_arguments_match("editName", SCHEMA, &args).is_ok());
    }

    #[test]
    fn test_wrong_arity() {
        let err =
            invariant_arguments_match("editName", SCHEMA, &[Argument::UInt64(1)]).unwrap_err();
        assert!(err.to_string().contains("expected 2 arguments, got 1"));
    }

    #[test]
    fn test_wrong_type_reports_position() {
        let args = vec![Argument::String("1".into()), Argument::String("a".into())];
        let err = invariant_arguments_match("editName", SCHEMA, &args).unwrap_err();
        assert!(err.to_string().contains("argument 0 (id) must be UInt64, got String"));
    }

    #[test]
    fn test_missing_capability_detection() {
        let message = "error: panic: Could not borrow capability from the public Buzz4 Collection";
        assert!(is_missing_capability(message));
        assert!(!is_missing_capability("error: computation limit exceeded"));
    }
}
