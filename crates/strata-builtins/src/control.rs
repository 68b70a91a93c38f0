//! Functions desugared code relies on.
//!
//! `match` lowers to an `if` chain over `same`, and falls through to `raise`
//! when no arm accepts the scrutinee.

use strata_core::{FailKind, TypeShape, Value};
use strata_registry::{DispatchError, Signature};

use crate::native::{Builtins, NativeError, arg, string};

pub fn register(builtins: &mut Builtins) -> Result<(), DispatchError> {
    // Structural equality across kinds; never dispatches on the operands.
    builtins.register(
        "same",
        Signature::new(vec![TypeShape::Any, TypeShape::Any], TypeShape::BOOL),
        |a| Ok(Value::Bool(arg(a, 0)? == arg(a, 1)?)),
    )?;

    builtins.register(
        "raise",
        Signature::new(vec![TypeShape::STRING], TypeShape::VOID),
        |a| Err(NativeError::new(FailKind::Raised, string(a, 0)?.to_string())),
    )?;

    Ok(())
}
