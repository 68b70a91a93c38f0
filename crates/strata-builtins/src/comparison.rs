//! Equality and ordering operators.

use std::cmp::Ordering;

use strata_core::{TypeShape, Value};
use strata_registry::{DispatchError, Signature};

use crate::native::{Builtins, NativeError, NativeResult, arg};

const EQUATABLE: [TypeShape; 5] = [
    TypeShape::BOOL,
    TypeShape::INT32,
    TypeShape::INT64,
    TypeShape::FLOAT64,
    TypeShape::STRING,
];

const ORDERED: [TypeShape; 4] = [
    TypeShape::INT32,
    TypeShape::INT64,
    TypeShape::FLOAT64,
    TypeShape::STRING,
];

pub fn register(builtins: &mut Builtins) -> Result<(), DispatchError> {
    let predicate = |shape: TypeShape| Signature::new(vec![shape.clone(), shape], TypeShape::BOOL);

    for shape in EQUATABLE {
        builtins.register("==", predicate(shape.clone()), |a| {
            Ok(Value::Bool(arg(a, 0)? == arg(a, 1)?))
        })?;
        builtins.register("!=", predicate(shape), |a| {
            Ok(Value::Bool(arg(a, 0)? != arg(a, 1)?))
        })?;
    }

    for shape in ORDERED {
        builtins.register("<", predicate(shape.clone()), |a| test(a, Ordering::is_lt))?;
        builtins.register("<=", predicate(shape.clone()), |a| test(a, Ordering::is_le))?;
        builtins.register(">", predicate(shape.clone()), |a| test(a, Ordering::is_gt))?;
        builtins.register(">=", predicate(shape), |a| test(a, Ordering::is_ge))?;
    }

    Ok(())
}

fn test(args: &[Value], accept: fn(Ordering) -> bool) -> NativeResult {
    Ok(Value::Bool(accept(compare(arg(args, 0)?, arg(args, 1)?)?)))
}

/// Total order within one primitive kind; floats order by `OrderedFloat`.
fn compare(lhs: &Value, rhs: &Value) -> Result<Ordering, NativeError> {
    match (lhs, rhs) {
        (Value::Int32(a), Value::Int32(b)) => Ok(a.cmp(b)),
        (Value::Int64(a), Value::Int64(b)) => Ok(a.cmp(b)),
        (Value::Float64(a), Value::Float64(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (a, b) => Err(NativeError::type_mismatch(
            &format!("two values of the same ordered type as {}", a.shape()),
            b,
        )),
    }
}
