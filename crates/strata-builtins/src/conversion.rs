//! Explicit numeric and string conversions.
//!
//! Narrowing integer conversions truncate; float to integer saturates.

use strata_core::{TypeShape, Value};
use strata_registry::{DispatchError, Signature};

use crate::native::{Builtins, arg, float64, int32, int64};

pub fn register(builtins: &mut Builtins) -> Result<(), DispatchError> {
    let convert = |from: TypeShape, to: TypeShape| Signature::new(vec![from], to);

    builtins.register("toInt32", convert(TypeShape::INT32, TypeShape::INT32), |a| {
        Ok(Value::Int32(int32(a, 0)?))
    })?;
    builtins.register("toInt32", convert(TypeShape::INT64, TypeShape::INT32), |a| {
        Ok(Value::Int32(int64(a, 0)? as i32))
    })?;
    builtins.register("toInt32", convert(TypeShape::FLOAT64, TypeShape::INT32), |a| {
        Ok(Value::Int32(float64(a, 0)? as i32))
    })?;

    builtins.register("toInt64", convert(TypeShape::INT32, TypeShape::INT64), |a| {
        Ok(Value::Int64(i64::from(int32(a, 0)?)))
    })?;
    builtins.register("toInt64", convert(TypeShape::INT64, TypeShape::INT64), |a| {
        Ok(Value::Int64(int64(a, 0)?))
    })?;
    builtins.register("toInt64", convert(TypeShape::FLOAT64, TypeShape::INT64), |a| {
        Ok(Value::Int64(float64(a, 0)? as i64))
    })?;

    builtins.register("toFloat64", convert(TypeShape::INT32, TypeShape::FLOAT64), |a| {
        Ok(Value::float(f64::from(int32(a, 0)?)))
    })?;
    builtins.register("toFloat64", convert(TypeShape::INT64, TypeShape::FLOAT64), |a| {
        Ok(Value::float(int64(a, 0)? as f64))
    })?;
    builtins.register("toFloat64", convert(TypeShape::FLOAT64, TypeShape::FLOAT64), |a| {
        Ok(Value::float(float64(a, 0)?))
    })?;

    builtins.register("toString", convert(TypeShape::Any, TypeShape::STRING), |a| {
        Ok(match arg(a, 0)? {
            Value::Str(s) => Value::Str(s.clone()),
            other => Value::str(other.to_string()),
        })
    })?;

    Ok(())
}
