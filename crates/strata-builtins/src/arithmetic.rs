//! Arithmetic operators on `Int32`, `Int64` and `Float64`.
//!
//! Integer arithmetic wraps on overflow; integer division and remainder by
//! zero fail. Float arithmetic follows IEEE 754.

use strata_core::{TypeShape, Value};
use strata_registry::{DispatchError, Signature};

use crate::native::{Builtins, NativeError, NativeResult, boolean, float64, int32, int64};

pub fn register(builtins: &mut Builtins) -> Result<(), DispatchError> {
    let i32s = || Signature::new(vec![TypeShape::INT32, TypeShape::INT32], TypeShape::INT32);
    let i64s = || Signature::new(vec![TypeShape::INT64, TypeShape::INT64], TypeShape::INT64);
    let f64s = || Signature::new(vec![TypeShape::FLOAT64, TypeShape::FLOAT64], TypeShape::FLOAT64);

    // =========================================
    // Int32
    // =========================================
    builtins.register("+", i32s(), |a| int32_op(a, i32::wrapping_add))?;
    builtins.register("-", i32s(), |a| int32_op(a, i32::wrapping_sub))?;
    builtins.register("*", i32s(), |a| int32_op(a, i32::wrapping_mul))?;
    builtins.register("/", i32s(), |a| {
        let (x, y) = (int32(a, 0)?, int32(a, 1)?);
        nonzero(y == 0)?;
        Ok(Value::Int32(x.wrapping_div(y)))
    })?;
    builtins.register("%", i32s(), |a| {
        let (x, y) = (int32(a, 0)?, int32(a, 1)?);
        nonzero(y == 0)?;
        Ok(Value::Int32(x.wrapping_rem(y)))
    })?;

    // =========================================
    // Int64
    // =========================================
    builtins.register("+", i64s(), |a| int64_op(a, i64::wrapping_add))?;
    builtins.register("-", i64s(), |a| int64_op(a, i64::wrapping_sub))?;
    builtins.register("*", i64s(), |a| int64_op(a, i64::wrapping_mul))?;
    builtins.register("/", i64s(), |a| {
        let (x, y) = (int64(a, 0)?, int64(a, 1)?);
        nonzero(y == 0)?;
        Ok(Value::Int64(x.wrapping_div(y)))
    })?;
    builtins.register("%", i64s(), |a| {
        let (x, y) = (int64(a, 0)?, int64(a, 1)?);
        nonzero(y == 0)?;
        Ok(Value::Int64(x.wrapping_rem(y)))
    })?;

    // =========================================
    // Float64
    // =========================================
    builtins.register("+", f64s(), |a| float64_op(a, |x, y| x + y))?;
    builtins.register("-", f64s(), |a| float64_op(a, |x, y| x - y))?;
    builtins.register("*", f64s(), |a| float64_op(a, |x, y| x * y))?;
    builtins.register("/", f64s(), |a| float64_op(a, |x, y| x / y))?;
    builtins.register("%", f64s(), |a| float64_op(a, |x, y| x % y))?;

    // =========================================
    // Unary
    // =========================================
    let unary = |shape: TypeShape| Signature::new(vec![shape.clone()], shape);
    builtins.register("-", unary(TypeShape::INT32), |a| {
        Ok(Value::Int32(int32(a, 0)?.wrapping_neg()))
    })?;
    builtins.register("-", unary(TypeShape::INT64), |a| {
        Ok(Value::Int64(int64(a, 0)?.wrapping_neg()))
    })?;
    builtins.register("-", unary(TypeShape::FLOAT64), |a| {
        Ok(Value::float(-float64(a, 0)?))
    })?;
    builtins.register("!", unary(TypeShape::BOOL), |a| {
        Ok(Value::Bool(!boolean(a, 0)?))
    })?;

    Ok(())
}

fn nonzero(is_zero: bool) -> Result<(), NativeError> {
    if is_zero {
        Err(NativeError::division_by_zero())
    } else {
        Ok(())
    }
}

fn int32_op(args: &[Value], op: fn(i32, i32) -> i32) -> NativeResult {
    Ok(Value::Int32(op(int32(args, 0)?, int32(args, 1)?)))
}

fn int64_op(args: &[Value], op: fn(i64, i64) -> i64) -> NativeResult {
    Ok(Value::Int64(op(int64(args, 0)?, int64(args, 1)?)))
}

fn float64_op(args: &[Value], op: fn(f64, f64) -> f64) -> NativeResult {
    Ok(Value::float(op(float64(args, 0)?, float64(args, 1)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::call;
    use strata_core::FailKind;

    fn builtins() -> Builtins {
        let mut builtins = Builtins::new();
        register(&mut builtins).unwrap();
        builtins.finalize();
        builtins
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let b = builtins();
        assert_eq!(
            call(&b, "+", &[Value::Int32(i32::MAX), Value::Int32(1)]),
            Ok(Value::Int32(i32::MIN))
        );
        assert_eq!(
            call(&b, "*", &[Value::Int64(6), Value::Int64(7)]),
            Ok(Value::Int64(42))
        );
        assert_eq!(
            call(&b, "/", &[Value::Int32(i32::MIN), Value::Int32(-1)]),
            Ok(Value::Int32(i32::MIN))
        );
    }

    #[test]
    fn integer_division_by_zero_fails() {
        let b = builtins();
        let err = call(&b, "%", &[Value::Int64(1), Value::Int64(0)]).unwrap_err();
        assert_eq!(err.kind, FailKind::DivisionByZero);
    }

    #[test]
    fn float_division_by_zero_is_infinite() {
        let b = builtins();
        assert_eq!(
            call(&b, "/", &[Value::float(1.0), Value::float(0.0)]),
            Ok(Value::float(f64::INFINITY))
        );
    }

    #[test]
    fn unary_operators_share_names_with_binary() {
        let b = builtins();
        assert_eq!(call(&b, "-", &[Value::Int32(5)]), Ok(Value::Int32(-5)));
        assert_eq!(
            call(&b, "-", &[Value::Int32(5), Value::Int32(2)]),
            Ok(Value::Int32(3))
        );
        assert_eq!(call(&b, "!", &[Value::Bool(true)]), Ok(Value::Bool(false)));
    }

    #[test]
    fn mixed_widths_have_no_overload() {
        let b = builtins();
        let err = call(&b, "+", &[Value::Int32(1), Value::Int64(1)]).unwrap_err();
        assert_eq!(err.kind, FailKind::NoOverload);
    }
}
