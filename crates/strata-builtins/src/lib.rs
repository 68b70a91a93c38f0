//! Builtin overloaded operations for strata.
//!
//! This crate provides the operations every module can use without
//! importing anything:
//!
//! - **arithmetic** - `+ - * / %` and unary `-` / `!`
//! - **comparison** - `== != < <= > >=`
//! - **conversion** - `toInt32`, `toInt64`, `toFloat64`, `toString`
//! - **string** - concatenation, `len`, `contains`, `repeat`
//! - **control** - `same` and `raise`, used by desugared `match`
//!
//! # Usage
//!
//! ```
//! use strata_builtins::{call, standard};
//! use strata_core::Value;
//!
//! let builtins = standard().unwrap();
//! assert_eq!(call(&builtins, "+", &[Value::Int32(2), Value::Int32(3)]), Ok(Value::Int32(5)));
//! ```

pub mod arithmetic;
pub mod comparison;
pub mod control;
pub mod conversion;
mod native;
pub mod string;

pub use native::{BuiltinFunction, Builtins, NativeError, NativeFn, NativeResult, call};

use strata_registry::DispatchError;

/// The full builtin registry, finalized.
pub fn standard() -> Result<Builtins, DispatchError> {
    let mut builtins = Builtins::new();
    arithmetic::register(&mut builtins)?;
    comparison::register(&mut builtins)?;
    control::register(&mut builtins)?;
    conversion::register(&mut builtins)?;
    string::register(&mut builtins)?;
    builtins.finalize();
    Ok(builtins)
}

/// Builtins callable by name, as opposed to operators.
pub fn function_names(builtins: &Builtins) -> impl Iterator<Item = &str> {
    builtins
        .names()
        .into_iter()
        .filter(|name| name.starts_with(|c: char| c.is_alphabetic()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Callable, TypeShape, Value};

    #[test]
    fn standard_registry_is_consistent() {
        let builtins = standard().unwrap();
        let names: Vec<&str> = function_names(&builtins).collect();
        assert_eq!(
            names,
            vec![
                "contains",
                "len",
                "raise",
                "repeat",
                "same",
                "toFloat64",
                "toInt32",
                "toInt64",
                "toString"
            ]
        );
        for name in builtins.names() {
            assert!(builtins.tree(name).is_some(), "{name} not finalized");
        }
    }

    #[test]
    fn builtin_function_values() {
        let builtins = standard().unwrap();
        let len = BuiltinFunction::lookup(&builtins, "len").unwrap();
        assert_eq!(len.shape(), TypeShape::function(vec![TypeShape::STRING], TypeShape::INT32));
        assert_eq!(len.call(&builtins, &[Value::str("abc")]), Ok(Value::Int32(3)));

        let to_string = BuiltinFunction::lookup(&builtins, "toString").unwrap();
        assert_eq!(to_string.name(), "toString");

        let to_int = BuiltinFunction::lookup(&builtins, "toInt32").unwrap();
        assert_eq!(to_int.shape(), TypeShape::Any);
        assert!(BuiltinFunction::lookup(&builtins, "nope").is_none());
    }
}
