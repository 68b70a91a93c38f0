//! String operations.

use strata_core::{TypeShape, Value};
use strata_registry::{DispatchError, Signature};

use crate::native::{Builtins, int32, string};

pub fn register(builtins: &mut Builtins) -> Result<(), DispatchError> {
    builtins.register(
        "+",
        Signature::new(vec![TypeShape::STRING, TypeShape::STRING], TypeShape::STRING),
        |a| {
            let (lhs, rhs) = (string(a, 0)?, string(a, 1)?);
            let mut out = String::with_capacity(lhs.len() + rhs.len());
            out.push_str(lhs);
            out.push_str(rhs);
            Ok(Value::str(out))
        },
    )?;

    // Length in characters, not bytes.
    builtins.register(
        "len",
        Signature::new(vec![TypeShape::STRING], TypeShape::INT32),
        |a| {
            let count = string(a, 0)?.chars().count();
            Ok(Value::Int32(i32::try_from(count).unwrap_or(i32::MAX)))
        },
    )?;

    builtins.register(
        "contains",
        Signature::new(vec![TypeShape::STRING, TypeShape::STRING], TypeShape::BOOL),
        |a| Ok(Value::Bool(string(a, 0)?.contains(string(a, 1)?))),
    )?;

    builtins.register(
        "repeat",
        Signature::new(vec![TypeShape::STRING, TypeShape::INT32], TypeShape::STRING),
        |a| {
            let times = usize::try_from(int32(a, 1)?).unwrap_or(0);
            Ok(Value::str(string(a, 0)?.repeat(times)))
        },
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::call;

    fn builtins() -> Builtins {
        let mut builtins = Builtins::new();
        register(&mut builtins).unwrap();
        builtins.finalize();
        builtins
    }

    #[test]
    fn concatenation() {
        let b = builtins();
        assert_eq!(
            call(&b, "+", &[Value::str("ab"), Value::str("cd")]),
            Ok(Value::str("abcd"))
        );
    }

    #[test]
    fn length_counts_characters() {
        let b = builtins();
        assert_eq!(call(&b, "len", &[Value::str("größe")]), Ok(Value::Int32(5)));
    }

    #[test]
    fn contains_and_repeat() {
        let b = builtins();
        assert_eq!(
            call(&b, "contains", &[Value::str("staged"), Value::str("tag")]),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            call(&b, "repeat", &[Value::str("ab"), Value::Int32(3)]),
            Ok(Value::str("ababab"))
        );
        assert_eq!(
            call(&b, "repeat", &[Value::str("ab"), Value::Int32(-1)]),
            Ok(Value::str(""))
        );
    }
}
