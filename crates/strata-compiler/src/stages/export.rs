//! Publish the module's exported declarations.
//!
//! The export list follows declaration order. A value the partial
//! interpretation could not compute is published without one, and
//! importers see the binding as unready.

use std::sync::Arc;

use strata_core::{PartialResult, Stage, TypeShape, Value};
use strata_interp::Mode;

use super::StepContext;
use crate::module::Module;
use crate::outputs::Export;
use crate::runner::InterpretiveStage;

pub(crate) struct Publish;

impl InterpretiveStage for Publish {
    const STAGE: Stage = Stage::Export;
    const MODE: Mode = Mode::Partial;

    fn publish(module: &mut Module, _step: &StepContext<'_>, _result: &PartialResult) {
        let exports: Vec<Export> = module
            .tree
            .decls()
            .filter_map(|decl| {
                let name = decl.export.clone()?;
                let binding = decl.name.binding?;
                let value = module.env.lookup(binding).and_then(|b| b.value);
                let shape = module
                    .declared_types
                    .get(&decl.name.text)
                    .cloned()
                    .or_else(|| value.as_ref().map(Value::shape))
                    .unwrap_or(TypeShape::Any);
                Some(Export {
                    name,
                    binding,
                    value,
                    shape,
                })
            })
            .collect();
        tracing::debug!(module = %module.name(), exports = exports.len(), "published exports");
        module.exports = Arc::from(exports);
    }
}

#[cfg(test)]
mod tests {
    use strata_core::{Stage, TypeShape, Value};

    use crate::stages::testing::Bench;

    #[test]
    fn publishes_exported_declarations_in_order() {
        let bench = Bench::new();
        let mut module = bench.module(
            "export let answer = 42; let hidden = 1; export fn double(n: Int32) -> Int32 { n * 2 } \
             export type Id = Int64;",
        );
        assert!(bench.advance_through(&mut module, Stage::Export), "{:?}", bench.errors());

        let names: Vec<_> = module.exports().iter().map(|e| e.name.base_name().to_string()).collect();
        assert_eq!(names, ["double", "Id", "answer"]);

        let outputs = module.outputs().unwrap();
        let answer = outputs.export("answer").unwrap();
        assert_eq!(answer.value, Some(Value::Int32(42)));
        assert_eq!(answer.shape, TypeShape::INT32);
        assert_eq!(
            outputs.export("double").unwrap().shape,
            TypeShape::function(vec![TypeShape::INT32], TypeShape::INT32)
        );
        assert_eq!(outputs.export("Id").unwrap().as_type(), Some(&TypeShape::INT64));
        assert!(outputs.export("hidden").is_none());
    }

    #[test]
    fn effects_are_published_without_a_value() {
        let bench = Bench::new();
        let mut module = bench.module("export let p = promise();");
        assert!(bench.advance_through(&mut module, Stage::Export), "{:?}", bench.errors());
        let p = &module.exports()[0];
        assert_eq!(p.value, None);
        assert_eq!(p.shape, TypeShape::promise(TypeShape::Any));
    }
}
