//! Shape inference and definite type errors.
//!
//! Shapes are coarse: anything not statically known is [`TypeShape::Any`]
//! and accepted everywhere. Only mismatches between two known shapes are
//! reported, so a program that type-checks here may still fail at run time.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use strata_core::{BindingId, Diagnostic, LogSink, Span, TypeShape};
use strata_interp::Intrinsic;
use strata_parser::ast::visitor::{walk_expr, walk_stmt};
use strata_parser::ast::{
    BinaryOp, Block, DeclFlags, Expr, ExprKind, FnExpr, Name, Stmt, Visit, params_shape,
};
use strata_registry::DispatchError;

use super::StepContext;
use crate::module::Module;

#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn run(module: &mut Module, step: &StepContext<'_>) {
    let mut checker = Checker {
        shapes: module.import_shapes.clone(),
        annotated: FxHashMap::default(),
        seeded: FxHashSet::default(),
        step,
    };
    checker.seed(&module.tree);
    checker.block(&module.tree);

    module.declared_types = module
        .tree
        .decls()
        .filter(|decl| !decl.flags.contains(DeclFlags::SYNTHETIC))
        .filter_map(|decl| {
            let shape = checker.shapes.get(&decl.name.binding?)?;
            Some((decl.name.text.clone(), shape.clone()))
        })
        .collect::<BTreeMap<_, _>>();
}

struct Checker<'a, 'b> {
    shapes: FxHashMap<BindingId, TypeShape>,
    /// Bindings with a written type; assignments must respect it.
    annotated: FxHashMap<BindingId, TypeShape>,
    /// Bindings whose shape so far only comes from [`Checker::seed`].
    seeded: FxHashSet<BindingId>,
    step: &'a StepContext<'b>,
}

impl Checker<'_, '_> {
    fn error(&self, message: String, span: Span) {
        self.step.log.log(Diagnostic::error(message).at(span));
    }

    /// Record written types and function signatures before inference, so
    /// forward references and recursion see them.
    fn seed(&mut self, root: &Block) {
        struct Seeder<'c, 'a, 'b>(&'c mut Checker<'a, 'b>);

        impl Visit for Seeder<'_, '_, '_> {
            fn visit_stmt(&mut self, stmt: &Stmt) {
                match stmt {
                    Stmt::Decl(decl) => {
                        if let Some(id) = decl.name.binding {
                            if let Some(ty) = &decl.ty {
                                self.0.annotated.insert(id, ty.shape.clone());
                                self.0.shapes.insert(id, ty.shape.clone());
                            } else if decl.flags.contains(DeclFlags::TYPE_DEF) {
                                self.0.shapes.insert(id, TypeShape::Type);
                            } else if let Some(func) = decl.init.as_ref().and_then(Expr::as_fn) {
                                self.0.shapes.insert(id, func.shape());
                                self.0.seeded.insert(id);
                            }
                        }
                    }
                    Stmt::Assign(assign) => {
                        if let (Some(id), Some(func)) = (assign.target.binding, assign.value.as_fn())
                        {
                            self.0.shapes.entry(id).or_insert_with(|| func.shape());
                            self.0.seeded.insert(id);
                        }
                    }
                    _ => {}
                }
                walk_stmt(self, stmt);
            }

            fn visit_expr(&mut self, expr: &Expr) {
                if let ExprKind::Fn(func) = &expr.kind {
                    for param in &func.params {
                        if let Some(id) = param.name.binding {
                            let shape = param.ty.as_ref().map_or(TypeShape::Any, |t| t.shape.clone());
                            self.0.shapes.insert(id, shape);
                        }
                    }
                }
                walk_expr(self, expr);
            }
        }

        Seeder(self).visit_block(root);
    }

    /// Shape of the block's value.
    fn block(&mut self, block: &Block) -> TypeShape {
        let mut last = TypeShape::VOID;
        for stmt in &block.stmts {
            last = self.stmt(stmt);
        }
        last
    }

    fn stmt(&mut self, stmt: &Stmt) -> TypeShape {
        match stmt {
            Stmt::Decl(decl) => {
                let Some(id) = decl.name.binding else {
                    return TypeShape::VOID;
                };
                if let Some(init) = &decl.init {
                    let shape = self.expr(init);
                    match self.annotated.get(&id) {
                        Some(declared) if !declared.accepts(&shape) => self.error(
                            format!(
                                "`{}` is declared {declared} but initialized with {shape}",
                                decl.name.text
                            ),
                            init.span,
                        ),
                        Some(_) => {}
                        None if !decl.flags.contains(DeclFlags::TYPE_DEF) => {
                            self.shapes.insert(id, shape);
                            self.seeded.remove(&id);
                        }
                        None => {}
                    }
                }
                TypeShape::VOID
            }
            Stmt::Assign(assign) => {
                let shape = self.expr(&assign.value);
                self.assigned(&assign.target, shape, assign.value.span);
                TypeShape::VOID
            }
            Stmt::Await(wait) => {
                let shape = self.expr(&wait.promise);
                let awaited = match shape {
                    TypeShape::Promise(of) => (*of).clone(),
                    TypeShape::Any => TypeShape::Any,
                    other => {
                        self.error(format!("cannot await a value of type {other}"), wait.promise.span);
                        TypeShape::Any
                    }
                };
                if let Some(id) = wait.bind.as_ref().and_then(|n| n.binding) {
                    self.shapes.insert(id, awaited);
                }
                TypeShape::VOID
            }
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Import(_) | Stmt::Ambiguous(_) | Stmt::FnDef(_) | Stmt::TypeDef(_) => {
                TypeShape::VOID
            }
        }
    }

    fn assigned(&mut self, target: &Name, shape: TypeShape, span: Span) {
        let Some(id) = target.binding else {
            return;
        };
        if let Some(declared) = self.annotated.get(&id) {
            if !declared.accepts(&shape) {
                self.error(
                    format!("cannot assign {shape} to `{}` of type {declared}", target.text),
                    span,
                );
            }
            return;
        }
        let widened = match self.shapes.get(&id) {
            Some(previous) if !self.seeded.contains(&id) && *previous != shape => TypeShape::Any,
            _ => shape,
        };
        self.seeded.remove(&id);
        self.shapes.insert(id, widened);
    }

    fn expr(&mut self, expr: &Expr) -> TypeShape {
        match &expr.kind {
            ExprKind::Value(value) => value.shape(),
            ExprKind::Name(name) => self.name(name),
            ExprKind::Call { callee, args } => {
                let args: Vec<TypeShape> = args.iter().map(|arg| self.expr(arg)).collect();
                if let Some(builtin) = self.builtin(callee) {
                    return self.dispatch(builtin, &args, expr.span);
                }
                let callee_shape = self.expr(callee);
                self.call(&callee_shape, &args, expr.span)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.expr(operand);
                self.dispatch(op.symbol(), &[operand], expr.span)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let (l, r) = (self.expr(lhs), self.expr(rhs));
                if op.is_short_circuit() {
                    self.condition(&l, lhs.span, *op);
                    self.condition(&r, rhs.span, *op);
                    TypeShape::BOOL
                } else {
                    self.dispatch(op.symbol(), &[l, r], expr.span)
                }
            }
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => {
                let shape = self.expr(cond);
                if !TypeShape::BOOL.accepts(&shape) {
                    self.error(format!("condition must be Bool, found {shape}"), cond.span);
                }
                let then = self.block(then);
                let otherwise = otherwise
                    .as_ref()
                    .map_or(TypeShape::VOID, |otherwise| self.expr(otherwise));
                if then == otherwise { then } else { TypeShape::Any }
            }
            ExprKind::Fn(func) => self.function(func),
            ExprKind::Match { scrutinee, arms } => {
                self.expr(scrutinee);
                for arm in arms {
                    self.expr(&arm.body);
                }
                TypeShape::Any
            }
            ExprKind::Async(body) => TypeShape::promise(self.block(body)),
            ExprKind::Comptime(inner) => self.expr(inner),
            ExprKind::Block(block) => self.block(block),
            ExprKind::TypeValue(_) => TypeShape::Type,
        }
    }

    fn name(&self, name: &Name) -> TypeShape {
        if let Some(id) = name.binding {
            return self.shapes.get(&id).cloned().unwrap_or(TypeShape::Any);
        }
        if let Some(value) = self.step.cx.capabilities.get(&name.text) {
            return value.shape();
        }
        Intrinsic::from_name(&name.text).map_or(TypeShape::Any, Intrinsic::shape)
    }

    /// The builtin operation a callee names, unless something shadows it.
    fn builtin<'e>(&self, callee: &'e Expr) -> Option<&'e str> {
        let name = callee.as_name()?;
        let cx = self.step.cx;
        let shadowed = name.binding.is_some()
            || cx.capabilities.contains(&name.text)
            || Intrinsic::from_name(&name.text).is_some();
        (!shadowed && cx.builtins.contains(&name.text)).then_some(&*name.text)
    }

    /// Result shape of a builtin operation. Only arguments of known shape
    /// can rule every overload out.
    fn dispatch(&self, name: &str, args: &[TypeShape], span: Span) -> TypeShape {
        if args.iter().any(TypeShape::is_any) {
            return TypeShape::Any;
        }
        match self.step.cx.builtins.result_type(name, args) {
            Ok(shape) => shape,
            Err(DispatchError::Ambiguous { .. }) => TypeShape::Any,
            Err(err) => {
                self.error(err.to_string(), span);
                TypeShape::Any
            }
        }
    }

    fn call(&self, callee: &TypeShape, args: &[TypeShape], span: Span) -> TypeShape {
        match callee {
            TypeShape::Any => TypeShape::Any,
            TypeShape::Function(func) => {
                if func.params.len() != args.len() {
                    self.error(
                        format!(
                            "function of type {callee} takes {} arguments, {} given",
                            func.params.len(),
                            args.len()
                        ),
                        span,
                    );
                } else if let Some((i, (param, arg))) = func
                    .params
                    .iter()
                    .zip(args)
                    .enumerate()
                    .find(|(_, (param, arg))| !param.accepts(arg))
                {
                    self.error(format!("argument {i} must be {param}, found {arg}"), span);
                }
                func.result.clone()
            }
            other => {
                self.error(format!("{other} is not callable"), span);
                TypeShape::Any
            }
        }
    }

    fn condition(&self, shape: &TypeShape, span: Span, op: BinaryOp) {
        if !TypeShape::BOOL.accepts(shape) {
            self.error(format!("operands of `{op}` must be Bool, found {shape}"), span);
        }
    }

    fn function(&mut self, func: &FnExpr) -> TypeShape {
        let body = self.block(&func.body);
        let result = match &func.ret {
            Some(ret) => {
                if !ret.shape.accepts(&body) {
                    self.error(
                        format!("function returns {body} but is declared to return {}", ret.shape),
                        func.body.span,
                    );
                }
                ret.shape.clone()
            }
            None => body,
        };
        TypeShape::function(params_shape(&func.params), result)
    }
}

#[cfg(test)]
mod tests {
    use strata_core::{Stage, TypeShape};

    use crate::stages::testing::Bench;

    fn typed(bench: &Bench, source: &str) -> (bool, crate::module::Module) {
        let mut module = bench.module(source);
        let ok = bench.advance_through(&mut module, Stage::Type);
        (ok, module)
    }

    #[test]
    fn infers_top_level_shapes() {
        let bench = Bench::new();
        let (ok, module) = typed(
            &bench,
            "let a = 1 + 2; let b = 1i64; let s = \"x\" + \"y\"; \
             fn twice(n: Int32) -> Int32 { n * 2 } let t = twice(a); type Id = Int64;",
        );
        assert!(ok, "{:?}", bench.errors());
        let types = module.declared_types();
        assert_eq!(types["a"], TypeShape::INT32);
        assert_eq!(types["b"], TypeShape::INT64);
        assert_eq!(types["s"], TypeShape::STRING);
        assert_eq!(
            types["twice"],
            TypeShape::function(vec![TypeShape::INT32], TypeShape::INT32)
        );
        assert_eq!(types["t"], TypeShape::INT32);
        assert_eq!(types["Id"], TypeShape::Type);
    }

    #[test]
    fn unannotated_functions_infer_their_result() {
        let bench = Bench::new();
        let (ok, module) = typed(&bench, "let greet = fn(name: String) { \"hi \" + name };");
        assert!(ok, "{:?}", bench.errors());
        assert_eq!(
            module.declared_types()["greet"],
            TypeShape::function(vec![TypeShape::STRING], TypeShape::STRING)
        );
    }

    #[test]
    fn operators_without_an_overload_are_errors() {
        let bench = Bench::new();
        let (ok, _) = typed(&bench, "let x = 1 + \"one\";");
        assert!(!ok);
        assert!(bench.errors()[0].contains("no overload of `+`"), "{:?}", bench.errors());
    }

    #[test]
    fn conditions_must_be_bool() {
        let bench = Bench::new();
        let (ok, _) = typed(&bench, "let x = if (1) { 2 } else { 3 };");
        assert!(!ok);
        assert!(bench.errors()[0].contains("condition must be Bool"));
    }

    #[test]
    fn calling_a_non_function_is_an_error() {
        let bench = Bench::new();
        let (ok, _) = typed(&bench, "let x = 1; x(2);");
        assert!(!ok);
        assert!(bench.errors()[0].contains("Int32 is not callable"));
    }

    #[test]
    fn arity_and_argument_shapes_are_checked() {
        let bench = Bench::new();
        let (ok, _) = typed(
            &bench,
            "fn f(a: Int32) -> Int32 { a } f(1, 2); f(\"no\");",
        );
        assert!(!ok);
        let errors = bench.errors();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("takes 1 arguments, 2 given"));
        assert!(errors[1].contains("argument 0 must be Int32, found String"));
    }

    #[test]
    fn annotations_are_enforced() {
        let bench = Bench::new();
        let (ok, _) = typed(&bench, "var n: Int32 = 1; n := \"two\"; let m: Bool = 3;");
        assert!(!ok);
        let errors = bench.errors();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("cannot assign String to `n`"));
        assert!(errors[1].contains("declared Bool but initialized with Int32"));
    }

    #[test]
    fn unknown_shapes_are_accepted() {
        let bench = Bench::new();
        let (ok, module) = typed(&bench, "fn id(x) { x } let y = id(1) + 2; var z = 1; z := \"s\";");
        assert!(ok, "{:?}", bench.errors());
        assert_eq!(module.declared_types()["y"], TypeShape::Any);
        assert_eq!(module.declared_types()["z"], TypeShape::Any);
    }

    #[test]
    fn async_blocks_are_promises() {
        let bench = Bench::new();
        let (ok, module) = typed(&bench, "let p = async { 1 }; let q = 3; await q;");
        assert!(!ok);
        assert_eq!(
            module.declared_types()["p"],
            TypeShape::promise(TypeShape::INT32)
        );
        assert!(bench.errors()[0].contains("cannot await a value of type Int32"));
    }
}
