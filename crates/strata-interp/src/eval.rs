//! Statement and expression evaluation.

use std::sync::Arc;

use strata_builtins::{BuiltinFunction, Builtins};
use strata_core::{
    Binding, BindingId, Callable, Fail, FailKind, Lifespan, LogSink, PartialResult, PromiseId,
    ReadinessClock, ReadinessError, Span, TypeShape, Value,
};
use strata_parser::ast::{
    AwaitStmt, BinaryOp, Block, Decl, DeclFlags, Expr, ExprKind, FnExpr, MatchArm, Name, Pattern,
    Stmt, TypeRef,
};

use crate::cancel::CancellationScope;
use crate::closure::Closure;
use crate::environment::{AssignError, Environment};
use crate::host::{Capabilities, HostFunction, Intrinsic, Resolvers};
use crate::interpreter::{InterpretOptions, Mode};
use crate::promises::{PromiseState, Promises, Task, Waiting};

/// Why evaluation stopped without a value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Halt {
    /// Partial evaluation cannot compute this yet.
    NotYet,
    Fail(Fail),
}

impl From<Fail> for Halt {
    fn from(fail: Fail) -> Self {
        Halt::Fail(fail)
    }
}

impl From<ReadinessError> for Halt {
    fn from(err: ReadinessError) -> Self {
        Halt::Fail(err.into())
    }
}

pub(crate) type Eval = Result<Value, Halt>;

pub(crate) fn into_partial(result: Eval) -> PartialResult {
    match result {
        Ok(value) => PartialResult::Value(value),
        Err(Halt::NotYet) => PartialResult::NotYet,
        Err(Halt::Fail(fail)) => PartialResult::Fail(fail),
    }
}

fn fail(kind: FailKind, message: impl Into<String>, span: Span) -> Halt {
    Halt::Fail(Fail::new(kind, message, span))
}

fn binding_of(name: &Name) -> Result<BindingId, Halt> {
    name.binding.ok_or_else(|| {
        fail(
            FailKind::UnresolvedName,
            format!("`{}` was never resolved", name.text),
            name.span,
        )
    })
}

/// Declared shapes that can be checked against a runtime value.
fn checkable(ty: Option<&TypeRef>) -> Option<&TypeShape> {
    ty.map(|t| &t.shape)
        .filter(|shape| !matches!(shape, TypeShape::Named(_)))
}

pub(crate) struct Evaluator<'a> {
    pub mode: Mode,
    pub clock: &'a ReadinessClock,
    pub builtins: &'a Builtins,
    pub capabilities: &'a Capabilities,
    pub resolvers: &'a Resolvers,
    pub promises: &'a Promises,
    pub cancel: &'a CancellationScope,
    pub log: &'a dyn LogSink,
    pub options: InterpretOptions,
    pub steps: u64,
    pub depth: usize,
}

impl Evaluator<'_> {
    fn is_partial(&self) -> bool {
        self.mode == Mode::Partial
    }

    fn step(&mut self, span: Span) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            return Err(fail(FailKind::Cancelled, "interpretation was cancelled", span));
        }
        self.steps += 1;
        if self.steps > self.options.step_quota {
            return Err(fail(
                FailKind::StepQuotaExceeded,
                format!("step quota of {} exceeded", self.options.step_quota),
                span,
            ));
        }
        Ok(())
    }

    fn lifespan(&self) -> Lifespan {
        self.clock
            .lifespan_for_new_binding(self.options.durable_bindings)
    }

    // =========================================
    // Statements
    // =========================================

    /// Evaluate a module's top-level statements in `env`.
    ///
    /// In `Partial` mode a statement that is not computable yet is skipped;
    /// the first failure stops evaluation.
    pub fn top_level(&mut self, block: &Block, env: &Environment) -> Eval {
        let mut last = Ok(Value::Void);
        for stmt in &block.stmts {
            last = match stmt {
                Stmt::Await(stmt) => self.await_top_level(stmt, env),
                _ => self.exec(stmt, env),
            };
            if let Err(Halt::Fail(_)) = last {
                return last;
            }
        }
        last
    }

    /// Evaluate a nested block in a fresh frame; its value is that of the
    /// last statement.
    pub fn block(&mut self, block: &Block, env: &Environment) -> Eval {
        let frame = env.child();
        let mut last = Value::Void;
        for stmt in &block.stmts {
            last = self.exec(stmt, &frame)?;
        }
        Ok(last)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Environment) -> Eval {
        self.step(stmt.span())?;
        match stmt {
            Stmt::Import(_) => Ok(Value::Void),
            Stmt::Decl(decl) => self.declare(decl, env),
            Stmt::Assign(assign) => {
                let value = self.named_value(&assign.value, env, &assign.target.text)?;
                self.assign(&assign.target, value, env)
            }
            Stmt::Ambiguous(stmt) => {
                let value = self.named_value(&stmt.value, env, &stmt.name.text)?;
                let id = binding_of(&stmt.name)?;
                if env.lookup(id).is_some() {
                    self.assign(&stmt.name, value, env)
                } else {
                    env.define(id, Binding::new(Some(value), self.lifespan(), false));
                    Ok(Value::Void)
                }
            }
            Stmt::FnDef(def) => {
                let id = binding_of(&def.name)?;
                let closure = self.closure(&def.func, env, Some(&def.name.text));
                env.define(id, Binding::new(Some(closure), self.lifespan(), false));
                Ok(Value::Void)
            }
            Stmt::TypeDef(def) => {
                let id = binding_of(&def.name)?;
                let value = Value::Type(def.ty.shape.clone());
                env.define(id, Binding::new(Some(value), self.lifespan(), false));
                Ok(Value::Void)
            }
            Stmt::Await(stmt) => Err(fail(
                FailKind::AwaitNotAllowed,
                "`await` is only allowed directly inside an async block",
                stmt.span,
            )),
            Stmt::Expr(expr) => self.expr(expr, env),
        }
    }

    fn declare(&mut self, decl: &Decl, env: &Environment) -> Eval {
        let id = binding_of(&decl.name)?;
        let value = if decl.flags.contains(DeclFlags::EXTERN) {
            Some(self.resolve_extern(decl)?)
        } else {
            match &decl.init {
                None => None,
                Some(init) => match self.named_value(init, env, &decl.name.text) {
                    Ok(value) => Some(value),
                    Err(Halt::NotYet) => None,
                    Err(halt) => return Err(halt),
                },
            }
        };
        if let (Some(value), Some(expected)) = (&value, checkable(decl.ty.as_ref())) {
            if !expected.accepts(&value.shape()) {
                return Err(fail(
                    FailKind::TypeMismatch,
                    format!(
                        "`{}` is declared {expected} but initialized with {}",
                        decl.name.text,
                        value.shape()
                    ),
                    decl.span,
                ));
            }
        }
        env.define(id, Binding::new(value, self.lifespan(), decl.is_mutable()));
        Ok(Value::Void)
    }

    fn resolve_extern(&self, decl: &Decl) -> Eval {
        let name = &decl.name.text;
        let shape = decl.ty.as_ref().map_or(TypeShape::Any, |t| t.shape.clone());
        let resolver = self.resolvers.get(name).ok_or_else(|| {
            fail(
                FailKind::MissingResolver,
                format!("no signature resolver for extern `{name}`"),
                decl.span,
            )
        })?;
        resolver.resolve(name, &shape).ok_or_else(|| {
            fail(
                FailKind::MissingResolver,
                format!("resolver for `{name}` has no implementation of {shape}"),
                decl.span,
            )
        })
    }

    fn assign(&mut self, target: &Name, value: Value, env: &Environment) -> Eval {
        let id = binding_of(target)?;
        match env.assign(id, value, self.lifespan()) {
            Ok(()) => Ok(Value::Void),
            Err(AssignError::Undeclared) if self.is_partial() => Err(Halt::NotYet),
            Err(AssignError::Undeclared) => Err(fail(
                FailKind::UnresolvedName,
                format!("`{}` is assigned before it is declared", target.text),
                target.span,
            )),
            Err(AssignError::Immutable) => Err(fail(
                FailKind::AssignToImmutable,
                format!("`{}` is immutable and already has a value", target.text),
                target.span,
            )),
        }
    }

    /// Evaluate an initializer; function expressions take the bound name.
    fn named_value(&mut self, expr: &Expr, env: &Environment, name: &str) -> Eval {
        match &expr.kind {
            ExprKind::Fn(func) => {
                self.step(expr.span)?;
                Ok(self.closure(func, env, Some(name)))
            }
            _ => self.expr(expr, env),
        }
    }

    // =========================================
    // Expressions
    // =========================================

    pub fn expr(&mut self, expr: &Expr, env: &Environment) -> Eval {
        self.step(expr.span)?;
        match &expr.kind {
            ExprKind::Value(value) => Ok(value.clone()),
            ExprKind::Name(name) => self.read(name, env),
            ExprKind::Call { callee, args } => {
                let callee = self.expr(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.expr(arg, env))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(&callee, &args, expr.span)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.expr(operand, env)?;
                self.operator(op.symbol(), &[operand], expr.span)
            }
            ExprKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::And => {
                    Ok(Value::Bool(self.condition(lhs, env)? && self.condition(rhs, env)?))
                }
                BinaryOp::Or => {
                    Ok(Value::Bool(self.condition(lhs, env)? || self.condition(rhs, env)?))
                }
                _ => {
                    let lhs = self.expr(lhs, env)?;
                    let rhs = self.expr(rhs, env)?;
                    self.operator(op.symbol(), &[lhs, rhs], expr.span)
                }
            },
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => {
                if self.condition(cond, env)? {
                    self.block(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.expr(otherwise, env)
                } else {
                    Ok(Value::Void)
                }
            }
            ExprKind::Fn(func) => Ok(self.closure(func, env, None)),
            ExprKind::Match { scrutinee, arms } => self.matching(scrutinee, arms, env, expr.span),
            ExprKind::Async(body) => self.spawn(body, env),
            ExprKind::Comptime(inner) => self.expr(inner, env),
            ExprKind::Block(block) => self.block(block, env),
            ExprKind::TypeValue(ty) => Ok(Value::Type(ty.shape.clone())),
        }
    }

    fn read(&mut self, name: &Name, env: &Environment) -> Eval {
        let Some(id) = name.binding else {
            return self.global(name);
        };
        let Some(binding) = env.lookup(id) else {
            if self.is_partial() {
                return Err(Halt::NotYet);
            }
            return Err(fail(
                FailKind::UnresolvedName,
                format!("`{}` is not bound here", name.text),
                name.span,
            ));
        };
        match self.clock.consume(&name.text, &binding, name.span) {
            Ok(value) => Ok(value.clone()),
            Err(ReadinessError::Unready { .. }) if self.is_partial() => Err(Halt::NotYet),
            Err(err) => Err(err.into()),
        }
    }

    /// Names without a binding refer to capabilities, intrinsics or builtins.
    fn global(&self, name: &Name) -> Eval {
        if let Some(value) = self.capabilities.get(&name.text) {
            return Ok(value.clone());
        }
        if let Some(intrinsic) = Intrinsic::from_name(&name.text) {
            return Ok(Value::function(intrinsic));
        }
        if let Some(builtin) = BuiltinFunction::lookup(self.builtins, &name.text) {
            return Ok(Value::function(builtin));
        }
        Err(fail(
            FailKind::UnresolvedName,
            format!("`{}` is not defined", name.text),
            name.span,
        ))
    }

    fn condition(&mut self, expr: &Expr, env: &Environment) -> Result<bool, Halt> {
        match self.expr(expr, env)? {
            Value::Bool(b) => Ok(b),
            other => Err(fail(
                FailKind::TypeMismatch,
                format!("condition must be Bool, found {}", other.shape()),
                expr.span,
            )),
        }
    }

    fn operator(&self, symbol: &str, args: &[Value], span: Span) -> Eval {
        strata_builtins::call(self.builtins, symbol, args)
            .map_err(|err| fail(err.kind, err.message, span))
    }

    fn closure(&self, func: &FnExpr, env: &Environment, name: Option<&str>) -> Value {
        let name: Arc<str> = match (&func.name, name) {
            (Some(own), _) => own.clone(),
            (None, Some(bound)) => Arc::from(bound),
            (None, None) => Arc::from("anonymous"),
        };
        Value::function(Closure::new(name, Arc::new(func.clone()), env.clone()))
    }

    fn matching(&mut self, scrutinee: &Expr, arms: &[MatchArm], env: &Environment, span: Span) -> Eval {
        let value = self.expr(scrutinee, env)?;
        for arm in arms {
            let hit = match &arm.pattern {
                Pattern::Wildcard(_) => true,
                Pattern::Value(pattern, _) => *pattern == value,
            };
            if hit {
                return self.expr(&arm.body, env);
            }
        }
        Err(fail(FailKind::Raised, format!("no match arm accepts {value}"), span))
    }

    // =========================================
    // Calls
    // =========================================

    pub fn call(&mut self, callee: &Value, args: &[Value], span: Span) -> Eval {
        let Value::Function(function) = callee else {
            return Err(fail(
                FailKind::NotCallable,
                format!("{} is not callable", callee.shape()),
                span,
            ));
        };
        let any = function.as_any();

        if let Some(closure) = any.downcast_ref::<Closure>() {
            return self.call_closure(closure, args, span);
        }
        if let Some(builtin) = any.downcast_ref::<BuiltinFunction>() {
            return builtin
                .call(self.builtins, args)
                .map_err(|err| fail(err.kind, err.message, span));
        }
        if let Some(intrinsic) = any.downcast_ref::<Intrinsic>() {
            return self.call_intrinsic(*intrinsic, args, span);
        }
        if let Some(host) = any.downcast_ref::<HostFunction>() {
            if self.is_partial() {
                return Err(Halt::NotYet);
            }
            return host.call(args).map_err(|message| {
                fail(FailKind::Raised, format!("`{}` failed: {message}", function.name()), span)
            });
        }
        Err(fail(
            FailKind::NotCallable,
            format!("`{}` cannot be called by this interpreter", function.name()),
            span,
        ))
    }

    fn call_closure(&mut self, closure: &Closure, args: &[Value], span: Span) -> Eval {
        if self.depth >= self.options.max_call_depth {
            return Err(fail(
                FailKind::StackOverflow,
                format!(
                    "call depth of {} exceeded in `{}`",
                    self.options.max_call_depth,
                    closure.name()
                ),
                span,
            ));
        }
        self.depth += 1;
        let result = self.enter_closure(closure, args, span);
        self.depth -= 1;
        result
    }

    fn enter_closure(&mut self, closure: &Closure, args: &[Value], span: Span) -> Eval {
        let func = closure.func();
        if func.params.len() != args.len() {
            return Err(fail(
                FailKind::WrongArity,
                format!(
                    "`{}` takes {} argument(s), got {}",
                    closure.name(),
                    func.params.len(),
                    args.len()
                ),
                span,
            ));
        }

        let frame = closure.env().child();
        for (param, arg) in func.params.iter().zip(args) {
            if let Some(expected) = checkable(param.ty.as_ref()) {
                if !expected.accepts(&arg.shape()) {
                    return Err(fail(
                        FailKind::TypeMismatch,
                        format!(
                            "parameter `{}` of `{}` expects {expected}, got {}",
                            param.name.text,
                            closure.name(),
                            arg.shape()
                        ),
                        span,
                    ));
                }
            }
            let id = binding_of(&param.name)?;
            frame.define(id, Binding::new(Some(arg.clone()), self.lifespan(), false));
        }

        let result = self.block(&func.body, &frame)?;
        if let Some(expected) = checkable(func.ret.as_ref()) {
            if !expected.accepts(&result.shape()) {
                return Err(fail(
                    FailKind::TypeMismatch,
                    format!(
                        "`{}` returns {expected}, got {}",
                        closure.name(),
                        result.shape()
                    ),
                    span,
                ));
            }
        }
        Ok(result)
    }

    fn call_intrinsic(&mut self, intrinsic: Intrinsic, args: &[Value], span: Span) -> Eval {
        if self.is_partial() {
            return Err(Halt::NotYet);
        }
        match (intrinsic, args) {
            (Intrinsic::Promise, []) => Ok(Value::Promise(self.promises.create())),
            (Intrinsic::Resolve, [Value::Promise(id), value]) => {
                Ok(Value::Bool(self.promises.resolve(*id, value.clone())))
            }
            _ => Err(fail(
                FailKind::TypeMismatch,
                format!("`{}` expects {}", intrinsic.name(), intrinsic.shape()),
                span,
            )),
        }
    }

    // =========================================
    // Tasks
    // =========================================

    fn spawn(&mut self, body: &Block, env: &Environment) -> Eval {
        if self.is_partial() {
            return Err(Halt::NotYet);
        }
        let promise = self.promises.create();
        self.promises.park(Task {
            promise,
            body: Arc::new(body.clone()),
            env: env.child(),
            next: 0,
            last: Value::Void,
            waiting: None,
        });
        Ok(Value::Promise(promise))
    }

    fn awaited(&mut self, stmt: &AwaitStmt, env: &Environment) -> Result<PromiseId, Halt> {
        match self.expr(&stmt.promise, env)? {
            Value::Promise(id) => Ok(id),
            other => Err(fail(
                FailKind::TypeMismatch,
                format!("`await` expects a promise, found {}", other.shape()),
                stmt.promise.span,
            )),
        }
    }

    fn bind_awaited(&self, bind: Option<BindingId>, value: Value, env: &Environment) {
        if let Some(id) = bind {
            env.define(id, Binding::new(Some(value), self.lifespan(), false));
        }
    }

    fn await_top_level(&mut self, stmt: &AwaitStmt, env: &Environment) -> Eval {
        if !self.options.allow_top_level_await {
            return Err(fail(
                FailKind::AwaitNotAllowed,
                "top-level `await` is not enabled",
                stmt.span,
            ));
        }
        if self.is_partial() {
            return Err(Halt::NotYet);
        }
        let bind = stmt.bind.as_ref().map(binding_of).transpose()?;
        let promise = self.awaited(stmt, env)?;
        if !self.promises.is_settled(promise) {
            self.drain()?;
        }
        match self.promises.state(promise) {
            Some(PromiseState::Resolved(value)) => {
                self.bind_awaited(bind, value, env);
                Ok(Value::Void)
            }
            Some(PromiseState::Failed(message)) => Err(fail(
                FailKind::Raised,
                format!("awaited promise failed: {message}"),
                stmt.span,
            )),
            Some(PromiseState::Pending) | None => Err(fail(
                FailKind::Raised,
                "awaited promise never settles",
                stmt.span,
            )),
        }
    }

    /// Run parked tasks until none can make progress.
    pub fn drain(&mut self) -> Result<(), Halt> {
        loop {
            let mut runnable = self.promises.take_runnable().into_iter();
            if runnable.len() == 0 {
                return Ok(());
            }
            while let Some(task) = runnable.next() {
                if self.cancel.is_cancelled() {
                    self.promises.park(task);
                    runnable.for_each(|task| self.promises.park(task));
                    return Err(fail(
                        FailKind::Cancelled,
                        "interpretation was cancelled",
                        Span::UNKNOWN,
                    ));
                }
                self.resume(task);
            }
        }
    }

    /// Run `task` until it finishes, fails or parks on a pending promise.
    fn resume(&mut self, mut task: Task) {
        if let Some(waiting) = task.waiting.take() {
            match self.promises.state(waiting.promise) {
                Some(PromiseState::Resolved(value)) => {
                    self.bind_awaited(waiting.bind, value, &task.env);
                    task.last = Value::Void;
                }
                Some(PromiseState::Failed(message)) => {
                    let cause = Fail::new(
                        FailKind::Raised,
                        format!("awaited promise failed: {message}"),
                        waiting.span,
                    );
                    return self.fail_task(&task, cause);
                }
                Some(PromiseState::Pending) | None => {
                    task.waiting = Some(waiting);
                    return self.promises.park(task);
                }
            }
        }

        let body = Arc::clone(&task.body);
        while let Some(stmt) = body.stmts.get(task.next) {
            task.next += 1;
            let outcome = match stmt {
                Stmt::Await(stmt) => match self.await_in_task(stmt, &mut task) {
                    Ok(true) => Ok(Value::Void),
                    Ok(false) => return self.promises.park(task),
                    Err(halt) => Err(halt),
                },
                _ => self.exec(stmt, &task.env),
            };
            match outcome {
                Ok(value) => task.last = value,
                Err(Halt::Fail(cause)) => return self.fail_task(&task, cause),
                Err(Halt::NotYet) => {
                    let cause = Fail::new(FailKind::Raised, "task result is not computable", stmt.span());
                    return self.fail_task(&task, cause);
                }
            }
        }
        self.promises.resolve(task.promise, task.last);
    }

    /// Returns false when the task has to park.
    fn await_in_task(&mut self, stmt: &AwaitStmt, task: &mut Task) -> Result<bool, Halt> {
        let bind = stmt.bind.as_ref().map(binding_of).transpose()?;
        let promise = self.awaited(stmt, &task.env)?;
        match self.promises.state(promise) {
            Some(PromiseState::Resolved(value)) => {
                self.bind_awaited(bind, value, &task.env);
                Ok(true)
            }
            Some(PromiseState::Failed(message)) => Err(fail(
                FailKind::Raised,
                format!("awaited promise failed: {message}"),
                stmt.span,
            )),
            Some(PromiseState::Pending) | None => {
                task.waiting = Some(Waiting {
                    promise,
                    bind,
                    span: stmt.span,
                });
                Ok(false)
            }
        }
    }

    fn fail_task(&self, task: &Task, cause: Fail) {
        let message = cause
            .info
            .as_ref()
            .map_or_else(|| "task failed".to_string(), |info| info.message.clone());
        if let Some(diagnostic) = cause.to_diagnostic() {
            self.log.log(diagnostic);
        }
        tracing::debug!(promise = task.promise.0, %message, "async task failed");
        self.promises.fail(task.promise, message);
    }
}
