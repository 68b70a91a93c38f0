//! Import resolution.
//!
//! The Import stage turns specifiers into module dependencies and gives each
//! imported name its binding. The exported values are bound later, once every
//! dependency has completed Export: the advancer holds the module back until
//! then and [`bind`] runs at the start of the next stage.

use strata_core::{Binding, Diagnostic, ImportError, Lifespan, LogSink};
use strata_parser::ast::visitor::walk_stmt;
use strata_parser::ast::{Stmt, Visit};

use super::StepContext;
use crate::module::{ImportRecord, Module};

pub(crate) fn run(module: &mut Module, step: &StepContext<'_>) {
    let importer = module.name().clone();
    let mut records = Vec::new();

    for stmt in &mut module.tree.stmts {
        let import = match stmt {
            Stmt::Import(import) => import,
            other => {
                nested_imports(other, step);
                continue;
            }
        };
        let resolved = step
            .cx
            .import_resolver
            .resolve(&importer, &import.specifier, step.modules);
        let error = match resolved {
            Some(dependency) if dependency == importer => ImportError::SelfImport {
                module: importer.clone(),
                span: import.span,
            },
            Some(dependency) => {
                for name in &mut import.names {
                    name.binding.get_or_insert_with(|| module.ids.fresh());
                }
                import.module = Some(dependency.clone());
                records.push(ImportRecord {
                    module: dependency,
                    names: import.names.clone(),
                    span: import.span,
                });
                continue;
            }
            None => ImportError::UnknownModule {
                specifier: import.specifier.clone(),
                span: import.span,
            },
        };
        step.log.log(Diagnostic::error(error.to_string()).at(error.span()));
    }

    tracing::debug!(module = %importer, imports = records.len(), "resolved imports");
    module.imports = records;
}

/// Bind every imported name to the value its module exported.
pub(crate) fn bind(module: &mut Module, step: &StepContext<'_>) {
    if module.imports_bound {
        return;
    }
    module.imports_bound = true;

    for record in &module.imports {
        let exports = step.dependency_exports.get(&record.module);
        for name in &record.names {
            let (Some(id), Some(export)) = (
                name.binding,
                exports.and_then(|e| e.iter().find(|e| e.name.base_name() == &*name.text)),
            ) else {
                let error = ImportError::MissingExport {
                    module: record.module.clone(),
                    name: name.text.to_string(),
                    span: name.span,
                };
                step.log.log(Diagnostic::error(error.to_string()).at(error.span()));
                continue;
            };
            module
                .env
                .define(id, Binding::new(export.value.clone(), Lifespan::Durable, false));
            module.import_shapes.insert(id, export.shape.clone());
            if let Some(ty) = export.as_type() {
                module.import_types.insert(name.text.clone(), ty.clone());
            }
        }
    }
}

fn nested_imports(stmt: &Stmt, step: &StepContext<'_>) {
    struct Finder<'a, 'b>(&'a StepContext<'b>);

    impl Visit for Finder<'_, '_> {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let Stmt::Import(import) = stmt {
                self.0.log.log(
                    Diagnostic::error("imports must appear at the top level of a module")
                        .at(import.span),
                );
            }
            walk_stmt(self, stmt);
        }
    }

    walk_stmt(&mut Finder(step), stmt);
}
