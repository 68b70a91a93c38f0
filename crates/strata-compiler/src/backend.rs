//! Code generation backends run by the GenerateCode stage.

use strata_core::ModuleName;
use thiserror::Error;

use crate::module::Module;

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub module: ModuleName,
    pub path: String,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("backend `{backend}` failed for module `{module}`: {message}")]
    Failed {
        backend: String,
        module: ModuleName,
        message: String,
    },
}

/// A target backend.
///
/// GenerateCode runs as a barrier, so a backend always sees every module
/// that is still advancing at once.
pub trait CodeGenerator: Send + Sync {
    fn backend_id(&self) -> &str;

    fn generate(&self, modules: &[&Module]) -> Result<Vec<GeneratedFile>, GenerateError>;
}

/// Writes each module's tree as an s-expression.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeDumpBackend;

impl CodeGenerator for TreeDumpBackend {
    fn backend_id(&self) -> &str {
        "tree-dump"
    }

    fn generate(&self, modules: &[&Module]) -> Result<Vec<GeneratedFile>, GenerateError> {
        Ok(modules
            .iter()
            .map(|module| GeneratedFile {
                module: module.name().clone(),
                path: format!("{}.tree", module.name()),
                contents: module.tree().to_string(),
            })
            .collect())
    }
}
