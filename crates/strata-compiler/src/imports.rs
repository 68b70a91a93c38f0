use strata_core::ModuleName;

/// Maps an import specifier to a module in the advancing set.
pub trait ImportResolver: Send + Sync {
    fn resolve(
        &self,
        importer: &ModuleName,
        specifier: &str,
        modules: &[ModuleName],
    ) -> Option<ModuleName>;
}

/// Matches specifiers against module names, ignoring a leading `./`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleNameResolver;

impl ImportResolver for ModuleNameResolver {
    fn resolve(
        &self,
        _importer: &ModuleName,
        specifier: &str,
        modules: &[ModuleName],
    ) -> Option<ModuleName> {
        let wanted = specifier.strip_prefix("./").unwrap_or(specifier);
        modules.iter().find(|m| m.as_str() == wanted).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_by_name() {
        let modules = [ModuleName::from("lib"), ModuleName::from("app")];
        let importer = ModuleName::from("app");
        assert_eq!(
            ModuleNameResolver.resolve(&importer, "./lib", &modules),
            Some(ModuleName::from("lib"))
        );
        assert_eq!(ModuleNameResolver.resolve(&importer, "nope", &modules), None);
    }
}
