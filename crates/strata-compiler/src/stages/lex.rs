use strata_parser::Lexer;

use super::StepContext;
use crate::module::Module;

pub(crate) fn run(module: &mut Module, step: &StepContext<'_>) {
    let language = &step.cx.config.language;
    let tokens = module
        .sources()
        .iter()
        .map(|source| Lexer::tokenize(source, language, step.log))
        .collect();
    module.tokens = tokens;
}
