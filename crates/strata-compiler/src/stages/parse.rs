use strata_core::{Diagnostic, LogSink, Span};
use strata_parser::Parser;
use strata_parser::ast::Block;

use super::StepContext;
use crate::module::Module;

/// Parse every token stream and concatenate the results into one tree.
pub(crate) fn run(module: &mut Module, step: &StepContext<'_>) {
    let mut stmts = Vec::new();
    let mut span: Option<Span> = None;
    for tokens in std::mem::take(&mut module.tokens) {
        let (block, errors) = Parser::parse_module(tokens, module.name().clone());
        for error in errors {
            step.log.log(Diagnostic::error(error.to_string()).at(error.span));
        }
        span = Some(span.map_or(block.span, |s| s.merge(block.span)));
        stmts.extend(block.stmts);
    }
    module.tree = Block::new(stmts, span.unwrap_or(Span::UNKNOWN));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata_core::{ModuleName, Stage};

    use crate::module::Module;
    use crate::stages::testing::Bench;

    #[test]
    fn sources_are_concatenated() {
        let bench = Bench::new();
        let mut module = Module::new(
            ModuleName::from("m"),
            vec![Arc::from("let a = 1;"), Arc::from("let b = 2;")],
        );
        assert!(bench.advance_through(&mut module, Stage::Parse));
        assert_eq!(module.tree().len(), 2);
        assert!(module.tokens.is_empty());
    }

    #[test]
    fn syntax_errors_are_logged() {
        let bench = Bench::new();
        let mut module = bench.module("let = 1;");
        assert!(!bench.advance_through(&mut module, Stage::Parse));
        assert_eq!(module.stage(), Some(Stage::Lex));
        assert!(!bench.errors().is_empty());
    }
}
