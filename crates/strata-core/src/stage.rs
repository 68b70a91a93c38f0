//! The fixed, totally ordered sequence of compilation stages.
//!
//! Every module advances through [`Stage::ALL`] one step at a time. Stages
//! after [`Stage::SyntaxMacro`] may assume names are resolved to stable
//! declarations; stages after [`Stage::Import`] may consume the exports of
//! the module's dependencies.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// One phase in the compilation sequence.
///
/// The derived ordering is the stage order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum Stage {
    /// Tokenize source text.
    Lex = 0,
    /// Build a raw tree from tokens.
    Parse = 1,
    /// Resolve `import` declarations into module dependencies.
    Import = 2,
    /// Resolve grammar-level ambiguity into explicit declarations.
    Disambiguate = 3,
    /// Macros that need no type information; hoisting and name resolution.
    SyntaxMacro = 4,
    /// Reify type definitions and desugar pattern matches.
    Define = 5,
    /// First type inference / checking pass.
    Type = 6,
    /// Macros that need type information.
    FunctionMacro = 7,
    /// Publish externally visible symbols.
    Export = 8,
    /// Post-type analyses that only log.
    Query = 9,
    /// Per-target output; only once every module finished [`Stage::Query`].
    GenerateCode = 10,
    /// Post-compilation execution.
    Run = 11,
}

impl Stage {
    /// All stages in order.
    pub const ALL: [Stage; 12] = [
        Stage::Lex,
        Stage::Parse,
        Stage::Import,
        Stage::Disambiguate,
        Stage::SyntaxMacro,
        Stage::Define,
        Stage::Type,
        Stage::FunctionMacro,
        Stage::Export,
        Stage::Query,
        Stage::GenerateCode,
        Stage::Run,
    ];

    pub const fn first() -> Stage {
        Stage::Lex
    }

    pub const fn last() -> Stage {
        Stage::Run
    }

    /// The single character that identifies this stage in traces and snapshot keys.
    pub const fn abbrev(self) -> char {
        match self {
            Stage::Lex => 'L',
            Stage::Parse => 'P',
            Stage::Import => 'I',
            Stage::Disambiguate => 'A',
            Stage::SyntaxMacro => 'S',
            Stage::Define => 'D',
            Stage::Type => 'T',
            Stage::FunctionMacro => 'M',
            Stage::Export => 'E',
            Stage::Query => 'Q',
            Stage::GenerateCode => 'G',
            Stage::Run => 'R',
        }
    }

    /// Look a stage up by its abbreviation.
    pub fn from_abbrev(abbrev: char) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| stage.abbrev() == abbrev)
    }

    /// The stage immediately before this one, or `None` for [`Stage::Lex`].
    pub fn before(self) -> Option<Stage> {
        let index: u8 = self.into();
        index.checked_sub(1).and_then(|i| Stage::try_from(i).ok())
    }

    /// The stage immediately after this one, or `None` for [`Stage::Run`].
    pub fn after(self) -> Option<Stage> {
        let index: u8 = self.into();
        Stage::try_from(index + 1).ok()
    }

    /// The next stage for a module whose last completed stage is `completed`.
    ///
    /// A module that has completed nothing starts at [`Stage::Lex`].
    pub fn after_opt(completed: Option<Stage>) -> Option<Stage> {
        match completed {
            None => Some(Stage::first()),
            Some(stage) => stage.after(),
        }
    }

    /// Whether this stage runs the embedded interpreter against the tree.
    pub const fn is_interpretive(self) -> bool {
        matches!(self, Stage::FunctionMacro | Stage::Export | Stage::Run)
    }

    /// Whether processing this stage may read the exports of dependencies.
    ///
    /// This is the gating predicate: a module may not start such a stage until
    /// every dependency has completed [`Stage::Export`].
    pub fn consumes_imports(self) -> bool {
        self > Stage::Import
    }

    pub const fn name(self) -> &'static str {
        match self {
            Stage::Lex => "Lex",
            Stage::Parse => "Parse",
            Stage::Import => "Import",
            Stage::Disambiguate => "Disambiguate",
            Stage::SyntaxMacro => "SyntaxMacro",
            Stage::Define => "Define",
            Stage::Type => "Type",
            Stage::FunctionMacro => "FunctionMacro",
            Stage::Export => "Export",
            Stage::Query => "Query",
            Stage::GenerateCode => "GenerateCode",
            Stage::Run => "Run",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn ends_have_no_neighbours() {
        assert_eq!(Stage::first().before(), None);
        assert_eq!(Stage::last().after(), None);
    }

    #[test]
    fn abbreviations_are_distinct() {
        let abbrevs: FxHashSet<char> = Stage::ALL.iter().map(|s| s.abbrev()).collect();
        assert_eq!(abbrevs.len(), Stage::ALL.len());
        for stage in Stage::ALL {
            assert_eq!(Stage::from_abbrev(stage.abbrev()), Some(stage));
        }
    }

    #[test]
    fn all_is_sorted() {
        assert!(Stage::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn after_nothing_is_lex() {
        assert_eq!(Stage::after_opt(None), Some(Stage::Lex));
        assert_eq!(Stage::after_opt(Some(Stage::Export)), Some(Stage::Query));
        assert_eq!(Stage::after_opt(Some(Stage::Run)), None);
    }

    #[test]
    fn gating_starts_after_import() {
        assert!(!Stage::Import.consumes_imports());
        assert!(Stage::Disambiguate.consumes_imports());
        assert!(Stage::FunctionMacro.consumes_imports());
    }

    proptest! {
        #[test]
        fn before_after_round_trips(index in 1u8..11) {
            let stage = Stage::try_from(index).unwrap();
            prop_assert_eq!(stage.after().and_then(Stage::before), Some(stage));
            prop_assert_eq!(stage.before().and_then(Stage::after), Some(stage));
        }
    }
}
