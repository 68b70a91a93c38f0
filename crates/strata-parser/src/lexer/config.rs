/// Lexer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Accept non-ASCII letters in identifiers.
    pub allow_unicode_identifiers: bool,
    /// Longest identifier accepted, in bytes.
    pub max_identifier_len: usize,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            allow_unicode_identifiers: false,
            max_identifier_len: 255,
        }
    }
}

impl LanguageConfig {
    pub fn with_unicode_identifiers(mut self, allow: bool) -> Self {
        self.allow_unicode_identifiers = allow;
        self
    }

    pub fn with_max_identifier_len(mut self, max: usize) -> Self {
        self.max_identifier_len = max;
        self
    }
}
