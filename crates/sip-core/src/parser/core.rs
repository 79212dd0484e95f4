//! Recursive-descent helpers shared by every field grammar.

use crate::error::{Error, LexicalError, Result};
use crate::lexer::{Lexer, TokenClass};
use crate::types::name_value::NameValue;

/// Common parsing operations over a borrowed [`Lexer`].
///
/// Grammars implement [`ParserCore::lexer`] and get the shared helpers for
/// free. A parser owns its lexer and is not reentrant.
pub trait ParserCore {
    fn lexer(&mut self) -> &mut Lexer;

    /// Parses `name`, `name<sep>value` or `name<sep>"quoted value"`.
    ///
    /// A missing name is an error. A value that cannot be read degrades to
    /// a valueless parameter; the cursor stays where the failed read stopped.
    fn name_value(&mut self, separator: char) -> Result<NameValue> {
        let lexer = self.lexer();
        let name = lexer.match_token(TokenClass::Id)?.text;
        lexer.sp_or_ht();
        if lexer.look_ahead(0) != separator {
            return Ok(NameValue::flag(name));
        }
        lexer.consume(1);
        lexer.sp_or_ht();

        let value = if lexer.look_ahead(0) == '"' {
            lexer.quoted_string().map(|v| (v, true))
        } else {
            lexer.match_token(TokenClass::Id).map(|t| (t.text, false))
        };

        match value {
            Ok((value, quoted)) => Ok(NameValue {
                name,
                value: Some(value),
                quoted,
                separator,
            }),
            Err(err) => {
                tracing::trace!(parameter = %name, error = %err, "parameter value unreadable, keeping bare name");
                Ok(NameValue {
                    separator,
                    ..NameValue::flag(name)
                })
            }
        }
    }

    /// Consumes `c` or fails with a lexical error.
    fn expect_char(&mut self, c: char) -> Result<()> {
        self.lexer().match_token(TokenClass::Char(c))?;
        Ok(())
    }

    fn skip_ws(&mut self) {
        self.lexer().sp_or_ht();
    }

    /// Lexical error at the current offset.
    fn lexical_error(&mut self, message: &str) -> LexicalError {
        self.lexer().error(message)
    }

    /// Grammar error for `field` at the current offset.
    fn grammar_error(&mut self, field: &str, message: &str) -> Error {
        let position = self.lexer().position();
        Error::grammar_at(field, message, position)
    }

    /// Fails unless the whole input has been consumed.
    fn expect_end(&mut self, field: &str) -> Result<()> {
        let lexer = self.lexer();
        lexer.sp_or_ht();
        if lexer.has_more_chars() {
            let rest = lexer.rest();
            return Err(self.grammar_error(field, &format!("unexpected trailing input \"{}\"", rest)));
        }
        Ok(())
    }
}

/// Minimal parser over a lexer, used where no grammar-specific state is needed.
#[derive(Debug, Clone)]
pub struct CoreParser {
    lexer: Lexer,
}

impl CoreParser {
    pub fn new(lexer: Lexer) -> Self {
        CoreParser { lexer }
    }

    pub fn into_lexer(self) -> Lexer {
        self.lexer
    }
}

impl ParserCore for CoreParser {
    fn lexer(&mut self) -> &mut Lexer {
        &mut self.lexer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexerMode;

    fn parser(input: &str) -> CoreParser {
        CoreParser::new(Lexer::new(LexerMode::SipUrl, input))
    }

    #[test]
    fn test_bare_name_has_no_value() {
        let nv = parser("foo").name_value('=').unwrap();
        assert_eq!(nv.name, "foo");
        assert_eq!(nv.value, None);
        assert!(!nv.quoted);
    }

    #[test]
    fn test_quoted_value_sets_flag() {
        let nv = parser("foo=\"bar baz\"").name_value('=').unwrap();
        assert_eq!(nv.value.as_deref(), Some("bar baz"));
        assert!(nv.quoted);
    }

    #[test]
    fn test_token_value() {
        let mut p = parser("transport = tcp;lr");
        let nv = p.name_value('=').unwrap();
        assert_eq!(nv.value.as_deref(), Some("tcp"));
        assert_eq!(p.lexer().look_ahead(0), ';');
    }

    #[test]
    fn test_malformed_value_degrades_to_flag() {
        let mut p = parser("foo=@bar");
        let nv = p.name_value('=').unwrap();
        assert_eq!(nv.name, "foo");
        assert_eq!(nv.value, None);
        // cursor stays after the separator
        assert_eq!(p.lexer().position(), 4);

        let nv = parser("foo=\"unterminated").name_value('=').unwrap();
        assert_eq!(nv.value, None);
    }

    #[test]
    fn test_missing_name_is_error() {
        assert!(parser("=value").name_value('=').is_err());
    }

    #[test]
    fn test_expect_end() {
        let mut p = parser("abc");
        p.lexer().ttoken();
        assert!(p.expect_end("x").is_ok());

        let mut p = parser("abc def");
        p.lexer().ttoken();
        assert!(matches!(p.expect_end("x"), Err(Error::Grammar { .. })));
    }
}
