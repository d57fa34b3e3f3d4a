use logos::{Logos, SpannedIter};

use crate::error::Span;

#[derive(Clone, Debug)]
pub(super) struct Token {
    pub(super) kind: TokenKind,
    /// Full lexeme, including the quotes or asterisks of delimited tokens
    pub(super) span: Span,
}

impl Token {
    /// Span of the token contents without delimiters
    pub(super) fn inner(&self) -> Span {
        match self.kind {
            TokenKind::Keyword | TokenKind::Quoted => (self.span.start + 1)..(self.span.end - 1),
            _ => self.span.clone(),
        }
    }
}

pub(super) struct TokenIter<'a> {
    iter: SpannedIter<'a, LogosTokenKind>,
}

impl<'a> TokenIter<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            iter: LogosTokenKind::lexer(input).spanned(),
        }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next() {
            Some((Ok(kind), span)) => {
                let kind = match kind {
                    LogosTokenKind::Keyword => TokenKind::Keyword,
                    LogosTokenKind::QuotedString => TokenKind::Quoted,
                    LogosTokenKind::Word | LogosTokenKind::UnterminatedQuote => TokenKind::Word,
                    LogosTokenKind::Newline => TokenKind::Newline,
                    LogosTokenKind::WS => unreachable!(),
                };
                Some(Token { kind, span })
            }
            // Every run of non-blank characters is a word, so the lexer has no
            // failing input; keep the bytes as a word all the same.
            Some((Err(_), span)) => Some(Token {
                kind: TokenKind::Word,
                span,
            }),
            None => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TokenKind {
    /// `*END*`, `*REMARK*` and the format line
    Keyword,
    Quoted,
    Word,
    Newline,
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[regex(r"\*[A-Za-z0-9_\-\.]+\*")]
    Keyword,
    #[regex(r#""[^"\r\n]*""#)]
    QuotedString,
    /// A quote that is never closed runs to the end of the line
    #[regex(r#""[^"\r\n]*"#, priority = 3)]
    UnterminatedQuote,
    #[regex(r"[^ \t\r\n\f]+")]
    Word,
    #[regex(r"\r?\n")]
    Newline,
    #[regex(r"[ \t\r\f]+", logos::skip)]
    WS,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<(TokenKind, &str)> {
        TokenIter::new(input)
            .map(|token| (token.kind, &input[token.inner()]))
            .collect()
    }

    #[test]
    fn test() {
        let input = "*END*\n\"Mouser Part Number\" 579-24LC256-I/SN\r\n1 0 U A0";
        let expected = vec![
            (TokenKind::Keyword, "END"),
            (TokenKind::Newline, "\n"),
            (TokenKind::Quoted, "Mouser Part Number"),
            (TokenKind::Word, "579-24LC256-I/SN"),
            (TokenKind::Newline, "\r\n"),
            (TokenKind::Word, "1"),
            (TokenKind::Word, "0"),
            (TokenKind::Word, "U"),
            (TokenKind::Word, "A0"),
        ];

        assert_eq!(lex(input), expected);
    }

    #[test]
    fn unterminated_quote_is_a_word() {
        assert_eq!(
            lex("0.5in \"thin film resistor"),
            vec![
                (TokenKind::Word, "0.5in"),
                (TokenKind::Word, "\"thin film resistor")
            ]
        );
        assert_eq!(
            lex("\"abc def\r\n1"),
            vec![
                (TokenKind::Word, "\"abc def"),
                (TokenKind::Newline, "\r\n"),
                (TokenKind::Word, "1")
            ]
        );
    }

    #[test]
    fn closed_quote_followed_by_text() {
        assert_eq!(
            lex("\"a b\"c \"x\"y"),
            vec![
                (TokenKind::Quoted, "a b"),
                (TokenKind::Word, "c"),
                (TokenKind::Word, "\"x\"y")
            ]
        );
    }

    #[test]
    fn unusual_characters_are_words() {
        let input = "* *a \u{b}x \u{3a9}5% ** \"";
        assert_eq!(
            lex(input),
            vec![
                (TokenKind::Word, "*"),
                (TokenKind::Word, "*a"),
                (TokenKind::Word, "\u{b}x"),
                (TokenKind::Word, "\u{3a9}5%"),
                (TokenKind::Word, "**"),
                (TokenKind::Word, "\""),
            ]
        );
    }

    #[test]
    fn urls_are_single_words() {
        let input = "https://www.arrow.com/en/products/24lc256-isn/microchip-technology?x=1&y=*";
        assert_eq!(lex(input), vec![(TokenKind::Word, input)]);
    }

    #[test]
    fn quoted_empty_string() {
        assert_eq!(lex("\"\""), vec![(TokenKind::Quoted, "")]);
    }
}
