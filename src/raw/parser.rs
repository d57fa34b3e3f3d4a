use std::iter::Peekable;

use tracing::{debug, trace};

use crate::error::{ParseError, Span};

use super::{
    lexer::{Token, TokenIter, TokenKind},
    Gate, Library, PartType, Pin, Remark, SignalPin,
};

/// The tokens of one input line, without the line break
struct Line {
    tokens: Vec<Token>,
    /// Start of the line break for blank lines
    span: Span,
}

impl Line {
    fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }

    fn first_kind(&self) -> Option<TokenKind> {
        self.tokens.first().map(|tok| tok.kind)
    }
}

struct LineIter<'a> {
    iter: TokenIter<'a>,
}

impl<'a> Iterator for LineIter<'a> {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            match self.iter.next() {
                Some(Token {
                    kind: TokenKind::Newline,
                    span,
                }) => {
                    let span = match (tokens.first(), tokens.last()) {
                        (Some(first), Some(last)) => first.span.start..last.span.end,
                        _ => span.start..span.start,
                    };
                    break Some(Line { tokens, span });
                }
                Some(tok) => tokens.push(tok),
                None if tokens.is_empty() => break None,
                None => {
                    let span = tokens[0].span.start..tokens[tokens.len() - 1].span.end;
                    break Some(Line { tokens, span });
                }
            }
        }
    }
}

pub(super) struct Parser<'a> {
    input: &'a str,
    lines: Peekable<LineIter<'a>>,
}

impl<'a> Parser<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            input,
            lines: LineIter {
                iter: TokenIter::new(input),
            }
            .peekable(),
        }
    }

    fn text(&self, tok: &Token) -> &'a str {
        &self.input[tok.inner()]
    }

    fn eof(&self) -> Span {
        let end = self.input.len();
        end..end
    }

    fn line_ending(&self) -> &'static str {
        match self.input.find('\n') {
            Some(nl) if self.input[..nl].ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }

    fn get(&mut self) -> Result<Line, ParseError> {
        self.lines
            .next()
            .ok_or_else(|| ParseError::UnexpectedEof { at: self.eof() })
    }

    fn peek(&mut self) -> Option<&Line> {
        self.lines.peek()
    }

    /// Whether the next line starts with the bare word `word`
    fn peek_word(&mut self, word: &str) -> bool {
        let input = self.input;
        match self.lines.peek() {
            Some(line) => matches!(
                line.tokens.first(),
                Some(tok) if tok.kind == TokenKind::Word && &input[tok.span.clone()] == word
            ),
            None => false,
        }
    }

    /// Whether the next line starts with the keyword `*keyword*`
    fn peek_keyword(&mut self, keyword: &str) -> bool {
        let input = self.input;
        match self.lines.peek() {
            Some(line) => matches!(
                line.tokens.first(),
                Some(tok) if tok.kind == TokenKind::Keyword && &input[tok.inner()] == keyword
            ),
            None => false,
        }
    }

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(Line::is_blank) {
            self.lines.next();
        }
    }

    fn describe(&self, line: &Line) -> String {
        match line.tokens.first() {
            Some(tok) => format!("'{}'", &self.input[tok.span.clone()]),
            None => "blank line".to_owned(),
        }
    }

    fn unexpected(&self, expected: &str, line: &Line) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_owned(),
            found: self.describe(line),
            at: line.span.clone(),
        }
    }

    fn fields(
        &self,
        line: &Line,
        what: &'static str,
        expected: &'static str,
        range: std::ops::RangeInclusive<usize>,
    ) -> Result<Vec<&'a str>, ParseError> {
        if !range.contains(&line.tokens.len()) {
            return Err(ParseError::FieldCount {
                what,
                expected,
                found: line.tokens.len(),
                at: line.span.clone(),
            });
        }
        Ok(line.tokens.iter().map(|tok| self.text(tok)).collect())
    }

    fn parse_library(&mut self) -> Result<Library<'a>, ParseError> {
        let line_ending = self.line_ending();
        self.skip_blank();

        let mut format = None;
        if let Some(Some(TokenKind::Keyword)) = self.peek().map(Line::first_kind) {
            if !self.peek_keyword("END") && !self.peek_keyword("REMARK") {
                let line = self.get()?;
                if line.tokens.len() != 1 {
                    return Err(self.unexpected("line break after format line", &line));
                }
                format = Some(self.text(&line.tokens[0]));
            }
        }

        let mut parts = Vec::new();
        loop {
            self.skip_blank();
            if self.peek().is_none() {
                return Err(ParseError::MissingEnd { at: self.eof() });
            }
            if self.peek_keyword("REMARK") {
                let line = self.get()?;
                return Err(ParseError::MissingEnd { at: line.span });
            }
            if self.peek_keyword("END") {
                let line = self.get()?;
                if line.tokens.len() != 1 {
                    return Err(self.unexpected("line break after *END*", &line));
                }
                break;
            }
            let line = self.get()?;
            if line.first_kind() != Some(TokenKind::Word) {
                return Err(self.unexpected("part type header or *END*", &line));
            }
            parts.push(self.parse_part(line)?);
        }

        self.skip_blank();
        let remark = self.parse_remark()?;

        debug!(parts = parts.len(), "parsed part type library");
        Ok(Library {
            format,
            parts,
            remark,
            line_ending,
        })
    }

    fn parse_part(&mut self, header: Line) -> Result<PartType<'a>, ParseError> {
        let fields = self.fields(&header, "part type header", "7 to 9", 7..=9)?;
        let name = fields[0];
        trace!(name, "parsing part type");

        let mut timestamp = None;
        if self.peek_word("TIMESTAMP") {
            let line = self.get()?;
            let fields = self.fields(&line, "TIMESTAMP line", "2", 2..=2)?;
            timestamp = Some((fields[1], line.span.clone()));
        }

        let mut attributes = Vec::new();
        while let Some(Some(TokenKind::Quoted)) = self.peek().map(Line::first_kind) {
            let line = self.get()?;
            let key = self.text(&line.tokens[0]);
            let value = match (line.tokens.get(1), line.tokens.last()) {
                (Some(first), Some(last)) => &self.input[first.span.start..last.span.end],
                _ => "",
            };
            attributes.push((key, value));
        }

        let mut gates = Vec::new();
        while self.peek_word("GATE") {
            let line = self.get()?;
            gates.push(self.parse_gate(line)?);
        }
        if gates.is_empty() {
            let line = self.get()?;
            return Err(self.unexpected("GATE", &line));
        }

        let mut signal_pins = Vec::new();
        while self.peek_word("SIGPIN") {
            let line = self.get()?;
            let fields = self.fields(&line, "SIGPIN line", "4", 4..=4)?;
            signal_pins.push(SignalPin {
                num: fields[1],
                width: fields[2],
                signal: fields[3],
                span: line.span.clone(),
            });
        }

        let ends_part = match self.peek() {
            None => true,
            Some(line) => line.is_blank() || line.first_kind() == Some(TokenKind::Keyword),
        };
        if !ends_part {
            let line = self.get()?;
            return Err(self.unexpected("blank line, GATE, SIGPIN or *END*", &line));
        }

        Ok(PartType {
            name,
            decals: fields[1],
            units: fields[2],
            logic_family: fields[3],
            counts: fields[4..].to_vec(),
            timestamp,
            attributes,
            gates,
            signal_pins,
            span: header.span,
        })
    }

    fn parse_gate(&mut self, line: Line) -> Result<Gate<'a>, ParseError> {
        let fields = self.fields(&line, "GATE line", "4", 4..=4)?;

        let mut decals = Vec::new();
        while let Some(line) = self.peek() {
            if line.tokens.len() != 1 || line.first_kind() != Some(TokenKind::Word) {
                break;
            }
            let line = self.get()?;
            decals.push(self.text(&line.tokens[0]));
        }

        let mut pins = Vec::new();
        loop {
            let ends_gate = match self.peek() {
                None => true,
                Some(line) => line.is_blank() || line.first_kind() != Some(TokenKind::Word),
            };
            if ends_gate || self.peek_word("GATE") || self.peek_word("SIGPIN") {
                break;
            }
            let line = self.get()?;
            let fields = self.fields(&line, "pin line", "4", 4..=4)?;
            pins.push(Pin {
                num: fields[0],
                group: fields[1],
                typ: fields[2],
                name: fields[3],
                span: line.span.clone(),
            });
        }

        Ok(Gate {
            decal_count: fields[1],
            pin_count: fields[2],
            swap: fields[3],
            decals,
            pins,
            span: line.span,
        })
    }

    fn parse_remark(&mut self) -> Result<Option<Remark<'a>>, ParseError> {
        if self.peek().is_none() {
            return Ok(None);
        }
        let line = self.get()?;
        if !(line.first_kind() == Some(TokenKind::Keyword)
            && self.text(&line.tokens[0]) == "REMARK")
        {
            return Err(ParseError::TrailingContent { at: line.span });
        }
        // The trailer is free text; take it from the input rather than the tokens
        let rest = &self.input[line.span.end..];
        let (tail, rest) = match rest.find('\n') {
            Some(nl) => (&rest[..nl], &rest[nl + 1..]),
            None => (rest, ""),
        };
        let line_end = line.span.end + tail.strip_suffix('\r').unwrap_or(tail).len();
        let text = match line.tokens.get(1) {
            Some(first) => &self.input[first.span.start..line_end],
            None => "",
        };

        let mut lines: Vec<&'a str> = rest
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        Ok(Some(Remark { text, lines }))
    }
}

impl<'a> TryFrom<&'a str> for Library<'a> {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        let mut parser = Parser::new(input);
        parser.parse_library()
    }
}
