//! Recursive-descent parser over the grammar expression token stream.
//!
//! The builder is threaded through the parse: every construct maps to
//! one builder call, so the textual and programmatic front ends cannot
//! drift apart.
//!
//! ```text
//! expression := term+
//! term       := '#' WORD | WORD modifier? | '(' expression ('|' expression)* ')' modifier?
//! modifier   := '*' | '+' | '?'
//! ```

use typeweave_core::{FluentBuilder, Modifier, Node};

use crate::error::SyntaxError;
use crate::lexer::{lex, Token};

/// Parse a grammar expression and append its nodes to the builder.
pub fn apply(builder: FluentBuilder, src: &str) -> Result<FluentBuilder, SyntaxError> {
    let tokens = lex(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let builder = parser.sequence(builder, false)?;
    if parser.peek() != &Token::Eof {
        return Err(SyntaxError::TrailingInput);
    }
    Ok(builder)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // The lexer always appends Eof, so the token list is never empty and
    // the cursor can safely saturate on the last token.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn sequence(
        &mut self,
        mut builder: FluentBuilder,
        in_group: bool,
    ) -> Result<FluentBuilder, SyntaxError> {
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::RParen | Token::Pipe if in_group => break,
                Token::RParen | Token::Pipe => {
                    return Err(SyntaxError::UnexpectedToken {
                        token: describe(self.peek()),
                    });
                }
                _ => builder = self.term(builder)?,
            }
        }
        Ok(builder)
    }

    fn term(&mut self, builder: FluentBuilder) -> Result<FluentBuilder, SyntaxError> {
        match self.advance() {
            Token::Hash => match self.advance() {
                Token::Word(label) => Ok(builder.name(&label)),
                _ => Err(SyntaxError::MissingName),
            },
            Token::Word(word) => match self.take_modifier() {
                Some(Token::Star) => Ok(builder.zero_or_more(&word)?),
                Some(Token::Plus) => Ok(builder.one_or_more(&word)?),
                Some(Token::Question) => Ok(builder.optional(&word)?),
                _ => Ok(builder.one(&word)?),
            },
            Token::LParen => self.group(builder),
            other => Err(SyntaxError::UnexpectedToken {
                token: describe(&other),
            }),
        }
    }

    fn take_modifier(&mut self) -> Option<Token> {
        match self.peek() {
            Token::Star | Token::Plus | Token::Question => Some(self.advance()),
            _ => None,
        }
    }

    /// `(` has been consumed. Parse the alternatives, close the group,
    /// and attach it to the enclosing builder under its modifier.
    fn group(&mut self, builder: FluentBuilder) -> Result<FluentBuilder, SyntaxError> {
        let mut alternatives = vec![self.sequence(builder.sub(), true)?];
        while self.peek() == &Token::Pipe {
            self.advance();
            alternatives.push(self.sequence(builder.sub(), true)?);
        }
        if self.advance() != Token::RParen {
            return Err(SyntaxError::UnbalancedParen);
        }
        if alternatives.iter().any(|alt| alt.nodes().is_empty()) {
            return Err(SyntaxError::EmptyGroup);
        }

        let group = if alternatives.len() == 1 {
            let mut alternatives = alternatives;
            alternatives.remove(0)
        } else if alternatives.iter().all(is_single_bare_call) {
            // A choice among plain calls uses the one-terminal form, the
            // same shortcut the programmatic API takes.
            let words: Vec<String> = alternatives
                .iter()
                .filter_map(|alt| bare_call(alt).map(str::to_string))
                .collect();
            let refs: Vec<&str> = words.iter().map(String::as_str).collect();
            builder.sub().one_of(&refs)?
        } else {
            builder.sub().one_of_subs(alternatives)?
        };

        match self.take_modifier() {
            Some(Token::Star) => Ok(builder.zero_or_more_sub(group)?),
            Some(Token::Plus) => Ok(builder.one_or_more_sub(group)?),
            Some(Token::Question) => Ok(builder.optional_sub(group)?),
            _ => Ok(builder.one_sub(group)?),
        }
    }
}

fn is_single_bare_call(alt: &FluentBuilder) -> bool {
    bare_call(alt).is_some()
}

/// The call name, if the alternative is exactly one unnamed once-call.
fn bare_call(alt: &FluentBuilder) -> Option<&str> {
    match alt.nodes() {
        [Node::Terminal(t)] if t.modifier == Modifier::Once && t.name.is_none() => {
            Some(t.method.as_str())
        }
        _ => None,
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Word(w) => w.clone(),
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
        Token::Pipe => "|".to_string(),
        Token::Star => "*".to_string(),
        Token::Plus => "+".to_string(),
        Token::Question => "?".to_string(),
        Token::Hash => "#".to_string(),
        Token::Eof => "end of expression".to_string(),
    }
}
