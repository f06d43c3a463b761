use crate::{
    error::{Error, Result},
    token::{Token, TokenKind},
};
use peekmore::{PeekMore, PeekMoreIterator};
use phf::phf_map;
use std::str::Chars;
use tracing::debug;

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "class" => TokenKind::Class,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "fun" => TokenKind::Fun,
    "if" => TokenKind::If,
    "nil" => TokenKind::Nil,
    "or" => TokenKind::Or,
    "print" => TokenKind::Print,
    "return" => TokenKind::Return,
    "super" => TokenKind::Super,
    "this" => TokenKind::This,
    "true" => TokenKind::True,
    "var" => TokenKind::Var,
    "while" => TokenKind::While,
};

/// Turns source text into tokens. Lexical errors are yielded in place of
/// the offending token and scanning carries on; the last item is always an
/// `EndOfFile` token.
pub struct Scanner<'a> {
    src: PeekMoreIterator<Chars<'a>>,
    lexeme_buffer: String,
    line: usize,
    reached_end: bool,
}

impl <'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Result<Token>> {
        loop {
            self.lexeme_buffer.clear();

            if self.src.peek().is_none() {
                if self.reached_end {
                    return None
                }
                self.reached_end = true;
                return Some(Ok(Token::new(TokenKind::EndOfFile, "", self.line)))
            }

            if let Some(kind) = self.next_token_kind() {
                let lexeme = self.lexeme_buffer.clone();
                return Some(kind.map(|kind| Token { kind, lexeme, line: self.line }))
            }
        }
    }
}

impl <'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.chars().peekmore(),
            lexeme_buffer: String::new(),
            line: 1,
            reached_end: false,
        }
    }

    pub fn scan_tokens(self) -> Vec<Result<Token>> {
        self.collect()
    }

    // `None` means the characters consumed produce no token (whitespace,
    // comments).
    fn next_token_kind(&mut self) -> Option<Result<TokenKind>> {
        let next_char = self.src.next()?;
        self.lexeme_buffer.push(next_char);

        use TokenKind::*;
        match next_char {
            '(' => Some(Ok(LeftParen)),
            ')' => Some(Ok(RightParen)),
            '{' => Some(Ok(LeftBrace)),
            '}' => Some(Ok(RightBrace)),
            ',' => Some(Ok(Comma)),
            '.' => Some(Ok(Dot)),
            '-' => Some(Ok(Minus)),
            '+' => Some(Ok(Plus)),
            ';' => Some(Ok(Semicolon)),
            '*' => Some(Ok(Star)),
            '!' => Some(Ok(if self.does_next_match('=') { BangEqual } else { Bang })),
            '=' => Some(Ok(if self.does_next_match('=') { EqualEqual } else { Equal })),
            '<' => Some(Ok(if self.does_next_match('=') { LessEqual } else { Less })),
            '>' => Some(Ok(if self.does_next_match('=') { GreaterEqual } else { Greater })),
            '/' => {
                if self.does_next_match('/') { // is this a comment?
                    self.advance_until_match('\n');
                    None
                } else {
                    Some(Ok(Slash))
                }
            },
            ' ' | '\r' | '\t' => None,
            '\n' => {
                self.line += 1;
                None
            },
            '"' => Some(self.extract_string()),
            c if c.is_ascii_digit() => Some(self.extract_number()),
            c if can_start_identifier(&c) => Some(self.extract_identifier()),
            c => {
                debug!(line = self.line, character = ?c, "unexpected character");
                Some(Err(Error::lexical(self.line, "Unexpected character.")))
            },
        }
    }

    fn does_next_match(&mut self, c: char) -> bool {
        match self.src.peek() {
            Some(next) if c == *next => {
                self.lexeme_buffer.push(c);
                self.src.next();
                true
            }
            _ => false,
        }
    }

    fn extract_string(&mut self) -> Result<TokenKind> {
        let mut newline_count = 0;
        self.advance_until_match_for_each('"', |c| if c == '\n' { newline_count += 1 });
        self.line += newline_count;
        match self.src.next() {
            None => Err(Error::lexical(self.line, "Unterminated string.")),
            Some(q) => { // q here must be " due to advance_until_match_for_each
                self.lexeme_buffer.push(q);
                let contents = &self.lexeme_buffer[1..self.lexeme_buffer.len() - 1];
                Ok(TokenKind::String(contents.to_string()))
            },
        }
    }

    fn extract_number(&mut self) -> Result<TokenKind> {
        self.advance_until(|n| !n.is_ascii_digit());

        let has_fraction = self.src.peek() == Some(&'.')
            && self.src.peek_nth(1).map_or(false, |c| c.is_ascii_digit());
        if has_fraction {
            self.lexeme_buffer.push('.');
            self.src.next();
            self.advance_until(|n| !n.is_ascii_digit());
        }

        match self.lexeme_buffer.parse() {
            Err(_) => Err(Error::lexical(
                self.line,
                format!("Could not convert {} into a number.", self.lexeme_buffer)
            )),
            Ok(number) => Ok(TokenKind::Number(number)),
        }
    }

    fn extract_identifier(&mut self) -> Result<TokenKind> {
        self.advance_until(|n| !is_part_of_valid_identifier(n));

        let text = self.lexeme_buffer.as_str();
        Ok(KEYWORDS.get(text).cloned().unwrap_or(TokenKind::Identifier))
    }

    fn advance_until_match(&mut self, c: char) {
        self.advance_until(|n| n == &c)
    }

    fn advance_until(&mut self, should_stop: impl Fn(&char) -> bool) {
        self.advance_until_for_each(should_stop, |_| {})
    }

    fn advance_until_match_for_each(
        &mut self,
        c: char,
        f: impl FnMut(char)
    ) {
        self.advance_until_for_each(|n| n == &c, f);
    }

    fn advance_until_for_each(
        &mut self,
        should_stop: impl Fn(&char) -> bool,
        mut f: impl FnMut(char)
    ) {
        while let Some(next) = self.src.peek().copied() {
            if should_stop(&next) { break }
            self.src.next();
            self.lexeme_buffer.push(next);
            f(next);
        }
    }
}

fn can_start_identifier(c: &char) -> bool {
    c.is_ascii_alphabetic() || c == &'_'
}

fn is_part_of_valid_identifier(c: &char) -> bool {
    can_start_identifier(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::new(src)
            .map(|t| t.map(|t| t.kind))
            .collect::<Result<_>>()
            .expect("source should scan cleanly")
    }

    #[test]
    fn single_character_tokens() {
        use TokenKind::*;
        assert_eq!(
            vec![LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot,
                 Minus, Plus, Semicolon, Star, Slash, EndOfFile],
            kinds("(){},.-+;*/")
        );
    }

    #[test]
    fn multi_character_operators_use_maximal_munch() {
        use TokenKind::*;
        assert_eq!(
            vec![BangEqual, EqualEqual, LessEqual, GreaterEqual, EndOfFile],
            kinds("!= == <= >=")
        );
        assert_eq!(
            vec![Bang, BangEqual, Equal, EqualEqual, Less, LessEqual,
                 Greater, GreaterEqual, EndOfFile],
            kinds("! != = == < <= > >=")
        );
    }

    #[test]
    fn numbers_are_stored_as_floats() -> Result<()> {
        let tokens = Scanner::new("123 45.67").collect::<Result<Vec<_>>>()?;
        assert_eq!(TokenKind::Number(123.0), tokens[0].kind);
        assert_eq!("123", tokens[0].lexeme);
        assert_eq!(TokenKind::Number(45.67), tokens[1].kind);
        assert_eq!("45.67", tokens[1].lexeme);
        Ok(())
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() {
        use TokenKind::*;
        assert_eq!(vec![Number(1.0), Dot, EndOfFile], kinds("1."));
        assert_eq!(vec![Dot, Number(5.0), EndOfFile], kinds(".5"));
        assert_eq!(vec![Number(1.0), Dot, Identifier, EndOfFile], kinds("1.x"));
    }

    #[test]
    fn strings_keep_their_contents_and_quoted_lexeme() -> Result<()> {
        let tokens = Scanner::new("\"lox\" \"hello world\"").collect::<Result<Vec<_>>>()?;
        assert_eq!(TokenKind::String("lox".into()), tokens[0].kind);
        assert_eq!("\"lox\"", tokens[0].lexeme);
        assert_eq!(TokenKind::String("hello world".into()), tokens[1].kind);
        Ok(())
    }

    #[test]
    fn multi_line_strings_advance_the_line_counter() -> Result<()> {
        let tokens = Scanner::new("\"a\nb\" x").collect::<Result<Vec<_>>>()?;
        assert_eq!(TokenKind::String("a\nb".into()), tokens[0].kind);
        assert_eq!(2, tokens[1].line);
        Ok(())
    }

    #[test]
    fn identifiers_and_keywords() {
        use TokenKind::*;
        assert_eq!(
            vec![Var, Identifier, Equal, Identifier, Print, Identifier, EndOfFile],
            kinds("var language = lox print language")
        );
        assert_eq!(vec![Identifier, Identifier, EndOfFile], kinds("_under orchid"));
    }

    #[test]
    fn comments_run_to_end_of_line() -> Result<()> {
        let tokens = Scanner::new("// this is a comment\n123").collect::<Result<Vec<_>>>()?;
        assert_eq!(2, tokens.len());
        assert_eq!(TokenKind::Number(123.0), tokens[0].kind);
        assert_eq!(2, tokens[0].line);
        assert!(tokens[1].is_eof());
        Ok(())
    }

    #[test]
    fn unexpected_characters_are_reported_and_skipped() {
        let results = Scanner::new("1 @ 2").scan_tokens();
        assert_eq!(4, results.len());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!("[line 1] Error: Unexpected character.", err.to_string());
        assert_eq!(TokenKind::Number(2.0), results[2].as_ref().unwrap().kind);
        assert!(results[3].as_ref().unwrap().is_eof());
    }

    #[test]
    fn unterminated_string_is_reported_at_end_of_input() {
        let results = Scanner::new("print \"oops\n").scan_tokens();
        assert_eq!(3, results.len());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!("[line 2] Error: Unterminated string.", err.to_string());
        let eof = results[2].as_ref().unwrap();
        assert!(eof.is_eof());
        assert_eq!(2, eof.line);
    }

    #[test]
    fn eof_carries_last_line() {
        let tokens: Vec<_> = Scanner::new("a\nb\n").map(|t| t.unwrap()).collect();
        assert_eq!(3, tokens.last().unwrap().line);
    }
}
