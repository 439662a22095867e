//! Lexical analysis of modelling-language source.

use crate::ParseError;
use core::fmt;
use primitives::Unit;
use std::{string::String, vec::Vec};

/// A reserved word of the language.
///
/// Unit spellings are reserved words too; the parser maps them back to
/// [`Unit`] where a unit annotation is expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum Keyword {
    About,
    Across,
    Application,
    As,
    Beginning,
    By,
    Cap,
    Change,
    Charge,
    Default,
    Define,
    Displacing,
    During,
    Else,
    Emit,
    Enable,
    End,
    Endif,
    Equals,
    Floor,
    For,
    From,
    If,
    Initial,
    Kg,
    Kwh,
    Limit,
    Mean,
    Modify,
    Mt,
    Normally,
    Of,
    Onwards,
    Policy,
    Recharge,
    Recover,
    Replace,
    Retire,
    Reuse,
    Sample,
    Set,
    Simulate,
    Simulations,
    Start,
    Std,
    Substance,
    Tco2e,
    Then,
    To,
    Trial,
    Trials,
    Uniformly,
    Unit,
    Units,
    Using,
    With,
    Year,
    Years,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf::phf_map! {
    "about" => Keyword::About,
    "across" => Keyword::Across,
    "application" => Keyword::Application,
    "as" => Keyword::As,
    "beginning" => Keyword::Beginning,
    "by" => Keyword::By,
    "cap" => Keyword::Cap,
    "change" => Keyword::Change,
    "charge" => Keyword::Charge,
    "default" => Keyword::Default,
    "define" => Keyword::Define,
    "displacing" => Keyword::Displacing,
    "during" => Keyword::During,
    "else" => Keyword::Else,
    "emit" => Keyword::Emit,
    "enable" => Keyword::Enable,
    "end" => Keyword::End,
    "endif" => Keyword::Endif,
    "equals" => Keyword::Equals,
    "floor" => Keyword::Floor,
    "for" => Keyword::For,
    "from" => Keyword::From,
    "if" => Keyword::If,
    "initial" => Keyword::Initial,
    "kg" => Keyword::Kg,
    "kwh" => Keyword::Kwh,
    "limit" => Keyword::Limit,
    "mean" => Keyword::Mean,
    "modify" => Keyword::Modify,
    "mt" => Keyword::Mt,
    "normally" => Keyword::Normally,
    "of" => Keyword::Of,
    "onwards" => Keyword::Onwards,
    "policy" => Keyword::Policy,
    "recharge" => Keyword::Recharge,
    "recover" => Keyword::Recover,
    "replace" => Keyword::Replace,
    "retire" => Keyword::Retire,
    "reuse" => Keyword::Reuse,
    "sample" => Keyword::Sample,
    "set" => Keyword::Set,
    "simulate" => Keyword::Simulate,
    "simulations" => Keyword::Simulations,
    "start" => Keyword::Start,
    "std" => Keyword::Std,
    "substance" => Keyword::Substance,
    "tCO2e" => Keyword::Tco2e,
    "then" => Keyword::Then,
    "to" => Keyword::To,
    "trial" => Keyword::Trial,
    "trials" => Keyword::Trials,
    "uniformly" => Keyword::Uniformly,
    "unit" => Keyword::Unit,
    "units" => Keyword::Units,
    "using" => Keyword::Using,
    "with" => Keyword::With,
    "year" => Keyword::Year,
    "years" => Keyword::Years,
};

impl Keyword {
    /// Looks a word up in the keyword table.
    #[inline]
    pub fn parse(word: &str) -> Option<Self> {
        KEYWORDS.get(word).copied()
    }

    /// The source spelling of the keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::About => "about",
            Self::Across => "across",
            Self::Application => "application",
            Self::As => "as",
            Self::Beginning => "beginning",
            Self::By => "by",
            Self::Cap => "cap",
            Self::Change => "change",
            Self::Charge => "charge",
            Self::Default => "default",
            Self::Define => "define",
            Self::Displacing => "displacing",
            Self::During => "during",
            Self::Else => "else",
            Self::Emit => "emit",
            Self::Enable => "enable",
            Self::End => "end",
            Self::Endif => "endif",
            Self::Equals => "equals",
            Self::Floor => "floor",
            Self::For => "for",
            Self::From => "from",
            Self::If => "if",
            Self::Initial => "initial",
            Self::Kg => "kg",
            Self::Kwh => "kwh",
            Self::Limit => "limit",
            Self::Mean => "mean",
            Self::Modify => "modify",
            Self::Mt => "mt",
            Self::Normally => "normally",
            Self::Of => "of",
            Self::Onwards => "onwards",
            Self::Policy => "policy",
            Self::Recharge => "recharge",
            Self::Recover => "recover",
            Self::Replace => "replace",
            Self::Retire => "retire",
            Self::Reuse => "reuse",
            Self::Sample => "sample",
            Self::Set => "set",
            Self::Simulate => "simulate",
            Self::Simulations => "simulations",
            Self::Start => "start",
            Self::Std => "std",
            Self::Substance => "substance",
            Self::Tco2e => "tCO2e",
            Self::Then => "then",
            Self::To => "to",
            Self::Trial => "trial",
            Self::Trials => "trials",
            Self::Uniformly => "uniformly",
            Self::Unit => "unit",
            Self::Units => "units",
            Self::Using => "using",
            Self::With => "with",
            Self::Year => "year",
            Self::Years => "years",
        }
    }

    /// The unit this keyword spells, if it is a unit word.
    #[inline]
    pub const fn as_unit(self) -> Option<Unit> {
        Some(match self {
            Self::Kg => Unit::Kg,
            Self::Mt => Unit::Mt,
            Self::Tco2e => Unit::Tco2e,
            Self::Unit => Unit::EquipmentUnit,
            Self::Units => Unit::EquipmentUnits,
            Self::Kwh => Unit::Kwh,
            Self::Year => Unit::Year,
            Self::Years => Unit::Years,
            _ => return None,
        })
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lexical token.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    /// A reserved word.
    Keyword(Keyword),
    /// An unreserved identifier (stream or variable name).
    Ident(String),
    /// A double-quoted string literal, quotes stripped.
    Str(String),
    /// An integer or decimal literal.
    Number(f64),
    /// `%` (the percent unit).
    Percent,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `^`
    Caret,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// End of input.
    Eof,
}

impl Token {
    /// A short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Keyword(kw) => {
                let mut s = String::from("`");
                s.push_str(kw.as_str());
                s.push('`');
                s
            }
            Self::Ident(name) => {
                let mut s = String::from("`");
                s.push_str(name);
                s.push('`');
                s
            }
            Self::Str(_) => String::from("string"),
            Self::Number(_) => String::from("number"),
            Self::Percent => String::from("`%`"),
            Self::Plus => String::from("`+`"),
            Self::Minus => String::from("`-`"),
            Self::Star => String::from("`*`"),
            Self::Slash => String::from("`/`"),
            Self::Caret => String::from("`^`"),
            Self::EqEq => String::from("`==`"),
            Self::BangEq => String::from("`!=`"),
            Self::Lt => String::from("`<`"),
            Self::Gt => String::from("`>`"),
            Self::Le => String::from("`<=`"),
            Self::Ge => String::from("`>=`"),
            Self::LParen => String::from("`(`"),
            Self::RParen => String::from("`)`"),
            Self::LBracket => String::from("`[`"),
            Self::RBracket => String::from("`]`"),
            Self::Comma => String::from("`,`"),
            Self::Eof => String::from("end of input"),
        }
    }
}

/// A token with its source position.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub col: u32,
}

/// Tokenizes source text.
///
/// Whitespace is insignificant and `#` comments run to end of line. Lexical
/// errors are collected; the offending character is skipped so later errors
/// still surface. The token stream always ends with [`Token::Eof`].
pub fn tokenize(src: &str) -> (Vec<Spanned>, Vec<ParseError>) {
    Lexer::new(src).run()
}

struct Lexer<'a> {
    chars: core::iter::Peekable<core::str::Chars<'a>>,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn run(mut self) -> (Vec<Spanned>, Vec<ParseError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        loop {
            // Skip whitespace and comments.
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                Some('#') => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                    continue;
                }
                None => break,
                _ => {}
            }
            let (line, col) = (self.line, self.col);
            match self.scan() {
                Ok(token) => tokens.push(Spanned { token, line, col }),
                Err(msg) => errors.push(ParseError::new(line, col, msg)),
            }
        }
        tokens.push(Spanned {
            token: Token::Eof,
            line: self.line,
            col: self.col,
        });
        (tokens, errors)
    }

    fn scan(&mut self) -> Result<Token, String> {
        let c = self.bump().expect("peeked before scan");
        Ok(match c {
            '%' => Token::Percent,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '=' => {
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Token::EqEq
                } else {
                    return Err(String::from("expected `==`"));
                }
            }
            '!' => {
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Token::BangEq
                } else {
                    return Err(String::from("expected `!=`"));
                }
            }
            '<' => {
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '"' => {
                let mut text = String::new();
                loop {
                    match self.chars.peek() {
                        Some('"') => {
                            self.bump();
                            break;
                        }
                        Some('\n') | None => {
                            return Err(String::from("unterminated string"));
                        }
                        Some(&c) => {
                            text.push(c);
                            self.bump();
                        }
                    }
                }
                Token::Str(text)
            }
            c if c.is_ascii_digit() => {
                let mut text = String::new();
                text.push(c);
                while let Some(&next) = self.chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        text.push(next);
                        self.bump();
                    } else {
                        break;
                    }
                }
                match text.parse::<f64>() {
                    Ok(n) => Token::Number(n),
                    Err(_) => {
                        let mut msg = String::from("malformed number `");
                        msg.push_str(&text);
                        msg.push('`');
                        return Err(msg);
                    }
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                word.push(c);
                while let Some(&next) = self.chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        self.bump();
                    } else {
                        break;
                    }
                }
                match Keyword::parse(&word) {
                    Some(kw) => Token::Keyword(kw),
                    None => Token::Ident(word),
                }
            }
            other => {
                let mut msg = String::from("unexpected character `");
                msg.push(other);
                msg.push('`');
                return Err(msg);
            }
        })
    }
}
