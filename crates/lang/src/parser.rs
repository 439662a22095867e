//! Recursive-descent parser producing the typed program model.

use crate::{
    builder::{validate_scenario, SubstanceBuilder},
    token::{tokenize, Keyword, Spanned, Token},
    Application, BinaryOp, Command, DefaultStanza, DisplaceTarget, Expr, Operand, ParseError,
    PolicyStanza, Program, Scenario, StanzaKind, Substance, Target, UnaryOp,
};
use primitives::{StreamId, Unit, UnitSpec, YearRange};
use std::{boxed::Box, format, string::String, vec, vec::Vec};

/// Outcome of translating source text.
///
/// `program` is present iff no diagnostics were produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TranslationResult {
    /// The parsed program, when translation succeeded.
    pub program: Option<Program>,
    /// Lexical and grammatical diagnostics, in source order.
    pub diagnostics: Vec<ParseError>,
}

impl TranslationResult {
    /// Whether translation produced a program.
    pub fn is_ok(&self) -> bool {
        self.program.is_some()
    }
}

/// Parses source text into a [`TranslationResult`].
///
/// Lexical errors are collected together; the first grammatical error stops
/// the parse. Placement violations, sampling, and excess trial counts do not
/// produce diagnostics here; they mark the program incompatible instead.
pub fn parse(source: &str) -> TranslationResult {
    let (about, filtered) = match extract_about(source) {
        Ok(parts) => parts,
        Err(error) => {
            return TranslationResult {
                program: None,
                diagnostics: vec![error],
            }
        }
    };
    let (tokens, diagnostics) = tokenize(&filtered);
    if !diagnostics.is_empty() {
        return TranslationResult {
            program: None,
            diagnostics,
        };
    }
    let mut parser = Parser { tokens, pos: 0 };
    match parser.program(about) {
        Ok(program) => TranslationResult {
            program: Some(program),
            diagnostics,
        },
        Err(error) => TranslationResult {
            program: None,
            diagnostics: vec![error],
        },
    }
}

impl Program {
    /// Parses source text, surfacing the first diagnostic as an error.
    pub fn from_source(source: &str) -> Result<Self, ParseError> {
        let mut result = parse(source);
        match result.program {
            Some(program) => Ok(program),
            None => Err(result.diagnostics.remove(0)),
        }
    }
}

/// Splits the opaque `about` stanza out of the source before tokenizing.
///
/// The stanza body is free text, so it is captured verbatim line-by-line;
/// captured lines are blanked (not removed) to keep diagnostic line numbers
/// aligned with the original source.
fn extract_about(source: &str) -> Result<(Option<String>, String), ParseError> {
    let mut about: Option<String> = None;
    let mut filtered = String::with_capacity(source.len());
    let mut in_about = false;
    let mut start_line = 0u32;
    for (index, line) in source.lines().enumerate() {
        let line_no = index as u32 + 1;
        let trimmed = line.trim();
        if in_about {
            if trimmed == "end about" {
                in_about = false;
            } else {
                let body = about.get_or_insert_with(String::new);
                body.push_str(line);
                body.push('\n');
            }
            filtered.push('\n');
            continue;
        }
        if trimmed == "start about" {
            if about.is_some() {
                return Err(ParseError::new(line_no, 1, "duplicate `about` stanza"));
            }
            about = Some(String::new());
            in_about = true;
            start_line = line_no;
            filtered.push('\n');
            continue;
        }
        filtered.push_str(line);
        filtered.push('\n');
    }
    if in_about {
        return Err(ParseError::new(
            start_line,
            1,
            "unterminated `about` stanza",
        ));
    }
    Ok((about, filtered))
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn peek2(&self) -> &Token {
        let index = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[index].token
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, msg: impl Into<String>) -> ParseError {
        let spanned = &self.tokens[self.pos];
        ParseError::new(spanned.line, spanned.col, msg)
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(k) if *k == kw)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected `{}`, found {}",
                kw.as_str(),
                self.peek().describe()
            )))
        }
    }

    fn expect_token(&mut self, expected: Token, describe: &str) -> Result<(), ParseError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected {describe}, found {}",
                self.peek().describe()
            )))
        }
    }

    fn expect_str(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Str(_) => match self.advance() {
                Token::Str(text) => Ok(text),
                _ => unreachable!(),
            },
            other => Err(self.error_here(format!(
                "expected quoted name, found {}",
                other.describe()
            ))),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Ident(_) => match self.advance() {
                Token::Ident(name) => Ok(name),
                _ => unreachable!(),
            },
            other => Err(self.error_here(format!(
                "expected identifier, found {}",
                other.describe()
            ))),
        }
    }

    fn expect_number(&mut self) -> Result<f64, ParseError> {
        match self.peek() {
            Token::Number(n) => {
                let n = *n;
                self.advance();
                Ok(n)
            }
            other => Err(self.error_here(format!("expected number, found {}", other.describe()))),
        }
    }

    fn expect_int(&mut self) -> Result<i32, ParseError> {
        let err = self.error_here("expected integer year");
        let n = self.expect_number()?;
        if n.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(&n) {
            Ok(n as i32)
        } else {
            Err(err)
        }
    }

    fn expect_stream(&mut self) -> Result<StreamId, ParseError> {
        let (line, col) = (self.tokens[self.pos].line, self.tokens[self.pos].col);
        let name = match self.peek() {
            Token::Ident(_) => self.expect_ident()?,
            other => {
                return Err(ParseError::new(
                    line,
                    col,
                    format!("expected stream name, found {}", other.describe()),
                ))
            }
        };
        StreamId::parse(&name)
            .ok_or_else(|| ParseError::new(line, col, format!("unknown stream `{name}`")))
    }

    /* Program structure */

    fn program(&mut self, about: Option<String>) -> Result<Program, ParseError> {
        let mut program = Program {
            about,
            ..Program::default()
        };
        while !matches!(self.peek(), Token::Eof) {
            self.expect_keyword(Keyword::Start)?;
            match self.peek() {
                Token::Keyword(Keyword::Default) => {
                    self.advance();
                    if program.default.is_some() {
                        return Err(self.error_here("duplicate `default` stanza"));
                    }
                    let applications = self.applications(StanzaKind::Default)?;
                    self.expect_keyword(Keyword::End)?;
                    self.expect_keyword(Keyword::Default)?;
                    program.default = Some(DefaultStanza { applications });
                }
                Token::Keyword(Keyword::Policy) => {
                    self.advance();
                    let name = self.expect_str()?;
                    if program.policy(&name).is_some() {
                        return Err(self.error_here(format!("duplicate policy \"{name}\"")));
                    }
                    let applications = self.applications(StanzaKind::Policy)?;
                    self.expect_keyword(Keyword::End)?;
                    self.expect_keyword(Keyword::Policy)?;
                    program.policies.push(PolicyStanza { name, applications });
                }
                Token::Keyword(Keyword::Simulations) => {
                    self.advance();
                    while self.at_keyword(Keyword::Simulate) {
                        let scenario = self.scenario()?;
                        program.simulations.push(scenario);
                    }
                    self.expect_keyword(Keyword::End)?;
                    self.expect_keyword(Keyword::Simulations)?;
                }
                other => {
                    return Err(self.error_here(format!(
                        "expected `default`, `policy`, or `simulations`, found {}",
                        other.describe()
                    )))
                }
            }
        }
        Ok(program)
    }

    fn applications(&mut self, kind: StanzaKind) -> Result<Vec<Application>, ParseError> {
        let lead = match kind {
            StanzaKind::Default => Keyword::Define,
            StanzaKind::Policy => Keyword::Modify,
        };
        let mut applications = Vec::new();
        while self.at_keyword(lead) {
            self.advance();
            self.expect_keyword(Keyword::Application)?;
            let name = self.expect_str()?;
            let mut substances = Vec::new();
            while self.at_keyword(lead) {
                self.advance();
                self.expect_keyword(Keyword::Substance)?;
                let substance = self.expect_str()?;
                substances.push(self.substance_body(substance, kind)?);
            }
            self.expect_keyword(Keyword::End)?;
            self.expect_keyword(Keyword::Application)?;
            applications.push(Application { name, substances });
        }
        Ok(applications)
    }

    fn substance_body(
        &mut self,
        name: String,
        kind: StanzaKind,
    ) -> Result<Substance, ParseError> {
        let mut builder = SubstanceBuilder::new(name, kind);
        loop {
            match self.peek() {
                Token::Keyword(Keyword::End) => {
                    self.advance();
                    self.expect_keyword(Keyword::Substance)?;
                    break;
                }
                Token::Eof => {
                    return Err(self.error_here("unexpected end of input in substance body"))
                }
                _ => {
                    let command = self.command()?;
                    builder.push(command);
                }
            }
        }
        Ok(builder.finish())
    }

    /* Commands */

    fn command(&mut self) -> Result<Command, ParseError> {
        match self.peek() {
            Token::Keyword(Keyword::Initial) => {
                self.advance();
                self.expect_keyword(Keyword::Charge)?;
                self.expect_keyword(Keyword::With)?;
                let value = self.operand()?;
                self.expect_keyword(Keyword::For)?;
                let target = self.charged_target()?;
                let during = self.during()?;
                Ok(Command::InitialCharge {
                    value,
                    target,
                    during,
                })
            }
            Token::Keyword(Keyword::Equals) | Token::Keyword(Keyword::Emit) => {
                self.advance();
                let value = self.operand()?;
                let during = self.during()?;
                Ok(Command::Equals { value, during })
            }
            Token::Keyword(Keyword::Recharge) => {
                self.advance();
                let population = self.operand()?;
                self.expect_keyword(Keyword::With)?;
                let volume = self.operand()?;
                let during = self.during()?;
                Ok(Command::Recharge {
                    population,
                    volume,
                    during,
                })
            }
            Token::Keyword(Keyword::Recover) => {
                self.advance();
                let recovery = self.operand()?;
                self.expect_keyword(Keyword::With)?;
                let yield_rate = self.operand()?;
                self.expect_keyword(Keyword::Reuse)?;
                let displacement = if self.eat_keyword(Keyword::Displacing) {
                    Some(self.operand()?)
                } else {
                    None
                };
                let during = self.during()?;
                Ok(Command::Recycle {
                    recovery,
                    yield_rate,
                    displacement,
                    during,
                })
            }
            Token::Keyword(Keyword::Replace) => {
                self.advance();
                let amount = self.operand()?;
                self.expect_keyword(Keyword::Of)?;
                let stream = self.expect_stream()?;
                self.expect_keyword(Keyword::With)?;
                let destination = self.expect_str()?;
                let during = self.during()?;
                Ok(Command::Replace {
                    amount,
                    stream,
                    destination,
                    during,
                })
            }
            Token::Keyword(Keyword::Set) => {
                self.advance();
                let target = self.target()?;
                self.expect_keyword(Keyword::To)?;
                let value = self.operand()?;
                let during = self.during()?;
                Ok(Command::Set {
                    target,
                    value,
                    during,
                })
            }
            Token::Keyword(Keyword::Change) => {
                self.advance();
                let target = self.target()?;
                self.expect_keyword(Keyword::By)?;
                let delta = self.operand()?;
                let during = self.during()?;
                Ok(Command::Change {
                    target,
                    delta,
                    during,
                })
            }
            Token::Keyword(Keyword::Retire) => {
                self.advance();
                let amount = self.operand()?;
                let during = self.during()?;
                Ok(Command::Retire { amount, during })
            }
            Token::Keyword(Keyword::Cap) => {
                self.advance();
                let stream = self.expect_stream()?;
                self.expect_keyword(Keyword::To)?;
                let value = self.operand()?;
                let displacing = self.displacing()?;
                let during = self.during()?;
                Ok(Command::Cap {
                    stream,
                    value,
                    displacing,
                    during,
                })
            }
            Token::Keyword(Keyword::Floor) => {
                self.advance();
                let stream = self.expect_stream()?;
                self.expect_keyword(Keyword::To)?;
                let value = self.operand()?;
                let displacing = self.displacing()?;
                let during = self.during()?;
                Ok(Command::Floor {
                    stream,
                    value,
                    displacing,
                    during,
                })
            }
            Token::Keyword(Keyword::Limit) => {
                self.advance();
                let stream = self.expect_stream()?;
                self.expect_keyword(Keyword::To)?;
                self.expect_token(Token::LBracket, "`[`")?;
                let lower = if matches!(self.peek(), Token::Comma) {
                    None
                } else {
                    Some(self.operand()?)
                };
                self.expect_token(Token::Comma, "`,`")?;
                let upper = if matches!(self.peek(), Token::RBracket) {
                    None
                } else {
                    Some(self.operand()?)
                };
                self.expect_token(Token::RBracket, "`]`")?;
                let during = self.during()?;
                Ok(Command::Limit {
                    stream,
                    lower,
                    upper,
                    during,
                })
            }
            Token::Keyword(Keyword::Define) => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect_keyword(Keyword::As)?;
                let value = self.operand()?;
                Ok(Command::Define { name, value })
            }
            Token::Keyword(Keyword::Enable) => {
                self.advance();
                let (line, col) = (self.tokens[self.pos].line, self.tokens[self.pos].col);
                let stream = self.charged_target()?;
                if stream == StreamId::Sales {
                    return Err(ParseError::new(line, col, "`enable` takes a single substream"));
                }
                Ok(Command::Enable { stream })
            }
            other => Err(self.error_here(format!("unknown command {}", other.describe()))),
        }
    }

    fn target(&mut self) -> Result<Target, ParseError> {
        let name = self.expect_ident()?;
        Ok(match StreamId::parse(&name) {
            Some(stream) => Target::Stream(stream),
            None => Target::Variable(name),
        })
    }

    /// A stream that carries an initial charge, or `sales` for both
    /// substreams at once.
    fn charged_target(&mut self) -> Result<StreamId, ParseError> {
        let (line, col) = (self.tokens[self.pos].line, self.tokens[self.pos].col);
        let stream = self.expect_stream()?;
        if stream.is_charged_substream() || stream == StreamId::Sales {
            Ok(stream)
        } else {
            Err(ParseError::new(
                line,
                col,
                format!("`{stream}` is not a sales substream"),
            ))
        }
    }

    fn displacing(&mut self) -> Result<Option<DisplaceTarget>, ParseError> {
        if !self.eat_keyword(Keyword::Displacing) {
            return Ok(None);
        }
        match self.peek() {
            Token::Str(_) => Ok(Some(DisplaceTarget::Substance(self.expect_str()?))),
            _ => Ok(Some(DisplaceTarget::Stream(self.expect_stream()?))),
        }
    }

    fn during(&mut self) -> Result<Option<YearRange>, ParseError> {
        if !self.eat_keyword(Keyword::During) {
            return Ok(None);
        }
        if self.eat_keyword(Keyword::Year) {
            let year = self.expect_int()?;
            return Ok(Some(YearRange::single(year)));
        }
        self.expect_keyword(Keyword::Years)?;
        let start = if self.eat_keyword(Keyword::Beginning) {
            None
        } else {
            Some(self.expect_int()?)
        };
        self.expect_keyword(Keyword::To)?;
        let end = if self.eat_keyword(Keyword::Onwards) {
            None
        } else {
            Some(self.expect_int()?)
        };
        Ok(Some(YearRange::new(start, end)))
    }

    /* Scenarios */

    fn scenario(&mut self) -> Result<Scenario, ParseError> {
        self.expect_keyword(Keyword::Simulate)?;
        let name = self.expect_str()?;
        let mut policies = Vec::new();
        if self.eat_keyword(Keyword::Using) {
            policies.push(self.expect_str()?);
            while self.eat_keyword(Keyword::Then) {
                policies.push(self.expect_str()?);
            }
        }
        self.expect_keyword(Keyword::From)?;
        if !self.eat_keyword(Keyword::Years) {
            self.expect_keyword(Keyword::Year)?;
        }
        let start = self.expect_int()?;
        self.expect_keyword(Keyword::To)?;
        let end = self.expect_int()?;
        let trials = if self.eat_keyword(Keyword::Across) {
            let count = self.expect_int()?;
            if count < 1 {
                return Err(self.error_here("trial count must be at least 1"));
            }
            if !self.eat_keyword(Keyword::Trials) {
                self.expect_keyword(Keyword::Trial)?;
            }
            count as u32
        } else {
            1
        };
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let mut scenario = Scenario {
            name,
            policies,
            start,
            end,
            trials,
            incompatibilities: Vec::new(),
        };
        validate_scenario(&mut scenario);
        Ok(scenario)
    }

    /* Operands and expressions */

    fn operand(&mut self) -> Result<Operand, ParseError> {
        let expr = self.expression()?;
        let unit = self.unit_suffix();
        Ok(Operand::new(expr, unit))
    }

    fn unit_suffix(&mut self) -> UnitSpec {
        let Some(numerator) = self.peek_unit() else {
            return UnitSpec::Scalar;
        };
        self.advance();
        if matches!(self.peek(), Token::Slash) {
            if let Some(denominator) = unit_of(self.peek2()) {
                self.advance();
                self.advance();
                return UnitSpec::Ratio(numerator, denominator);
            }
        }
        UnitSpec::Base(numerator)
    }

    fn peek_unit(&self) -> Option<Unit> {
        unit_of(self.peek())
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.conditional()
    }

    fn conditional(&mut self) -> Result<Expr, ParseError> {
        let value = self.comparison()?;
        if !self.eat_keyword(Keyword::If) {
            return Ok(value);
        }
        let condition = self.comparison()?;
        self.expect_keyword(Keyword::Else)?;
        let otherwise = self.conditional()?;
        self.expect_keyword(Keyword::Endif)?;
        Ok(Expr::Conditional {
            then: Box::new(value),
            condition: Box::new(condition),
            otherwise: Box::new(otherwise),
        })
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.additive()?;
        let op = match self.peek() {
            Token::EqEq => BinaryOp::Eq,
            Token::BangEq => BinaryOp::Ne,
            Token::Le => BinaryOp::Le,
            Token::Ge => BinaryOp::Ge,
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.additive()?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.power()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                // `/` is division only when a primary follows; otherwise it
                // belongs to a unit ratio like `kg / unit`.
                Token::Slash if starts_primary(self.peek2()) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.power()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.unary()?;
        if matches!(self.peek(), Token::Caret) {
            self.advance();
            let exponent = self.power()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Token::Minus) {
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Token::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::Ident(_) => Ok(Expr::Variable(self.expect_ident()?)),
            Token::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect_token(Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::Keyword(Keyword::Sample) => self.sample(),
            Token::Keyword(Keyword::Limit) => self.limit_expr(),
            other => Err(self.error_here(format!(
                "expected expression, found {}",
                other.describe()
            ))),
        }
    }

    fn sample(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Sample)?;
        if self.eat_keyword(Keyword::Normally) {
            self.expect_keyword(Keyword::From)?;
            self.expect_keyword(Keyword::Mean)?;
            self.expect_keyword(Keyword::Of)?;
            let mean = self.additive()?;
            self.expect_keyword(Keyword::Std)?;
            self.expect_keyword(Keyword::Of)?;
            let std = self.additive()?;
            return Ok(Expr::SampleNormal {
                mean: Box::new(mean),
                std: Box::new(std),
            });
        }
        self.expect_keyword(Keyword::Uniformly)?;
        self.expect_keyword(Keyword::From)?;
        let low = self.additive()?;
        self.expect_keyword(Keyword::To)?;
        let high = self.additive()?;
        Ok(Expr::SampleUniform {
            low: Box::new(low),
            high: Box::new(high),
        })
    }

    fn limit_expr(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Limit)?;
        let value = self.additive()?;
        self.expect_keyword(Keyword::To)?;
        self.expect_token(Token::LBracket, "`[`")?;
        let lower = if matches!(self.peek(), Token::Comma) {
            None
        } else {
            Some(Box::new(self.additive()?))
        };
        self.expect_token(Token::Comma, "`,`")?;
        let upper = if matches!(self.peek(), Token::RBracket) {
            None
        } else {
            Some(Box::new(self.additive()?))
        };
        self.expect_token(Token::RBracket, "`]`")?;
        Ok(Expr::Limit {
            value: Box::new(value),
            lower,
            upper,
        })
    }
}

/// The unit a token spells, if any.
fn unit_of(token: &Token) -> Option<Unit> {
    match token {
        Token::Percent => Some(Unit::Percent),
        Token::Keyword(kw) => kw.as_unit(),
        _ => None,
    }
}

/// Whether a token can begin a primary expression. Used to tell division
/// from a unit ratio after a value.
fn starts_primary(token: &Token) -> bool {
    matches!(
        token,
        Token::Number(_)
            | Token::Ident(_)
            | Token::LParen
            | Token::Minus
            | Token::Keyword(Keyword::Sample)
            | Token::Keyword(Keyword::Limit)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(source: &str) -> Program {
        Program::from_source(source).unwrap()
    }

    const BASIC: &str = r#"
start default
  define application "A"
    define substance "X"
      initial charge with 1 kg / unit for sales
      equals 2 tCO2e / kg
      set domestic to 10 kg
    end substance
  end application
end default

start simulations
  simulate "BAU" from years 1 to 10
end simulations
"#;

    #[test]
    fn parses_default_and_simulations() {
        let program = program(BASIC);
        let default = program.default.as_ref().unwrap();
        assert_eq!(default.applications.len(), 1);
        let substance = &default.applications[0].substances[0];
        assert_eq!(substance.name, "X");
        assert_eq!(substance.commands.len(), 3);
        assert!(substance.incompatibilities.is_empty());
        assert_eq!(program.simulations.len(), 1);
        assert_eq!(program.simulations[0].start, 1);
        assert_eq!(program.simulations[0].end, 10);
        assert_eq!(program.simulations[0].trials, 1);
        assert!(program.is_compatible());
    }

    #[test]
    fn initial_charge_structure() {
        let program = program(BASIC);
        let commands = &program.default.as_ref().unwrap().applications[0].substances[0].commands;
        assert_eq!(
            commands[0],
            Command::InitialCharge {
                value: Operand::new(
                    Expr::Number(1.0),
                    UnitSpec::Ratio(Unit::Kg, Unit::EquipmentUnit)
                ),
                target: StreamId::Sales,
                during: None,
            }
        );
    }

    #[test]
    fn emit_is_a_spelling_of_equals() {
        let source = r#"
start default
  define application "A"
    define substance "X"
      emit 500 tCO2e / mt
    end substance
  end application
end default
"#;
        let program = program(source);
        let commands = &program.default.as_ref().unwrap().applications[0].substances[0].commands;
        assert!(matches!(commands[0], Command::Equals { .. }));
    }

    #[test]
    fn policy_stanza_uses_modify() {
        let source = r#"
start policy "Cap X"
  modify application "A"
    modify substance "X"
      cap domestic to 60 kg displacing "Y"
    end substance
  end application
end policy
"#;
        let program = program(source);
        assert_eq!(program.policies.len(), 1);
        let commands = &program.policies[0].applications[0].substances[0].commands;
        assert_eq!(
            commands[0],
            Command::Cap {
                stream: StreamId::Domestic,
                value: Operand::new(Expr::Number(60.0), UnitSpec::Base(Unit::Kg)),
                displacing: Some(DisplaceTarget::Substance("Y".into())),
                during: None,
            }
        );
    }

    #[test]
    fn year_ranges() {
        let source = r#"
start default
  define application "A"
    define substance "X"
      set domestic to 5 kg during years 3 to 5
      set domestic to 6 kg during year 4
      set domestic to 7 kg during years beginning to 2
      set domestic to 8 kg during years 6 to onwards
    end substance
  end application
end default
"#;
        let program = program(source);
        let commands = &program.default.as_ref().unwrap().applications[0].substances[0].commands;
        let ranges: Vec<_> = commands.iter().map(|c| c.during().unwrap()).collect();
        assert_eq!(ranges[0], YearRange::new(Some(3), Some(5)));
        assert_eq!(ranges[1], YearRange::single(4));
        assert_eq!(ranges[2], YearRange::new(None, Some(2)));
        assert_eq!(ranges[3], YearRange::new(Some(6), None));
    }

    #[test]
    fn recover_with_displacement() {
        let source = r#"
start policy "R"
  modify application "A"
    modify substance "X"
      recover 100 % with 50 % reuse displacing 100 %
    end substance
  end application
end policy
"#;
        let program = program(source);
        let commands = &program.policies[0].applications[0].substances[0].commands;
        assert_eq!(
            commands[0],
            Command::Recycle {
                recovery: Operand::new(Expr::Number(100.0), UnitSpec::Base(Unit::Percent)),
                yield_rate: Operand::new(Expr::Number(50.0), UnitSpec::Base(Unit::Percent)),
                displacement: Some(Operand::new(
                    Expr::Number(100.0),
                    UnitSpec::Base(Unit::Percent)
                )),
                during: None,
            }
        );
    }

    #[test]
    fn ratio_unit_is_not_division() {
        let source = r#"
start default
  define application "A"
    define substance "X"
      change sales by 10 % / year
      set domestic to 100 / 4 kg
    end substance
  end application
end default
"#;
        let program = program(source);
        let commands = &program.default.as_ref().unwrap().applications[0].substances[0].commands;
        assert_eq!(
            commands[0],
            Command::Change {
                target: Target::Stream(StreamId::Sales),
                delta: Operand::new(
                    Expr::Number(10.0),
                    UnitSpec::Ratio(Unit::Percent, Unit::Year)
                ),
                during: None,
            }
        );
        // `100 / 4` is arithmetic; the trailing `kg` is the unit.
        assert_eq!(
            commands[1],
            Command::Set {
                target: Target::Stream(StreamId::Domestic),
                value: Operand::new(
                    Expr::Binary {
                        op: BinaryOp::Div,
                        left: Box::new(Expr::Number(100.0)),
                        right: Box::new(Expr::Number(4.0)),
                    },
                    UnitSpec::Base(Unit::Kg)
                ),
                during: None,
            }
        );
    }

    #[test]
    fn conditionals_and_variables() {
        let source = r#"
start default
  define application "A"
    define substance "X"
      define threshold as 5
      set domestic to threshold * 2 if yearsElapsed > 3 else threshold endif kg
    end substance
  end application
end default
"#;
        let program = program(source);
        let commands = &program.default.as_ref().unwrap().applications[0].substances[0].commands;
        assert!(matches!(commands[0], Command::Define { .. }));
        let Command::Set { value, .. } = &commands[1] else {
            panic!("expected set");
        };
        assert_eq!(value.unit, UnitSpec::Base(Unit::Kg));
        assert!(matches!(value.expr, Expr::Conditional { .. }));
    }

    #[test]
    fn sampling_parses_but_flags_incompatible() {
        let source = r#"
start default
  define application "A"
    define substance "X"
      set domestic to sample normally from mean of 10 std of 2 kg
    end substance
  end application
end default
"#;
        let program = program(source);
        assert!(!program.is_compatible());
        assert!(program.incompatibilities()[0].contains("sampling"));
    }

    #[test]
    fn scenario_policies_and_trials() {
        let source = r#"
start simulations
  simulate "Both" using "P1" then "P2" from years 2 to 8 across 3 trials
end simulations
"#;
        let program = program(source);
        let scenario = &program.simulations[0];
        assert_eq!(scenario.policies, ["P1", "P2"]);
        assert_eq!((scenario.start, scenario.end), (2, 8));
        assert_eq!(scenario.trials, 3);
        assert!(!program.is_compatible());
    }

    #[test]
    fn about_stanza_is_captured_verbatim() {
        let source = "start about\n  Any text at all! ??\nend about\nstart default\nend default\n";
        let program = program(source);
        assert_eq!(program.about.as_deref(), Some("  Any text at all! ??\n"));
        assert!(program.default.is_some());
    }

    #[test]
    fn diagnostics_carry_positions() {
        let result = parse("start default\n  define application 12\nend default\n");
        assert!(result.program.is_none());
        let diag = &result.diagnostics[0];
        assert_eq!(diag.line, 2);
        assert!(diag.msg.contains("expected quoted name"));
    }

    #[test]
    fn placement_violation_does_not_fail_parse() {
        let source = r#"
start default
  define application "A"
    define substance "X"
      cap domestic to 10 kg
    end substance
  end application
end default
"#;
        let program = program(source);
        assert!(!program.is_compatible());
        assert!(program.incompatibilities()[0].contains("cap"));
    }

    #[test]
    fn limit_command_bounds() {
        let source = r#"
start default
  define application "A"
    define substance "X"
      limit domestic to [1 kg, 10 kg]
      limit domestic to [, 10 kg]
      limit domestic to [1 kg,]
    end substance
  end application
end default
"#;
        let program = program(source);
        let commands = &program.default.as_ref().unwrap().applications[0].substances[0].commands;
        let Command::Limit { lower, upper, .. } = &commands[1] else {
            panic!("expected limit");
        };
        assert!(lower.is_none());
        assert!(upper.is_some());
        let Command::Limit { lower, upper, .. } = &commands[2] else {
            panic!("expected limit");
        };
        assert!(lower.is_some());
        assert!(upper.is_none());
    }
}
