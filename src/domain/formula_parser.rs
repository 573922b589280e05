//! Formula parser.
//!
//! Recursive descent parser for the arithmetic formula grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := number | identifier | '(' expr ')'
//! ```
//!
//! Identifiers are limited to the six metric names. Errors carry the byte
//! offset of the offending token.

use crate::domain::error::ParseError;
use crate::domain::formula::{BinaryOp, Expr, Metric};

const MAX_DEPTH: usize = 128;
const MAX_OPERATORS: usize = 1024;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            operators: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn peek_word(&self) -> &'a str {
        let end = self
            .remaining()
            .char_indices()
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(self.remaining().len());
        &self.remaining()[..end]
    }

    fn found(&self) -> String {
        self.peek()
            .map(|c| format!("'{}'", c))
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn digits(&mut self) -> usize {
        let mut count = 0;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                count += 1;
                self.advance();
            } else {
                break;
            }
        }
        count
    }

    fn parse_number(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let mut digits = self.digits();

        if self.peek() == Some('.') {
            self.advance();
            digits += self.digits();
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let exp_start = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if self.digits() == 0 {
                return Err(ParseError {
                    message: "expected exponent digits".to_string(),
                    position: exp_start,
                });
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Expr::Number(value)),
            Ok(_) => Err(ParseError {
                message: format!("number out of range: {}", num_str),
                position: start,
            }),
            Err(_) => Err(ParseError {
                message: format!("invalid number: {}", num_str),
                position: start,
            }),
        }
    }

    fn parse_variable(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let word = self.peek_word();
        match Metric::from_name(word) {
            Some(metric) => {
                self.pos += word.len();
                Ok(Expr::Variable(metric))
            }
            None => {
                let allowed: Vec<&str> = Metric::ALL.iter().map(|m| m.name()).collect();
                Err(ParseError {
                    message: format!(
                        "unknown variable '{}' (expected one of {})",
                        word,
                        allowed.join(", ")
                    ),
                    position: start,
                })
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.parse_number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.parse_variable(),
            Some('(') => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_char(')')?;
                Ok(expr)
            }
            _ => Err(ParseError {
                message: format!("expected expression, found {}", self.found()),
                position: self.pos,
            }),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some('-') => {
                self.advance();
                let inner = self.nested(Self::parse_unary)?;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some('+') => {
                self.advance();
                self.nested(Self::parse_unary)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('*') => BinaryOp::Mul,
                Some('/') => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.count_operator()?;
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(|p| {
            let mut left = p.parse_term()?;
            loop {
                p.skip_whitespace();
                let op = match p.peek() {
                    Some('+') => BinaryOp::Add,
                    Some('-') => BinaryOp::Sub,
                    _ => return Ok(left),
                };
                p.count_operator()?;
                p.advance();
                let right = p.parse_term()?;
                left = Expr::binary(op, left, right);
            }
        })
    }

    fn nested<F>(&mut self, f: F) -> Result<Expr, ParseError>
    where
        F: FnOnce(&mut Self) -> Result<Expr, ParseError>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError {
                message: "expression nested too deeply".to_string(),
                position: self.pos,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Binary chains build left-nested trees, so their length bounds the
    /// tree depth alongside `MAX_DEPTH`.
    fn count_operator(&mut self) -> Result<(), ParseError> {
        if self.operators >= MAX_OPERATORS {
            return Err(ParseError {
                message: "expression nested too deeply".to_string(),
                position: self.pos,
            });
        }
        self.operators += 1;
        Ok(())
    }

    fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(ParseError {
                message: format!("unexpected input after expression: '{}'", self.remaining()),
                position: self.pos,
            });
        }
        Ok(expr)
    }
}

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(m: Metric) -> Expr {
        Expr::Variable(m)
    }

    #[test]
    fn parse_single_variable() {
        assert_eq!(parse("confirmed").unwrap(), var(Metric::Confirmed));
        assert_eq!(parse("recoveredRate").unwrap(), var(Metric::RecoveredRate));
    }

    #[test]
    fn parse_all_variables() {
        for m in Metric::ALL {
            assert_eq!(parse(m.name()).unwrap(), var(m));
        }
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse("42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse("3.25").unwrap(), Expr::Number(3.25));
        assert_eq!(parse(".5").unwrap(), Expr::Number(0.5));
        assert_eq!(parse("1e3").unwrap(), Expr::Number(1000.0));
        assert_eq!(parse("2.5E-1").unwrap(), Expr::Number(0.25));
    }

    #[test]
    fn parse_parenthesised_subtraction() {
        let expr = parse("confirmed - (recovered - deaths)").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Sub,
                var(Metric::Confirmed),
                Expr::binary(BinaryOp::Sub, var(Metric::Recovered), var(Metric::Deaths)),
            )
        );
    }

    #[test]
    fn multiplication_binds_tighter() {
        let expr = parse("deaths + confirmed * 2").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Add,
                var(Metric::Deaths),
                Expr::binary(BinaryOp::Mul, var(Metric::Confirmed), Expr::Number(2.0)),
            )
        );
    }

    #[test]
    fn operators_are_left_associative() {
        let expr = parse("confirmed - deaths - recovered").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Sub,
                Expr::binary(BinaryOp::Sub, var(Metric::Confirmed), var(Metric::Deaths)),
                var(Metric::Recovered),
            )
        );

        let expr = parse("confirmed / deaths / 2").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Div,
                right,
                ..
            } if *right == Expr::Number(2.0)
        ));
    }

    #[test]
    fn parse_unary_operators() {
        assert_eq!(
            parse("-deaths").unwrap(),
            Expr::Neg(Box::new(var(Metric::Deaths)))
        );
        assert_eq!(parse("+deaths").unwrap(), var(Metric::Deaths));
        assert_eq!(
            parse("confirmed * -1").unwrap(),
            Expr::binary(
                BinaryOp::Mul,
                var(Metric::Confirmed),
                Expr::Neg(Box::new(Expr::Number(1.0)))
            )
        );
    }

    #[test]
    fn whitespace_is_insignificant() {
        assert_eq!(
            parse("  confirmed/deaths ").unwrap(),
            parse("confirmed / deaths").unwrap()
        );
        assert_eq!(parse("\t( deaths )\n").unwrap(), var(Metric::Deaths));
    }

    #[test]
    fn display_reparses_to_same_tree() {
        for src in [
            "confirmed - (recovered - deaths)",
            "deaths / (confirmed + 1) * 100",
            "-(confirmedRate - deathsRate) / 2",
            "recovered - -deaths",
        ] {
            let expr = parse(src).unwrap();
            assert_eq!(parse(&expr.to_string()).unwrap(), expr, "{src}");
        }
    }

    #[test]
    fn error_unknown_variable() {
        let err = parse("confirmed + population").unwrap_err();
        assert!(err.message.contains("unknown variable 'population'"));
        assert_eq!(err.position, 12);
    }

    #[test]
    fn identifiers_are_case_sensitive() {
        let err = parse("Confirmed").unwrap_err();
        assert!(err.message.contains("unknown variable"));
    }

    #[test]
    fn error_missing_operand() {
        let err = parse("confirmed +").unwrap_err();
        assert!(err.message.contains("expected expression, found end of input"));
        assert_eq!(err.position, 11);
    }

    #[test]
    fn error_missing_paren() {
        let err = parse("(confirmed - deaths").unwrap_err();
        assert!(err.message.contains("expected ')'"));
    }

    #[test]
    fn error_trailing_input() {
        let err = parse("confirmed deaths").unwrap_err();
        assert!(err.message.contains("unexpected input"));
        assert_eq!(err.position, 10);

        let err = parse("deaths)").unwrap_err();
        assert!(err.message.contains("unexpected input"));
    }

    #[test]
    fn error_disallowed_syntax() {
        // Anything outside the arithmetic grammar is rejected.
        assert!(parse("confirmed % 2").is_err());
        assert!(parse("Math.max(confirmed, 1)").is_err());
        assert!(parse("confirmed; deaths").is_err());
        assert!(parse("alert(1)").is_err());
        assert!(parse("confirmed ** 2").is_err());
    }

    #[test]
    fn error_bad_numbers() {
        assert!(parse(".").is_err());
        let err = parse("1e").unwrap_err();
        assert!(err.message.contains("exponent"));
        assert!(parse("1.2.3").is_err());
    }

    #[test]
    fn error_empty_input() {
        let err = parse("").unwrap_err();
        assert!(err.message.contains("expected expression"));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn error_whitespace_only() {
        let err = parse("   ").unwrap_err();
        assert!(err.message.contains("expected expression"));
    }

    #[test]
    fn error_display_with_context() {
        let src = "confirmed * / deaths";
        let err = parse(src).unwrap_err();
        let ctx = err.display_with_context(src);
        assert!(ctx.contains("^"));
        assert!(ctx.contains("position 12"));
    }

    #[test]
    fn error_nesting_too_deep() {
        let src = format!("{}confirmed{}", "(".repeat(500), ")".repeat(500));
        let err = parse(&src).unwrap_err();
        assert!(err.message.contains("nested too deeply"));
    }

    #[test]
    fn moderate_nesting_is_fine() {
        let src = format!("{}confirmed{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse(&src).unwrap(), var(Metric::Confirmed));
    }

    #[test]
    fn error_operator_chain_too_long() {
        let src = format!("confirmed{}", " + 1".repeat(200_000));
        let err = parse(&src).unwrap_err();
        assert!(err.message.contains("nested too deeply"));

        let src = format!("deaths{}", " * 2".repeat(5_000));
        assert!(parse(&src).is_err());
    }

    #[test]
    fn long_chain_within_limit_evaluates() {
        let src = format!("confirmed{}", " + 1".repeat(1_000));
        let expr = parse(&src).unwrap();
        let values = crate::domain::formula_eval::MetricValues::default();
        assert_eq!(crate::domain::formula_eval::evaluate(&expr, &values), 1000.0);
        assert_eq!(parse(&expr.to_string()).unwrap(), expr);
    }

    #[test]
    fn error_literal_out_of_range() {
        let err = parse("confirmed * 1e400").unwrap_err();
        assert!(err.message.contains("out of range"));
        assert_eq!(err.position, 12);
        assert_eq!(parse("1e300").unwrap(), Expr::Number(1e300));
    }
}
