//! A tiny expression sandbox for iteration-axis bounds (spec.md §4.7, §9).
//!
//! Supports numeric literals, the fixed identifier table from spec.md §6,
//! and `+ - * /` with standard precedence and parentheses. Deliberately not
//! a general-purpose evaluator: there is no way to call a function, assign a
//! variable, or reach outside this fixed grammar.

use crate::error::{EasError, EasResult};

/// Look up one of the recognized constant identifiers (spec.md §6).
fn constant(name: &str) -> Option<f64> {
    Some(match name {
        "day" => 1.0,
        "month" => 28.0,
        "year" => 365.25,
        "sun_radius" => 695_500e3,
        "earth_radius" => 6_371e3,
        "jupiter_radius" => 71_492e3,
        "phy_AU" => 149_597_870_700.0,
        "Rearth" => 0.089_114_86,
        "plato_noise" => 0.000_315,
        _ => return None,
    })
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        self.skip_ws();
        let c = self.input.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn parse_expr(&mut self) -> EasResult<f64> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(b'+') => {
                    self.bump();
                    value += self.parse_term()?;
                }
                Some(b'-') => {
                    self.bump();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> EasResult<f64> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(b'*') => {
                    self.bump();
                    value *= self.parse_factor()?;
                }
                Some(b'/') => {
                    self.bump();
                    let divisor = self.parse_factor()?;
                    if divisor == 0.0 {
                        return Err(EasError::Expr("division by zero".to_string()));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> EasResult<f64> {
        match self.peek() {
            Some(b'-') => {
                self.bump();
                Ok(-self.parse_factor()?)
            }
            Some(b'+') => {
                self.bump();
                self.parse_factor()
            }
            Some(b'(') => {
                self.bump();
                let value = self.parse_expr()?;
                match self.bump() {
                    Some(b')') => Ok(value),
                    _ => Err(EasError::Expr("expected ')'".to_string())),
                }
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => self.parse_identifier(),
            other => Err(EasError::Expr(format!(
                "unexpected token at byte {:?}",
                other
            ))),
        }
    }

    fn parse_number(&mut self) -> EasResult<f64> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.input.get(self.pos) {
            if c.is_ascii_digit() || *c == b'.' || *c == b'e' || *c == b'E' {
                // allow a sign directly after an exponent marker
                self.pos += 1;
            } else if (*c == b'+' || *c == b'-')
                && self.pos > start
                && matches!(self.input[self.pos - 1], b'e' | b'E')
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        text.parse::<f64>()
            .map_err(|_| EasError::Expr(format!("invalid number literal '{text}'")))
    }

    fn parse_identifier(&mut self) -> EasResult<f64> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.input.get(self.pos) {
            if c.is_ascii_alphanumeric() || *c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        constant(name).ok_or_else(|| EasError::Expr(format!("unknown identifier '{name}'")))
    }
}

/// Evaluate an iteration-axis bound expression. Accepts plain numeric
/// literals too, so `values: ["1", "10"]` works without needing arithmetic.
pub fn eval(expr: &str) -> EasResult<f64> {
    let mut parser = Parser::new(expr);
    let value = parser.parse_expr()?;
    parser.skip_ws();
    if parser.pos != parser.input.len() {
        return Err(EasError::Expr(format!(
            "trailing input after expression: '{expr}'"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_literals() {
        assert_eq!(eval("42").unwrap(), 42.0);
        assert!((eval("3.5").unwrap() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn evaluates_identifiers() {
        assert_eq!(eval("day").unwrap(), 1.0);
        assert_eq!(eval("year").unwrap(), 365.25);
    }

    #[test]
    fn evaluates_arithmetic_with_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval("(2 + 3) * 4").unwrap(), 20.0);
        assert!((eval("jupiter_radius / earth_radius").unwrap() - (71_492e3 / 6_371e3)).abs()
            < 1e-9);
    }

    #[test]
    fn rejects_unknown_identifiers() {
        assert!(eval("os.system('rm -rf /')").is_err());
        assert!(eval("unknown_name").is_err());
    }

    #[test]
    fn rejects_division_by_zero() {
        assert!(eval("1 / 0").is_err());
    }
}
