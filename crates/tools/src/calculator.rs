//! Calculator tool for exact arithmetic the model tends to get wrong.
//!
//! Evaluates `+`, `-`, `*`, `/`, parentheses, and unary negation with a
//! small recursive-descent evaluator. Invalid expressions are reported as
//! observation strings so the model can correct itself.

use aigentd_core::{Tool, ToolError};
use async_trait::async_trait;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression. Supports +, -, *, /, parentheses, and decimal numbers."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. '(2 + 3) * 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, params: &serde_json::Value) -> Result<String, ToolError> {
        let expression = params["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParameters("missing 'expression' parameter".into()))?;

        match evaluate(expression) {
            Ok(value) => Ok(format_value(value)),
            Err(e) => Ok(format!("Error: {e}")),
        }
    }
}

/// Drop the fractional part when the result is a whole number the model
/// would rather see as an integer.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate an arithmetic expression string.
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = scan(expression)?;
    let mut cursor = Cursor { tokens, next: 0 };
    let value = cursor.sum()?;
    match cursor.peek() {
        None => Ok(value),
        Some(tok) => Err(format!("Unexpected trailing token: {tok:?}")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    Num(f64),
    Add,
    Sub,
    Mul,
    Div,
    Open,
    Close,
}

fn scan(input: &str) -> Result<Vec<Tok>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Tok::Add);
            }
            '-' => {
                chars.next();
                tokens.push(Tok::Sub);
            }
            '*' => {
                chars.next();
                tokens.push(Tok::Mul);
            }
            '/' => {
                chars.next();
                tokens.push(Tok::Div);
            }
            '(' => {
                chars.next();
                tokens.push(Tok::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Tok::Close);
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = literal
                    .parse()
                    .map_err(|_| format!("Invalid number: {literal}"))?;
                tokens.push(Tok::Num(value));
            }
            other => return Err(format!("Unexpected character: '{other}'")),
        }
    }

    Ok(tokens)
}

struct Cursor {
    tokens: Vec<Tok>,
    next: usize,
}

impl Cursor {
    fn peek(&self) -> Option<Tok> {
        self.tokens.get(self.next).copied()
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.peek();
        if tok.is_some() {
            self.next += 1;
        }
        tok
    }

    // sum = product (('+' | '-') product)*
    fn sum(&mut self) -> Result<f64, String> {
        let mut acc = self.product()?;
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Add => {
                    self.advance();
                    acc += self.product()?;
                }
                Tok::Sub => {
                    self.advance();
                    acc -= self.product()?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    // product = signed (('*' | '/') signed)*
    fn product(&mut self) -> Result<f64, String> {
        let mut acc = self.signed()?;
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Mul => {
                    self.advance();
                    acc *= self.signed()?;
                }
                Tok::Div => {
                    self.advance();
                    let divisor = self.signed()?;
                    if divisor == 0.0 {
                        return Err("Division by zero".into());
                    }
                    acc /= divisor;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    // signed = '-' signed | atom
    fn signed(&mut self) -> Result<f64, String> {
        if self.peek() == Some(Tok::Sub) {
            self.advance();
            return Ok(-self.signed()?);
        }
        self.atom()
    }

    // atom = NUMBER | '(' sum ')'
    fn atom(&mut self) -> Result<f64, String> {
        match self.advance() {
            Some(Tok::Num(n)) => Ok(n),
            Some(Tok::Open) => {
                let value = self.sum()?;
                match self.advance() {
                    Some(Tok::Close) => Ok(value),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("Unexpected token: {tok:?}")),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition() {
        assert_eq!(evaluate("2 + 3").unwrap(), 5.0);
    }

    #[test]
    fn precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
    }

    #[test]
    fn grouping() {
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn division() {
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
    }

    #[test]
    fn division_by_zero() {
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn unary_negation() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
    }

    #[test]
    fn decimals() {
        assert_eq!(evaluate("3.14 * 2").unwrap(), 6.28);
    }

    #[test]
    fn malformed_input() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("2 ^ 3").is_err());
        assert!(evaluate("(1 + 2").is_err());
    }

    #[tokio::test]
    async fn execute_formats_integers() {
        let tool = CalculatorTool;
        let obs = tool
            .execute(&serde_json::json!({"expression": "10 / 2"}))
            .await
            .unwrap();
        assert_eq!(obs, "5");
    }

    #[tokio::test]
    async fn execute_keeps_fractions() {
        let tool = CalculatorTool;
        let obs = tool
            .execute(&serde_json::json!({"expression": "10 / 3"}))
            .await
            .unwrap();
        assert!(obs.starts_with("3.333"));
    }

    #[tokio::test]
    async fn execute_reports_eval_errors_in_band() {
        let tool = CalculatorTool;
        let obs = tool
            .execute(&serde_json::json!({"expression": "1 / 0"}))
            .await
            .unwrap();
        assert_eq!(obs, "Error: Division by zero");
    }

    #[tokio::test]
    async fn execute_rejects_missing_expression() {
        let tool = CalculatorTool;
        assert!(tool.execute(&serde_json::json!({})).await.is_err());
    }
}
