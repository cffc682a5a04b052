//! Marker expressions such as `unit`, `not slow` or `integration and not (slow or unit)`.
//!
//! Precedence from loosest to tightest: `or`, `and`, `not`.

use super::RunnerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerExpr {
    Marker(String),
    Not(Box<MarkerExpr>),
    And(Box<MarkerExpr>, Box<MarkerExpr>),
    Or(Box<MarkerExpr>, Box<MarkerExpr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl MarkerExpr {
    pub fn parse(input: &str) -> Result<Self, RunnerError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens,
            pos: 0,
        };

        let expr = parser.or_expr()?;
        if let Some(token) = parser.peek() {
            return Err(parser.error(format!("unexpected {token:?}")));
        }
        Ok(expr)
    }

    /// Whether a suite tagged with `markers` is selected.
    pub fn matches(&self, markers: &[String]) -> bool {
        match self {
            MarkerExpr::Marker(name) => markers.iter().any(|m| m == name),
            MarkerExpr::Not(inner) => !inner.matches(markers),
            MarkerExpr::And(lhs, rhs) => lhs.matches(markers) && rhs.matches(markers),
            MarkerExpr::Or(lhs, rhs) => lhs.matches(markers) || rhs.matches(markers),
        }
    }

    /// Every marker name the expression mentions.
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            MarkerExpr::Marker(name) => out.push(name),
            MarkerExpr::Not(inner) => inner.collect_names(out),
            MarkerExpr::And(lhs, rhs) | MarkerExpr::Or(lhs, rhs) => {
                lhs.collect_names(out);
                rhs.collect_names(out);
            }
        }
    }

    pub fn and(self, other: MarkerExpr) -> MarkerExpr {
        MarkerExpr::And(Box::new(self), Box::new(other))
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, RunnerError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(match word.as_str() {
                    "not" => Token::Not,
                    "and" => Token::And,
                    "or" => Token::Or,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(RunnerError::MarkerSyntax {
                    expr: input.to_string(),
                    reason: format!("unexpected character '{other}'"),
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn error(&self, reason: String) -> RunnerError {
        RunnerError::MarkerSyntax {
            expr: self.input.to_string(),
            reason,
        }
    }

    fn or_expr(&mut self) -> Result<MarkerExpr, RunnerError> {
        let mut expr = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            expr = MarkerExpr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<MarkerExpr, RunnerError> {
        let mut expr = self.not_expr()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.not_expr()?;
            expr = MarkerExpr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn not_expr(&mut self) -> Result<MarkerExpr, RunnerError> {
        match self.next() {
            Some(Token::Not) => Ok(MarkerExpr::Not(Box::new(self.not_expr()?))),
            Some(Token::Open) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(self.error("missing ')'".to_string())),
                }
            }
            Some(Token::Ident(name)) => Ok(MarkerExpr::Marker(name)),
            Some(token) => Err(self.error(format!("unexpected {token:?}"))),
            None => Err(self.error("unexpected end of expression".to_string())),
        }
    }
}
