//! Label expressions.
//!
//! A label expression is a boolean formula over node labels:
//!
//! ```text
//! linux && (x86_64 || arm64) && !flaky
//! docker -> linux
//! "label with spaces" <-> gpu
//! ```
//!
//! Precedence, loosest first: `<->`, `->`, `||`, `&&`, `!`. `->` is
//! right-associative, the others are left-associative. A node always carries
//! its own name as a label, so a bare node name is also a valid expression.
//!
//! Expressions come straight from build submissions, so their depth is
//! capped at [`MAX_DEPTH`]: every `!`, `(` and binary operator on a path
//! counts as one level.

use std::fmt;

use crate::error::{NodeParamError, NodeParamResult};

/// Deepest operator nesting accepted by [`LabelExpr::parse`].
pub const MAX_DEPTH: usize = 256;

/// A parsed label expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelExpr {
    Atom(String),
    Not(Box<LabelExpr>),
    And(Box<LabelExpr>, Box<LabelExpr>),
    Or(Box<LabelExpr>, Box<LabelExpr>),
    Implies(Box<LabelExpr>, Box<LabelExpr>),
    Iff(Box<LabelExpr>, Box<LabelExpr>),
}

impl LabelExpr {
    /// Parse a label expression.
    pub fn parse(input: &str) -> NodeParamResult<Self> {
        let invalid = |reason: String| NodeParamError::InvalidLabelExpression {
            expression: input.to_string(),
            reason,
        };

        let tokens = tokenize(input).map_err(invalid)?;
        if tokens.is_empty() {
            return Err(invalid("expression is empty".to_string()));
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.iff().map_err(invalid)?;
        if let Some(tok) = parser.peek() {
            return Err(invalid(format!("unexpected {tok}")));
        }
        Ok(expr)
    }

    /// Evaluate the expression given a label membership test.
    pub fn matches<F>(&self, has_label: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            Self::Atom(label) => has_label(label),
            Self::Not(inner) => !inner.matches(has_label),
            Self::And(a, b) => a.matches(has_label) && b.matches(has_label),
            Self::Or(a, b) => a.matches(has_label) || b.matches(has_label),
            Self::Implies(a, b) => !a.matches(has_label) || b.matches(has_label),
            Self::Iff(a, b) => a.matches(has_label) == b.matches(has_label),
        }
    }

    /// Returns the atom if this expression is a single label.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(label) => Some(label),
            _ => None,
        }
    }
}

impl fmt::Display for LabelExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(label) if label.chars().all(is_atom_char) => f.write_str(label),
            Self::Atom(label) => write!(f, "\"{}\"", label.replace('"', "\\\"")),
            Self::Not(inner) => write!(f, "!{}", Paren(inner)),
            Self::And(a, b) => write!(f, "{} && {}", Paren(a), Paren(b)),
            Self::Or(a, b) => write!(f, "{} || {}", Paren(a), Paren(b)),
            Self::Implies(a, b) => write!(f, "{} -> {}", Paren(a), Paren(b)),
            Self::Iff(a, b) => write!(f, "{} <-> {}", Paren(a), Paren(b)),
        }
    }
}

/// Wraps compound sub-expressions in parentheses when displayed.
struct Paren<'a>(&'a LabelExpr);

impl fmt::Display for Paren<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            LabelExpr::Atom(_) | LabelExpr::Not(_) => write!(f, "{}", self.0),
            other => write!(f, "({other})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Atom(String),
    Not,
    And,
    Or,
    Implies,
    Iff,
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(a) => write!(f, "label '{a}'"),
            Self::Not => f.write_str("'!'"),
            Self::And => f.write_str("'&&'"),
            Self::Or => f.write_str("'||'"),
            Self::Implies => f.write_str("'->'"),
            Self::Iff => f.write_str("'<->'"),
            Self::Open => f.write_str("'('"),
            Self::Close => f.write_str("')'"),
        }
    }
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '&' | '|' | '!' | '(' | ')' | '<' | '>' | '"')
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '&' | '|' => {
                if chars.get(i + 1) != Some(&c) {
                    return Err(format!("expected '{c}{c}' at offset {i}"));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
                i += 2;
            }
            '-' if chars.get(i + 1) == Some(&'>') => {
                tokens.push(Token::Implies);
                i += 2;
            }
            '<' => {
                if chars.get(i + 1) != Some(&'-') || chars.get(i + 2) != Some(&'>') {
                    return Err(format!("expected '<->' at offset {i}"));
                }
                tokens.push(Token::Iff);
                i += 3;
            }
            '>' => return Err(format!("unexpected '>' at offset {i}")),
            '"' => {
                let start = i;
                let mut atom = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(format!("unterminated quote at offset {start}")),
                        Some('\\') if chars.get(i + 1) == Some(&'"') => {
                            atom.push('"');
                            i += 2;
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            atom.push(ch);
                            i += 1;
                        }
                    }
                }
                if atom.is_empty() {
                    return Err(format!("empty quoted label at offset {start}"));
                }
                tokens.push(Token::Atom(atom));
            }
            _ => {
                let mut atom = String::new();
                while let Some(&ch) = chars.get(i) {
                    // `a->b` is an implication, not the label "a-".
                    if !is_atom_char(ch) || (ch == '-' && chars.get(i + 1) == Some(&'>')) {
                        break;
                    }
                    atom.push(ch);
                    i += 1;
                }
                tokens.push(Token::Atom(atom));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Go one level deeper, failing past [`MAX_DEPTH`].
    fn descend(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err("expression nested too deeply".to_string());
        }
        Ok(())
    }

    fn iff(&mut self) -> Result<LabelExpr, String> {
        let base = self.depth;
        let mut lhs = self.implies()?;
        while self.eat(&Token::Iff) {
            self.descend()?;
            let rhs = self.implies()?;
            lhs = LabelExpr::Iff(Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn implies(&mut self) -> Result<LabelExpr, String> {
        let base = self.depth;
        let lhs = self.or()?;
        if self.eat(&Token::Implies) {
            self.descend()?;
            let rhs = self.implies()?;
            self.depth = base;
            return Ok(LabelExpr::Implies(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn or(&mut self) -> Result<LabelExpr, String> {
        let base = self.depth;
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            self.descend()?;
            let rhs = self.and()?;
            lhs = LabelExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn and(&mut self) -> Result<LabelExpr, String> {
        let base = self.depth;
        let mut lhs = self.not()?;
        while self.eat(&Token::And) {
            self.descend()?;
            let rhs = self.not()?;
            lhs = LabelExpr::And(Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn not(&mut self) -> Result<LabelExpr, String> {
        if self.eat(&Token::Not) {
            let base = self.depth;
            self.descend()?;
            let inner = self.not()?;
            self.depth = base;
            return Ok(LabelExpr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<LabelExpr, String> {
        let Some(tok) = self.tokens.get(self.pos).cloned() else {
            return Err("unexpected end of expression".to_string());
        };
        self.pos += 1;

        match tok {
            Token::Atom(label) => Ok(LabelExpr::Atom(label)),
            Token::Open => {
                let base = self.depth;
                self.descend()?;
                let inner = self.iff()?;
                if !self.eat(&Token::Close) {
                    return Err("missing ')'".to_string());
                }
                self.depth = base;
                Ok(inner)
            }
            other => Err(format!("unexpected {other}")),
        }
    }
}
