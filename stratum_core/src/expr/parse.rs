// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expression parser.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr        := or ( '?' expr ':' expr )?
//! or          := and ( '||' and )*
//! and         := equality ( '&&' equality )*
//! equality    := comparison ( ( '==' | '!=' ) comparison )*
//! comparison  := additive ( ( '<' | '<=' | '>' | '>=' ) additive )*
//! additive    := term ( ( '+' | '-' ) term )*
//! term        := unary ( ( '*' | '/' | '%' ) unary )*
//! unary       := ( '-' | '!' ) unary | postfix
//! postfix     := primary ( '.' IDENT )*
//! primary     := NUMBER | IDENT | IDENT '(' args ')' | '(' expr ')'
//! ```

use thiserror::Error;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::builtins::Builtin;
use super::variant::Variant;

/// Errors produced while parsing an expression string.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A character that cannot start any token.
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset into the source.
        offset: usize,
    },
    /// A token that does not fit the grammar at this point.
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken {
        /// Description of the token found.
        found: String,
        /// Byte offset into the source.
        offset: usize,
    },
    /// The input ended in the middle of an expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    /// A call to a function that is not a built-in.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// `this` used without a recognized member.
    #[error("`this` must be followed by Target, StartingValue, FinalValue or CurrentValue (offset {offset})")]
    BareThis {
        /// Byte offset into the source.
        offset: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Punct(&'static str),
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number {n}"),
            Self::Ident(s) => format!("identifier `{s}`"),
            Self::Punct(p) => format!("`{p}`"),
            Self::End => "end of input".into(),
        }
    }
}

// Longest first so `<=` wins over `<`.
const PUNCTUATION: &[&str] = &[
    "&&", "||", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "(", ")", ",", ".", "?", ":",
    "<", ">", "!",
];

struct Lexer<'a> {
    src: &'a str,
    idx: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, idx: 0 }
    }

    /// Returns the next token and its starting offset.
    fn next_token(&mut self) -> Result<(Token, usize), ParseError> {
        let rest = &self.src[self.idx..];
        let trimmed = rest.trim_start();
        self.idx += rest.len() - trimmed.len();
        let start = self.idx;
        let Some(ch) = trimmed.chars().next() else {
            return Ok((Token::End, start));
        };

        if ch.is_ascii_digit() || (ch == '.' && trimmed[1..].starts_with(|c: char| c.is_ascii_digit())) {
            let len = trimmed
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(trimmed.len());
            let text = &trimmed[..len];
            self.idx += len;
            return text
                .parse::<f64>()
                .map(|n| (Token::Number(n), start))
                .map_err(|_| ParseError::UnexpectedToken {
                    found: format!("malformed number `{text}`"),
                    offset: start,
                });
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let len = trimmed
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(trimmed.len());
            self.idx += len;
            return Ok((Token::Ident(trimmed[..len].into()), start));
        }

        for p in PUNCTUATION {
            if trimmed.starts_with(p) {
                self.idx += p.len();
                return Ok((Token::Punct(p), start));
            }
        }
        Err(ParseError::UnexpectedChar { ch, offset: start })
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    offset: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(src);
        let (current, offset) = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            offset,
        })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let (next, offset) = self.lexer.next_token()?;
        self.offset = offset;
        Ok(core::mem::replace(&mut self.current, next))
    }

    fn eat(&mut self, punct: &str) -> Result<bool, ParseError> {
        if matches!(self.current, Token::Punct(p) if p == punct) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), ParseError> {
        if self.eat(punct)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.current {
            Token::End => ParseError::UnexpectedEnd,
            ref t => ParseError::UnexpectedToken {
                found: t.describe(),
                offset: self.offset,
            },
        }
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let condition = self.binary_level(0)?;
        if !self.eat("?")? {
            return Ok(condition);
        }
        let if_true = self.expr()?;
        self.expect(":")?;
        let if_false = self.expr()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    /// Parses one left-associative precedence level of [`LEVELS`].
    fn binary_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };
        let mut lhs = self.binary_level(level + 1)?;
        'outer: loop {
            for (punct, op) in *ops {
                if self.eat(punct)? {
                    let rhs = self.binary_level(level + 1)?;
                    lhs = Expr::Binary {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = if self.eat("-")? {
            UnaryOp::Negate
        } else if self.eat("!")? {
            UnaryOp::Not
        } else {
            return self.postfix();
        };
        let operand = self.unary()?;
        // Fold literal negation so `-1` stays a constant.
        if let (UnaryOp::Negate, Expr::Constant(Variant::Scalar(v))) = (op, &operand) {
            return Ok(Expr::Constant(Variant::Scalar(-v)));
        }
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        while self.eat(".")? {
            let Token::Ident(name) = self.advance()? else {
                return Err(self.unexpected());
            };
            expr = Expr::Member {
                object: Box::new(expr),
                name,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset;
        match self.advance()? {
            Token::Number(n) => Ok(Expr::Constant(Variant::Scalar(n))),
            Token::Punct("(") => {
                let inner = self.expr()?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Ident(name) => self.identifier(name, offset),
            Token::End => Err(ParseError::UnexpectedEnd),
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                offset,
            }),
        }
    }

    fn identifier(&mut self, name: String, offset: usize) -> Result<Expr, ParseError> {
        if name == "this" {
            if !self.eat(".")? {
                return Err(ParseError::BareThis { offset });
            }
            return match self.advance()? {
                Token::Ident(member) => match member.as_str() {
                    "Target" => Ok(Expr::Target),
                    "StartingValue" => Ok(Expr::StartingValue),
                    "FinalValue" => Ok(Expr::FinalValue),
                    "CurrentValue" => Ok(Expr::CurrentValue),
                    _ => Err(ParseError::BareThis { offset }),
                },
                _ => Err(ParseError::BareThis { offset }),
            };
        }
        if self.eat("(")? {
            let function =
                Builtin::from_name(&name).ok_or(ParseError::UnknownFunction(name))?;
            let mut args = Vec::new();
            if !self.eat(")")? {
                loop {
                    args.push(self.expr()?);
                    if self.eat(")")? {
                        break;
                    }
                    self.expect(",")?;
                }
            }
            return Ok(Expr::Call { function, args });
        }
        Ok(match name.as_str() {
            "Pi" => Expr::Constant(Variant::Scalar(core::f64::consts::PI)),
            n if n.eq_ignore_ascii_case("true") => Expr::Constant(Variant::Bool(true)),
            n if n.eq_ignore_ascii_case("false") => Expr::Constant(Variant::Bool(false)),
            _ => Expr::Parameter(name),
        })
    }
}

const LEVELS: &[&[(&str, BinaryOp)]] = &[
    &[("||", BinaryOp::Or)],
    &[("&&", BinaryOp::And)],
    &[("==", BinaryOp::Equal), ("!=", BinaryOp::NotEqual)],
    &[
        ("<=", BinaryOp::LessOrEqual),
        (">=", BinaryOp::GreaterOrEqual),
        ("<", BinaryOp::Less),
        (">", BinaryOp::Greater),
    ],
    &[("+", BinaryOp::Add), ("-", BinaryOp::Subtract)],
    &[
        ("*", BinaryOp::Multiply),
        ("/", BinaryOp::Divide),
        ("%", BinaryOp::Remainder),
    ],
];

/// Parses an expression string.
///
/// # Errors
///
/// Returns a [`ParseError`] for malformed input or calls to unknown
/// functions.
pub fn parse(src: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(src)?;
    let expr = parser.expr()?;
    if parser.current != Token::End {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ast::{EvalContext, ObjectRef, Parameters, PropertyReference, PropertySource};
    use crate::transform::Vector3;
    use crate::visual::VisualId;

    struct Fixed;

    impl PropertySource for Fixed {
        fn property(&self, object: VisualId, property: &str) -> Variant {
            match (object.0, property) {
                (1, "Offset") => Variant::Vector3(Vector3::new(10.0, 20.0, 0.0)),
                (2, "Opacity") => Variant::Scalar(0.5),
                _ => Variant::None,
            }
        }
    }

    fn eval(src: &str, params: &Parameters) -> Variant {
        let expr = parse(src).expect("expression should parse");
        expr.evaluate(&EvalContext {
            parameters: params,
            target: VisualId(1),
            properties: &Fixed,
            starting_value: Variant::Scalar(3.0),
            final_value: Variant::Scalar(7.0),
            current_value: Variant::Scalar(4.0),
        })
    }

    #[test]
    fn precedence() {
        let p = Parameters::new();
        assert_eq!(eval("1 + 2 * 3", &p), Variant::Scalar(7.0));
        assert_eq!(eval("(1 + 2) * 3", &p), Variant::Scalar(9.0));
        assert_eq!(eval("10 - 4 - 3", &p), Variant::Scalar(3.0), "left associative");
        assert_eq!(eval("-2 * -2", &p), Variant::Scalar(4.0));
        assert_eq!(eval("1 < 2 && 3 >= 3", &p), Variant::Bool(true));
    }

    #[test]
    fn conditional_and_keywords() {
        let p = Parameters::new();
        assert_eq!(
            eval("this.StartingValue < 5 ? this.FinalValue : 0", &p),
            Variant::Scalar(7.0)
        );
        assert_eq!(eval("this.CurrentValue * 2", &p), Variant::Scalar(8.0));
        assert_eq!(eval("!true || false", &p), Variant::Bool(false));
    }

    #[test]
    fn target_and_object_members() {
        let mut p = Parameters::new();
        p.set_object("other", VisualId(2));
        p.set_value("k", 2.0);
        assert_eq!(eval("this.Target.Offset.Y + k", &p), Variant::Scalar(22.0));
        assert_eq!(eval("other.Opacity * 4", &p), Variant::Scalar(2.0));
        assert!(eval("missing.Opacity", &p).is_none(), "unknown parameter");
    }

    #[test]
    fn function_calls() {
        let p = Parameters::new();
        assert_eq!(eval("Max(1, Min(5, 3))", &p), Variant::Scalar(3.0));
        assert_eq!(
            eval("Vector3(1, 2, 3).Z", &p),
            Variant::Scalar(3.0),
            "member access on a call result"
        );
    }

    #[test]
    fn references_are_collected() {
        let expr = parse("this.Target.Offset.X + other.Opacity * Lerp(a, b.Size.X, 0.5)")
            .expect("expression should parse");
        let refs: Vec<PropertyReference> = expr.references().into_iter().collect();
        assert_eq!(
            refs,
            vec![
                PropertyReference {
                    object: ObjectRef::Target,
                    property: "Offset".into(),
                },
                PropertyReference {
                    object: ObjectRef::Parameter("b".into()),
                    property: "Size".into(),
                },
                PropertyReference {
                    object: ObjectRef::Parameter("other".into()),
                    property: "Opacity".into(),
                },
            ]
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse("1 +"), Err(ParseError::UnexpectedEnd));
        assert_eq!(
            parse("Frob(1)"),
            Err(ParseError::UnknownFunction("Frob".into()))
        );
        assert_eq!(parse("this + 1"), Err(ParseError::BareThis { offset: 0 }));
        assert!(matches!(
            parse("1 # 2"),
            Err(ParseError::UnexpectedChar { ch: '#', offset: 2 })
        ));
        assert!(matches!(
            parse("1 2"),
            Err(ParseError::UnexpectedToken { offset: 2, .. })
        ));
    }
}
