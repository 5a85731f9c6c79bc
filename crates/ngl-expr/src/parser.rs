//! Precedence-climbing parser.
//!
//! Binary operators are folded by binding power; assignment and the
//! conditional operator are right-associative and handled above the binary
//! layer.

use crate::ast::{
    AssignOp, BinaryOp, Expr, Literal, LogicalOp, Program, Property, UnaryOp,
};
use crate::error::EvalError;
use crate::lexer::{Punct, Token, TokenKind, tokenize};

/// Deepest nesting of sub-expressions the parser accepts. Prefix operators,
/// brackets, assignments and each folded binary or postfix operator count
/// one level, which also bounds the depth of the resulting tree.
pub const MAX_NESTING: usize = 256;

/// Parse `source` into a [`Program`]. Empty input (or only `;`) yields an
/// empty program.
///
/// # Errors
///
/// Returns [`EvalError::Syntax`] with the byte offset of the offending token,
/// including when the input nests deeper than [`MAX_NESTING`].
pub fn parse(source: &str) -> Result<Program, EvalError> {
    let tokens = tokenize(source)?;
    Parser {
        tokens,
        pos: 0,
        depth: 0,
    }
    .program()
}

#[derive(Clone, Copy)]
enum InfixOp {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

fn infix(punct: Punct) -> Option<(u8, InfixOp)> {
    use InfixOp::{Binary, Logical};
    let entry = match punct {
        Punct::OrOr => (1, Logical(LogicalOp::Or)),
        Punct::AndAnd => (2, Logical(LogicalOp::And)),
        Punct::Eq => (3, Binary(BinaryOp::Eq)),
        Punct::NotEq => (3, Binary(BinaryOp::NotEq)),
        Punct::StrictEq => (3, Binary(BinaryOp::StrictEq)),
        Punct::StrictNotEq => (3, Binary(BinaryOp::StrictNotEq)),
        Punct::Lt => (4, Binary(BinaryOp::Lt)),
        Punct::Le => (4, Binary(BinaryOp::Le)),
        Punct::Gt => (4, Binary(BinaryOp::Gt)),
        Punct::Ge => (4, Binary(BinaryOp::Ge)),
        Punct::Plus => (5, Binary(BinaryOp::Add)),
        Punct::Minus => (5, Binary(BinaryOp::Sub)),
        Punct::Star => (6, Binary(BinaryOp::Mul)),
        Punct::Slash => (6, Binary(BinaryOp::Div)),
        Punct::Percent => (6, Binary(BinaryOp::Rem)),
        _ => return None,
    };
    Some(entry)
}

fn assign_op(punct: Punct) -> Option<AssignOp> {
    match punct {
        Punct::Assign => Some(AssignOp::Assign),
        Punct::PlusAssign => Some(AssignOp::Add),
        Punct::MinusAssign => Some(AssignOp::Sub),
        Punct::StarAssign => Some(AssignOp::Mul),
        Punct::SlashAssign => Some(AssignOp::Div),
        _ => None,
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number {n}"),
        TokenKind::String(s) => format!("string {s:?}"),
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::Punct(p) => format!("{p:?}"),
        TokenKind::Eof => "end of input".to_owned(),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token list always ends with Eof and `bump` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn peek_punct(&self) -> Option<Punct> {
        match self.peek().kind {
            TokenKind::Punct(p) => Some(p),
            _ => None,
        }
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.peek_punct() == Some(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct) -> Result<(), EvalError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {punct:?}")))
        }
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(EvalError::syntax(
                self.peek().offset,
                "expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn unexpected(&self, context: &str) -> EvalError {
        let token = self.peek();
        EvalError::syntax(
            token.offset,
            format!("{context}, found {}", describe(&token.kind)),
        )
    }

    fn program(mut self) -> Result<Program, EvalError> {
        let mut statements = Vec::new();
        loop {
            while self.eat(Punct::Semicolon) {}
            if self.peek().kind == TokenKind::Eof {
                break;
            }
            statements.push(self.expression()?);
            if self.peek().kind != TokenKind::Eof && !self.eat(Punct::Semicolon) {
                return Err(self.unexpected("expected ';' or end of input"));
            }
        }
        Ok(Program { statements })
    }

    fn expression(&mut self) -> Result<Expr, EvalError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, EvalError> {
        self.descend()?;
        let expr = self.assignment_level();
        self.ascend(1);
        expr
    }

    fn assignment_level(&mut self) -> Result<Expr, EvalError> {
        let start = self.peek().offset;
        let target = self.conditional()?;
        let Some(op) = self.peek_punct().and_then(assign_op) else {
            return Ok(target);
        };
        if !target.is_assignable() {
            return Err(EvalError::syntax(start, "invalid assignment target"));
        }
        self.pos += 1;
        let value = self.assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> Result<Expr, EvalError> {
        let test = self.binary(1)?;
        if !self.eat(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.assignment()?;
        self.expect(Punct::Colon)?;
        let alternate = self.assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn binary(&mut self, min_power: u8) -> Result<Expr, EvalError> {
        let mut left = self.unary()?;
        let mut folds = 0;
        while let Some((power, op)) = self.peek_punct().and_then(infix) {
            if power < min_power {
                break;
            }
            self.descend()?;
            folds += 1;
            self.pos += 1;
            let right = self.binary(power + 1)?;
            left = match op {
                InfixOp::Logical(op) => Expr::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                InfixOp::Binary(op) => Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }
        self.ascend(folds);
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        self.descend()?;
        let expr = self.prefix();
        self.ascend(1);
        expr
    }

    fn prefix(&mut self) -> Result<Expr, EvalError> {
        let op = match &self.peek().kind {
            TokenKind::Punct(Punct::Bang) => Some(UnaryOp::Not),
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Ident(name) if name == "typeof" => Some(UnaryOp::Typeof),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.primary()?;
        let mut folds = 0;
        loop {
            if matches!(
                self.peek_punct(),
                Some(Punct::Dot | Punct::LBracket | Punct::LParen)
            ) {
                self.descend()?;
                folds += 1;
            }
            if self.eat(Punct::Dot) {
                let token = self.bump();
                let TokenKind::Ident(name) = token.kind else {
                    return Err(EvalError::syntax(
                        token.offset,
                        "expected property name after '.'",
                    ));
                };
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Property::Named(name),
                };
            } else if self.eat(Punct::LBracket) {
                let key = self.expression()?;
                self.expect(Punct::RBracket)?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Property::Computed(Box::new(key)),
                };
            } else if self.eat(Punct::LParen) {
                let args = self.list(Punct::RParen, Self::expression)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                self.ascend(folds);
                return Ok(expr);
            }
        }
    }

    /// Comma-separated items up to `close`; a trailing comma is allowed.
    fn list<T>(
        &mut self,
        close: Punct,
        mut item: impl FnMut(&mut Self) -> Result<T, EvalError>,
    ) -> Result<Vec<T>, EvalError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(item(self)?);
            if !self.eat(Punct::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let token = self.bump();
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Literal(Literal::Number(n)),
            TokenKind::String(s) => Expr::Literal(Literal::String(s)),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Expr::Literal(Literal::Bool(true)),
                "false" => Expr::Literal(Literal::Bool(false)),
                "null" => Expr::Literal(Literal::Null),
                "undefined" => Expr::Literal(Literal::Undefined),
                _ => Expr::Identifier(name),
            },
            TokenKind::Punct(Punct::LParen) => {
                let inner = self.expression()?;
                self.expect(Punct::RParen)?;
                inner
            }
            TokenKind::Punct(Punct::LBracket) => {
                Expr::Array(self.list(Punct::RBracket, Self::expression)?)
            }
            TokenKind::Punct(Punct::LBrace) => {
                Expr::Object(self.list(Punct::RBrace, Self::property)?)
            }
            other => {
                return Err(EvalError::syntax(
                    token.offset,
                    format!("unexpected {}", describe(&other)),
                ));
            }
        };
        Ok(expr)
    }

    /// `key: value`, `"key": value`, `1: value` or shorthand `key`.
    fn property(&mut self) -> Result<(String, Expr), EvalError> {
        let token = self.bump();
        let (key, shorthand) = match token.kind {
            TokenKind::Ident(name) => (name, true),
            TokenKind::String(s) => (s, false),
            TokenKind::Number(n) => (ngl_core::format_number(n), false),
            other => {
                return Err(EvalError::syntax(
                    token.offset,
                    format!("expected property key, found {}", describe(&other)),
                ));
            }
        };
        if self.eat(Punct::Colon) {
            let value = self.expression()?;
            return Ok((key, value));
        }
        if shorthand {
            let value = Expr::Identifier(key.clone());
            return Ok((key, value));
        }
        Err(self.unexpected("expected ':' after property key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Expr {
        let mut program = parse(source).expect("parse");
        assert_eq!(program.statements.len(), 1, "{source}");
        program.statements.remove(0)
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Literal::Number(n)))
    }

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Identifier(name.to_owned()))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            single("1 + 2 * 3"),
            Expr::Binary {
                op: BinaryOp::Add,
                left: num(1.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: num(2.0),
                    right: num(3.0),
                }),
            }
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            single("a - b - c"),
            Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: ident("a"),
                    right: ident("b"),
                }),
                right: ident("c"),
            }
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(
            single("a = b += 1"),
            Expr::Assign {
                op: AssignOp::Assign,
                target: ident("a"),
                value: Box::new(Expr::Assign {
                    op: AssignOp::Add,
                    target: ident("b"),
                    value: num(1.0),
                }),
            }
        );
    }

    #[test]
    fn member_chain_and_call() {
        assert_eq!(
            single("$scope.items[0].get()"),
            Expr::Call {
                callee: Box::new(Expr::Member {
                    object: Box::new(Expr::Member {
                        object: Box::new(Expr::Member {
                            object: ident("$scope"),
                            property: Property::Named("items".into()),
                        }),
                        property: Property::Computed(num(0.0)),
                    }),
                    property: Property::Named("get".into()),
                }),
                args: vec![],
            }
        );
    }

    #[test]
    fn conditional_and_logical() {
        let expr = single("a || b ? 1 : 2");
        let Expr::Conditional { test, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*test, Expr::Logical { op: LogicalOp::Or, .. }));
    }

    #[test]
    fn typeof_is_a_prefix_operator() {
        assert_eq!(
            single("typeof x"),
            Expr::Unary {
                op: UnaryOp::Typeof,
                operand: ident("x"),
            }
        );
    }

    #[test]
    fn object_literal_forms() {
        assert_eq!(
            single("{a: 1, 'b c': 2, d,}"),
            Expr::Object(vec![
                ("a".into(), Expr::Literal(Literal::Number(1.0))),
                ("b c".into(), Expr::Literal(Literal::Number(2.0))),
                ("d".into(), Expr::Identifier("d".into())),
            ])
        );
    }

    #[test]
    fn sequences_and_empty_input() {
        assert_eq!(parse("").expect("parse").statements.len(), 0);
        assert_eq!(parse(";;").expect("parse").statements.len(), 0);
        assert_eq!(parse("a = 1; b = 2;").expect("parse").statements.len(), 2);
    }

    fn nested_too_deeply(result: Result<Program, EvalError>) -> bool {
        matches!(
            result,
            Err(EvalError::Syntax { ref message, .. }) if message == "expression nested too deeply"
        )
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        assert!(nested_too_deeply(parse(&"!".repeat(10_000))));
        assert!(nested_too_deeply(parse(&format!("{}1", "-".repeat(3_000)))));
        assert!(nested_too_deeply(parse(&"(".repeat(200_000))));
        assert!(nested_too_deeply(parse(&"[".repeat(5_000))));
        assert!(nested_too_deeply(parse(&"a=".repeat(1_000))));
        assert!(nested_too_deeply(parse(&format!("1{}", "+1".repeat(2_000)))));
        assert!(nested_too_deeply(parse(&format!("a{}", ".b".repeat(2_000)))));
        assert!(nested_too_deeply(parse(&format!("a{}", "()".repeat(2_000)))));
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let parens = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(single(&parens), Expr::Literal(Literal::Number(1.0)));
        assert!(parse(&format!("1{}", "+1".repeat(100))).is_ok());
        assert!(parse(&format!("a{}", ".b".repeat(100))).is_ok());
        assert!(parse(&format!("{}x", "!".repeat(100))).is_ok());
    }

    #[test]
    fn syntax_errors_carry_offsets() {
        assert_eq!(
            parse("1 = 2"),
            Err(EvalError::syntax(0, "invalid assignment target"))
        );
        assert!(matches!(
            parse("a +"),
            Err(EvalError::Syntax { offset: 3, .. })
        ));
        assert!(matches!(
            parse("(a"),
            Err(EvalError::Syntax { offset: 2, .. })
        ));
        assert!(matches!(
            parse("a b"),
            Err(EvalError::Syntax { offset: 2, .. })
        ));
        assert!(parse("a.1").is_err());
    }
}
