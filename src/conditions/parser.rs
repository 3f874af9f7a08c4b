//! condition parser - converts a condition string into a syntax tree
//!
//! precedence, lowest first:
//! - conditional / lambda (parsed, rejected at evaluation)
//! - `or`, `and` (chains)
//! - `not`
//! - comparison chains: `==`, `!=`, `<`, `<=`, `>`, `>=`, `in`, `not in`,
//!   `is`, `is not`
//! - `|`, `^`, `&`, shifts, `+ -`, `* / // % @`, unary `- + ~`, `**`
//!   (parsed, rejected at evaluation)
//! - attribute access, calls and subscripts
//! - literals, names, parenthesised expressions, tuples, lists, sets, dicts
//!
//! statement-level syntax (assignment, `import`, `def`, ...) never parses.

use super::error::{ConditionError, Result};
use super::lexer::{tokenize, Token, TokenKind};
use super::types::{
    ArithOp, BoolOp, CompareOp, Construct, Node, SequenceKind, UnaryArithOp, Value,
};

/// default bound on expression nesting, shared by parser and evaluator
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// reserved words that can never be identifiers
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// binary operator levels from loosest to tightest
const BINARY_LEVELS: &[&[(&str, ArithOp)]] = &[
    &[("|", ArithOp::BitOr)],
    &[("^", ArithOp::BitXor)],
    &[("&", ArithOp::BitAnd)],
    &[("<<", ArithOp::LShift), (">>", ArithOp::RShift)],
    &[("+", ArithOp::Add), ("-", ArithOp::Sub)],
    &[
        ("*", ArithOp::Mul),
        ("/", ArithOp::Div),
        ("//", ArithOp::FloorDiv),
        ("%", ArithOp::Mod),
        ("@", ArithOp::MatMul),
    ],
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// parse a condition with the default nesting limit
pub fn parse(condition: &str) -> Result<Node> {
    parse_with_limit(condition, DEFAULT_MAX_DEPTH)
}

/// parse a condition, rejecting nesting deeper than `max_depth`
pub fn parse_with_limit(condition: &str, max_depth: usize) -> Result<Node> {
    let tokens = tokenize(condition)?;
    let mut parser = Parser {
        source: condition,
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let node = parser.parse_root()?;
    tracing::trace!(condition, tree = %node, "parsed condition");
    Ok(node)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    // ------------------------------------------------------------------
    // token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let i = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[i].kind
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn at_op(&self, op: &str) -> bool {
        matches!(self.peek(), TokenKind::Op(o) if *o == op)
    }

    fn at_name(&self, name: &str) -> bool {
        matches!(self.peek(), TokenKind::Name(n) if n == name)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_name(&mut self, name: &str) -> bool {
        if self.at_name(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{}'", op)))
        }
    }

    fn error(&self, message: impl Into<String>) -> ConditionError {
        ConditionError::bad_syntax(message, self.source)
    }

    fn unexpected(&self, hint: &str) -> ConditionError {
        let token = self.current();
        let column = self.source[..token.start].chars().count() + 1;
        let found = match &token.kind {
            TokenKind::Eof => "unexpected end of condition".to_string(),
            TokenKind::Newline => format!("unexpected newline at column {}", column),
            _ => format!(
                "unexpected '{}' at column {}",
                &self.source[token.start..token.end],
                column
            ),
        };
        if hint.is_empty() {
            self.error(found)
        } else {
            self.error(format!("{} ({})", found, hint))
        }
    }

    /// source text from `start` up to the end of the last consumed token
    fn text_from(&self, start: usize) -> String {
        let end = self.tokens[self.pos.saturating_sub(1)].end.max(start);
        self.source[start..end].to_string()
    }

    fn too_deep(&self) -> ConditionError {
        self.error(format!(
            "expression nesting exceeds the maximum depth of {}",
            self.max_depth
        ))
    }

    /// guards parser recursion
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.too_deep());
        }
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// rejects a tree deeper than the evaluator will walk; the loops that
    /// grow a tree without recursing call this on every step
    fn bounded(&self, node: Node) -> Result<Node> {
        if node.depth() > self.max_depth {
            return Err(self.too_deep());
        }
        Ok(node)
    }

    // ------------------------------------------------------------------
    // grammar
    // ------------------------------------------------------------------

    fn parse_root(&mut self) -> Result<Node> {
        if matches!(self.peek(), TokenKind::Eof) {
            return Err(self.error("empty condition"));
        }

        let node = self.parse_expression_list()?;
        let node = self.bounded(node)?;

        while matches!(self.peek(), TokenKind::Newline) {
            self.advance();
        }
        if !matches!(self.peek(), TokenKind::Eof) {
            if self.at_op("=") {
                return Err(self.unexpected("assignment is not allowed in a condition"));
            }
            return Err(self.unexpected(""));
        }
        Ok(node)
    }

    /// `a, b, c` without brackets is a tuple
    fn parse_expression_list(&mut self) -> Result<Node> {
        let first = self.parse_test()?;
        if !self.at_op(",") {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.eat_op(",") {
            if matches!(self.peek(), TokenKind::Eof | TokenKind::Newline) {
                break;
            }
            elements.push(self.parse_test()?);
        }
        Ok(Node::Sequence {
            kind: SequenceKind::Tuple,
            elements,
        })
    }

    fn parse_test(&mut self) -> Result<Node> {
        self.nested(|p| {
            let start = p.current().start;
            if p.eat_name("lambda") {
                return p.parse_lambda(start);
            }

            let node = p.parse_or()?;
            if p.eat_name("if") {
                p.parse_or()?;
                if !p.eat_name("else") {
                    return Err(p.unexpected("expected 'else'"));
                }
                p.parse_test()?;
                return Ok(Node::Rejected {
                    construct: Construct::Conditional,
                    source: p.text_from(start),
                });
            }
            p.bounded(node)
        })
    }

    fn parse_lambda(&mut self, start: usize) -> Result<Node> {
        // parameters are skipped up to the body separator
        while !self.at_op(":") {
            if matches!(self.peek(), TokenKind::Eof | TokenKind::Newline) {
                return Err(self.unexpected("expected ':'"));
            }
            self.advance();
        }
        self.advance();
        self.parse_test()?;
        Ok(Node::Rejected {
            construct: Construct::Lambda,
            source: self.text_from(start),
        })
    }

    /// an element inside brackets or call arguments, may be `name := value`
    fn parse_named(&mut self) -> Result<Node> {
        let start = self.current().start;
        let node = self.parse_test()?;
        if self.eat_op(":=") {
            if !matches!(node, Node::Identifier(_)) {
                return Err(self.error("cannot use assignment expressions with this target"));
            }
            self.parse_test()?;
            return Ok(Node::Rejected {
                construct: Construct::NamedExpression,
                source: self.text_from(start),
            });
        }
        Ok(node)
    }

    fn parse_or(&mut self) -> Result<Node> {
        self.parse_bool_chain(BoolOp::Or)
    }

    fn parse_bool_chain(&mut self, op: BoolOp) -> Result<Node> {
        let (keyword, next) = match op {
            BoolOp::Or => ("or", Some(BoolOp::And)),
            BoolOp::And => ("and", None),
        };
        let operand = |p: &mut Self| match next {
            Some(inner) => p.parse_bool_chain(inner),
            None => p.parse_not(),
        };

        let first = operand(self)?;
        if !self.at_name(keyword) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.eat_name(keyword) {
            operands.push(operand(self)?);
        }
        Ok(Node::BoolChain { op, operands })
    }

    fn parse_not(&mut self) -> Result<Node> {
        if self.eat_name("not") {
            return self.nested(|p| Ok(Node::Not(Box::new(p.parse_not()?))));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node> {
        let first = self.parse_binary(0)?;

        let mut rest = Vec::new();
        while let Some(op) = self.eat_compare_op()? {
            rest.push((op, self.parse_binary(0)?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Node::CompareChain {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn eat_compare_op(&mut self) -> Result<Option<CompareOp>> {
        let op = match self.peek() {
            TokenKind::Op(o) => match CompareOp::parse(o) {
                Some(op) => op,
                None => return Ok(None),
            },
            TokenKind::Name(n) if n == "in" => CompareOp::In,
            TokenKind::Name(n) if n == "is" => {
                if matches!(self.peek_at(1), TokenKind::Name(m) if m == "not") {
                    self.advance();
                    CompareOp::IsNot
                } else {
                    CompareOp::Is
                }
            }
            TokenKind::Name(n) if n == "not" => {
                if !matches!(self.peek_at(1), TokenKind::Name(m) if m == "in") {
                    return Err(self.unexpected(""));
                }
                self.advance();
                CompareOp::NotIn
            }
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(op))
    }

    fn parse_binary(&mut self, level: usize) -> Result<Node> {
        let Some(ops) = BINARY_LEVELS.get(level) else {
            return self.parse_factor();
        };

        let mut left = self.parse_binary(level + 1)?;
        loop {
            let op = match self.peek() {
                TokenKind::Op(o) => ops.iter().find(|(text, _)| text == o).map(|(_, op)| *op),
                _ => None,
            };
            let Some(op) = op else {
                return Ok(left);
            };
            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = self.bounded(Node::BinaryArith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })?;
        }
    }

    fn parse_factor(&mut self) -> Result<Node> {
        let op = match self.peek() {
            TokenKind::Op("-") => UnaryArithOp::Neg,
            TokenKind::Op("+") => UnaryArithOp::Pos,
            TokenKind::Op("~") => UnaryArithOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        self.nested(|p| {
            Ok(Node::UnaryArith {
                op,
                operand: Box::new(p.parse_factor()?),
            })
        })
    }

    fn parse_power(&mut self) -> Result<Node> {
        let base = self.parse_postfix()?;
        if !self.eat_op("**") {
            return Ok(base);
        }
        self.nested(|p| {
            Ok(Node::BinaryArith {
                op: ArithOp::Pow,
                left: Box::new(base),
                right: Box::new(p.parse_factor()?),
            })
        })
    }

    fn parse_postfix(&mut self) -> Result<Node> {
        let start = self.current().start;
        let mut node = self.parse_atom()?;
        // after a subscript the rest of the chain belongs to the rejected text
        let mut subscripted = false;

        loop {
            if self.eat_op(".") {
                let name = match self.peek() {
                    TokenKind::Name(name) if !is_keyword(name) => name.clone(),
                    _ => return Err(self.unexpected("expected attribute name")),
                };
                self.advance();
                if !subscripted {
                    node = self.bounded(Node::Attribute {
                        base: Box::new(node),
                        name,
                    })?;
                }
            } else if self.eat_op("(") {
                let args = self.parse_call_args()?;
                if !subscripted {
                    node = self.bounded(Node::Call {
                        callee: Box::new(node),
                        args,
                    })?;
                }
            } else if self.eat_op("[") {
                self.skip_subscript()?;
                subscripted = true;
            } else {
                break;
            }
        }

        if subscripted {
            return Ok(Node::Rejected {
                construct: Construct::Subscript,
                source: self.text_from(start),
            });
        }
        Ok(node)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Node>> {
        let mut args = Vec::new();
        while !self.eat_op(")") {
            let start = self.current().start;
            let arg = if self.eat_op("*") || self.eat_op("**") {
                self.parse_test()?;
                Node::Rejected {
                    construct: Construct::StarredArgument,
                    source: self.text_from(start),
                }
            } else if matches!(self.peek(), TokenKind::Name(_))
                && matches!(self.peek_at(1), TokenKind::Op("="))
            {
                self.advance();
                self.advance();
                self.parse_test()?;
                Node::Rejected {
                    construct: Construct::KeywordArgument,
                    source: self.text_from(start),
                }
            } else {
                let arg = self.parse_named()?;
                self.reject_comprehension()?;
                arg
            };
            args.push(arg);

            if !self.eat_op(",") {
                self.expect_op(")")?;
                break;
            }
        }
        Ok(args)
    }

    fn skip_subscript(&mut self) -> Result<()> {
        while !self.eat_op("]") {
            if self.eat_op(":") || self.eat_op(",") {
                continue;
            }
            if matches!(self.peek(), TokenKind::Eof) {
                return Err(self.unexpected("expected ']'"));
            }
            self.parse_test()?;
        }
        Ok(())
    }

    fn reject_comprehension(&self) -> Result<()> {
        if self.at_name("for") || self.at_name("async") {
            return Err(ConditionError::unsupported(
                "comprehensions are not supported",
            ));
        }
        Ok(())
    }

    fn parse_atom(&mut self) -> Result<Node> {
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Node::Literal(Value::Int(n)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Node::Literal(Value::Float(f)))
            }
            TokenKind::Str(first) => {
                self.advance();
                // adjacent string literals concatenate
                let mut value = first;
                while let TokenKind::Str(next) = self.peek() {
                    value.push_str(next);
                    self.advance();
                }
                Ok(Node::Literal(Value::Str(value)))
            }
            TokenKind::Name(name) => {
                let node = match name.as_str() {
                    "True" => Node::Literal(Value::Bool(true)),
                    "False" => Node::Literal(Value::Bool(false)),
                    "None" => Node::Literal(Value::None),
                    n if is_keyword(n) => return Err(self.unexpected("")),
                    _ => Node::Identifier(name.clone()),
                };
                self.advance();
                Ok(node)
            }
            TokenKind::Op("(") => {
                self.advance();
                self.parse_parenthesized()
            }
            TokenKind::Op("[") => {
                self.advance();
                let elements = self.parse_elements("]")?;
                Ok(Node::Sequence {
                    kind: SequenceKind::List,
                    elements,
                })
            }
            TokenKind::Op("{") => {
                self.advance();
                self.parse_braces()
            }
            _ => Err(self.unexpected("")),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Node> {
        if self.eat_op(")") {
            return Ok(Node::Sequence {
                kind: SequenceKind::Tuple,
                elements: vec![],
            });
        }

        let first = self.parse_named()?;
        self.reject_comprehension()?;
        if self.eat_op(")") {
            return Ok(first);
        }
        if !self.eat_op(",") {
            return Err(self.unexpected("expected ',' or ')'"));
        }

        let mut elements = vec![first];
        elements.extend(self.parse_elements(")")?);
        Ok(Node::Sequence {
            kind: SequenceKind::Tuple,
            elements,
        })
    }

    /// comma-separated elements up to `close`, trailing comma allowed
    fn parse_elements(&mut self, close: &str) -> Result<Vec<Node>> {
        let mut elements = Vec::new();
        while !self.eat_op(close) {
            elements.push(self.parse_named()?);
            self.reject_comprehension()?;
            if !self.eat_op(",") {
                self.expect_op(close)?;
                break;
            }
        }
        Ok(elements)
    }

    /// `{}` is an empty dict, `{k: v}` a dict, `{a, b}` a set
    fn parse_braces(&mut self) -> Result<Node> {
        if self.eat_op("}") {
            return Ok(Node::Dict(vec![]));
        }

        let first = self.parse_named()?;
        if !self.eat_op(":") {
            self.reject_comprehension()?;
            let mut elements = vec![first];
            if self.eat_op(",") {
                elements.extend(self.parse_elements("}")?);
            } else {
                self.expect_op("}")?;
            }
            return Ok(Node::Set(elements));
        }

        let value = self.parse_test()?;
        self.reject_comprehension()?;
        let mut entries = vec![(first, value)];
        while self.eat_op(",") {
            if self.eat_op("}") {
                return Ok(Node::Dict(entries));
            }
            let key = self.parse_test()?;
            self.expect_op(":")?;
            entries.push((key, self.parse_test()?));
        }
        self.expect_op("}")?;
        Ok(Node::Dict(entries))
    }
}
