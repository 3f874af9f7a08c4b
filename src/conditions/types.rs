//! core types for the condition system

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::registry::{Function, NativeMethod};

/// comparison operators supported in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// equality: ==
    Eq,
    /// inequality: !=
    Ne,
    /// greater than: >
    Gt,
    /// greater than or equal: >=
    Gte,
    /// less than: <
    Lt,
    /// less than or equal: <=
    Lte,
    /// membership: in
    In,
    /// negated membership: not in
    NotIn,
    /// identity: is (parsed, never evaluated)
    Is,
    /// negated identity: is not (parsed, never evaluated)
    IsNot,
}

impl CompareOp {
    /// parse a single-token operator
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Gte),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Lte),
            "in" => Some(CompareOp::In),
            "is" => Some(CompareOp::Is),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// boolean connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => f.write_str("and"),
            BoolOp::Or => f.write_str("or"),
        }
    }
}

/// binary arithmetic and bitwise operators, recognised only to be rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,
    LShift,
    RShift,
    BitAnd,
    BitOr,
    BitXor,
}

impl ArithOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::FloorDiv => "//",
            ArithOp::Mod => "%",
            ArithOp::Pow => "**",
            ArithOp::MatMul => "@",
            ArithOp::LShift => "<<",
            ArithOp::RShift => ">>",
            ArithOp::BitAnd => "&",
            ArithOp::BitOr => "|",
            ArithOp::BitXor => "^",
        }
    }

    /// binding strength, higher binds tighter
    fn precedence(&self) -> u8 {
        match self {
            ArithOp::BitOr => 5,
            ArithOp::BitXor => 6,
            ArithOp::BitAnd => 7,
            ArithOp::LShift | ArithOp::RShift => 8,
            ArithOp::Add | ArithOp::Sub => 9,
            ArithOp::Mul | ArithOp::Div | ArithOp::FloorDiv | ArithOp::Mod | ArithOp::MatMul => 10,
            ArithOp::Pow => 12,
        }
    }
}

/// unary arithmetic operators, recognised only to be rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryArithOp {
    Neg,
    Pos,
    Invert,
}

impl UnaryArithOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryArithOp::Neg => "-",
            UnaryArithOp::Pos => "+",
            UnaryArithOp::Invert => "~",
        }
    }
}

/// which bracket produced an ordered sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    List,
    Tuple,
}

/// expression forms that parse but are never evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    Subscript,
    Conditional,
    Lambda,
    NamedExpression,
    KeywordArgument,
    StarredArgument,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Construct::Subscript => "subscript",
            Construct::Conditional => "conditional expression",
            Construct::Lambda => "lambda",
            Construct::NamedExpression => "assignment expression",
            Construct::KeywordArgument => "keyword argument",
            Construct::StarredArgument => "starred argument",
        };
        f.write_str(name)
    }
}

/// runtime type of a [`Value`], keys the per-type method allowlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Str,
    None,
    List,
    Tuple,
    Set,
    Function,
    Method,
    Match,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::None => "NoneType",
            ValueType::List => "list",
            ValueType::Tuple => "tuple",
            ValueType::Set => "set",
            ValueType::Function => "builtin_function_or_method",
            ValueType::Method => "method",
            ValueType::Match => "re.Match",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// a registry function exposed as a value
#[derive(Clone)]
pub struct Callable {
    /// qualified name, e.g. `len` or `re.match`
    pub name: String,
    pub(crate) function: Arc<Function>,
}

impl Callable {
    pub(crate) fn new(name: impl Into<String>, function: Arc<Function>) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }

    pub fn is_callable(&self) -> bool {
        self.function.is_callable()
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.name)
    }
}

/// a registry method bound to its receiver
#[derive(Clone)]
pub struct BoundMethod {
    pub receiver: Box<Value>,
    pub name: String,
    pub(crate) method: NativeMethod,
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundMethod({:?}.{})", self.receiver, self.name)
    }
}

/// result of a successful `re.match`
#[derive(Debug, Clone, PartialEq)]
pub struct RegexMatch {
    /// char offsets of the match in the subject
    pub span: (usize, usize),
    pub text: String,
}

/// a runtime datum
///
/// `PartialEq` is structural (used for tree comparison); condition
/// semantics go through [`Value::equals`] and [`Value::compare`].
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    None,
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// elements are unique under [`Value::equals`]
    Set(Vec<Value>),
    Callable(Callable),
    BoundMethod(BoundMethod),
    /// always truthy, equal to nothing but itself
    Match(RegexMatch),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b))
            | (Value::Tuple(a), Value::Tuple(b))
            | (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a.name == b.name,
            (Value::BoundMethod(a), Value::BoundMethod(b)) => {
                a.name == b.name && a.receiver == b.receiver
            }
            (Value::Match(a), Value::Match(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// build a set, dropping elements equal to an earlier one
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.iter().any(|u| u.equals(&item)) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::None => ValueType::None,
            Value::List(_) => ValueType::List,
            Value::Tuple(_) => ValueType::Tuple,
            Value::Set(_) => ValueType::Set,
            Value::Callable(_) => ValueType::Function,
            Value::BoundMethod(_) => ValueType::Method,
            Value::Match(_) => ValueType::Match,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    /// try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// try to get as integer (bools count as 0/1)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// elements of a list, tuple or set
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// check if value is truthy: zero, empty and None are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::None => false,
            Value::List(l) | Value::Tuple(l) | Value::Set(l) => !l.is_empty(),
            Value::Callable(_) | Value::BoundMethod(_) | Value::Match(_) => true,
        }
    }

    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// condition equality; incompatible types are unequal, never an error
    pub fn equals(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.partial_cmp(&b) == Some(Ordering::Equal);
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
            }
            (Value::Set(a), Value::Set(b)) => a.len() == b.len() && is_subset(a, b),
            (Value::Callable(a), Value::Callable(b)) => a.name == b.name,
            (Value::BoundMethod(a), Value::BoundMethod(b)) => {
                a.name == b.name && a.receiver.equals(&b.receiver)
            }
            _ => false,
        }
    }

    /// ordering between comparable values; `None` when unordered
    ///
    /// sets are partially ordered by inclusion and go through
    /// [`Value::ordered`] instead.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !x.equals(y) {
                        return x.compare(y);
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// evaluate an ordering operator; unordered pairs are simply false
    pub fn ordered(&self, op: CompareOp, other: &Value) -> bool {
        if let (Value::Set(a), Value::Set(b)) = (self, other) {
            return match op {
                CompareOp::Lte => is_subset(a, b),
                CompareOp::Lt => a.len() < b.len() && is_subset(a, b),
                CompareOp::Gte => is_subset(b, a),
                CompareOp::Gt => b.len() < a.len() && is_subset(b, a),
                _ => false,
            };
        }
        match (op, self.compare(other)) {
            (CompareOp::Lt, Some(o)) => o == Ordering::Less,
            (CompareOp::Lte, Some(o)) => o != Ordering::Greater,
            (CompareOp::Gt, Some(o)) => o == Ordering::Greater,
            (CompareOp::Gte, Some(o)) => o != Ordering::Less,
            _ => false,
        }
    }

    /// membership test with `self` as the container
    ///
    /// returns `None` when `self` is not a container.
    pub fn contains(&self, needle: &Value) -> Option<bool> {
        match self {
            Value::Str(haystack) => Some(match needle {
                Value::Str(n) => haystack.contains(n.as_str()),
                _ => false,
            }),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
                Some(items.iter().any(|item| item.equals(needle)))
            }
            _ => None,
        }
    }

    /// string conversion used by `str()`: strings stay raw, the rest use repr
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// source-like representation
    pub fn repr(&self) -> String {
        match self {
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => quote_str(s),
            Value::None => "None".to_string(),
            Value::List(items) => format!("[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_repr(items)),
            Value::Set(items) if items.is_empty() => "set()".to_string(),
            Value::Set(items) => format!("{{{}}}", join_repr(items)),
            Value::Callable(c) if c.is_callable() => {
                format!("<built-in function {}>", c.name)
            }
            Value::Callable(c) => format!("<module '{}'>", c.name),
            Value::BoundMethod(m) => format!(
                "<built-in method {} of {} object>",
                m.name,
                m.receiver.type_name()
            ),
            Value::Match(m) => format!(
                "<re.Match object; span=({}, {}), match={}>",
                m.span.0,
                m.span.1,
                quote_str(&m.text)
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            (Number::Int(a), Number::Float(b)) => cmp_int_float(*a, *b),
            (Number::Float(a), Number::Int(b)) => cmp_int_float(*b, *a).map(Ordering::reverse),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(b),
        }
    }
}

/// exact comparison; casting the int to f64 would round above 2^53
fn cmp_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63, the first float past i64::MAX
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return None;
    }
    if float >= BOUND {
        return Some(Ordering::Less);
    }
    if float < -BOUND {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        ordering => Some(ordering),
    }
}

fn is_subset(a: &[Value], b: &[Value]) -> bool {
    a.iter().all(|x| b.iter().any(|y| x.equals(y)))
}

fn join_repr(items: &[Value]) -> String {
    items
        .iter()
        .map(Value::repr)
        .collect::<Vec<_>>()
        .join(", ")
}

/// shortest round-trip float text, exponent form outside [1e-4, 1e16)
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let text = format!("{:e}", f);
        return match text.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            None => text,
        };
    }

    let text = f.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

/// quote a string, preferring single quotes
pub(crate) fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// the condition AST - represents a parsed condition
///
/// trees are immutable and can be shared across threads and evaluations.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Value),
    Identifier(String),
    /// logical negation
    Not(Box<Node>),
    /// `a and b and c` / `a or b or c`, at least two operands
    BoolChain { op: BoolOp, operands: Vec<Node> },
    /// `a < b <= c`, at least one (op, operand) pair
    CompareChain {
        first: Box<Node>,
        rest: Vec<(CompareOp, Node)>,
    },
    Call { callee: Box<Node>, args: Vec<Node> },
    Attribute { base: Box<Node>, name: String },
    Sequence {
        kind: SequenceKind,
        elements: Vec<Node>,
    },
    Set(Vec<Node>),
    /// rejected at evaluation
    BinaryArith {
        op: ArithOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// rejected at evaluation
    UnaryArith { op: UnaryArithOp, operand: Box<Node> },
    /// rejected at evaluation; also read by the literal context parser
    Dict(Vec<(Node, Node)>),
    /// rejected at evaluation, keeps its source text for display
    Rejected { construct: Construct, source: String },
}

impl Node {
    pub fn literal(value: impl Into<Value>) -> Self {
        Node::Literal(value.into())
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Node::Identifier(name.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Node) -> Self {
        Node::Not(Box::new(operand))
    }

    pub fn compare(first: Node, op: CompareOp, second: Node) -> Self {
        Node::CompareChain {
            first: Box::new(first),
            rest: vec![(op, second)],
        }
    }

    pub fn attribute(base: Node, name: impl Into<String>) -> Self {
        Node::Attribute {
            base: Box::new(base),
            name: name.into(),
        }
    }

    pub fn call(callee: Node, args: Vec<Node>) -> Self {
        Node::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// nesting depth of the tree, a leaf is 1
    pub fn depth(&self) -> usize {
        let children = match self {
            Node::Literal(_) | Node::Identifier(_) | Node::Rejected { .. } => return 1,
            Node::Not(inner) => inner.depth(),
            Node::BoolChain { operands, .. } => max_depth(operands.iter()),
            Node::CompareChain { first, rest } => {
                first.depth().max(max_depth(rest.iter().map(|(_, n)| n)))
            }
            Node::Call { callee, args } => callee.depth().max(max_depth(args.iter())),
            Node::Attribute { base, .. } => base.depth(),
            Node::Sequence { elements, .. } | Node::Set(elements) => max_depth(elements.iter()),
            Node::BinaryArith { left, right, .. } => left.depth().max(right.depth()),
            Node::UnaryArith { operand, .. } => operand.depth(),
            Node::Dict(entries) => max_depth(entries.iter().flat_map(|(k, v)| [k, v])),
        };
        children + 1
    }

    /// binding strength used to decide where display needs parentheses
    fn precedence(&self) -> u8 {
        match self {
            Node::Rejected {
                construct: Construct::Conditional | Construct::Lambda | Construct::NamedExpression,
                ..
            } => 0,
            Node::BoolChain { op: BoolOp::Or, .. } => 1,
            Node::BoolChain { op: BoolOp::And, .. } => 2,
            Node::Not(_) => 3,
            Node::CompareChain { .. } => 4,
            Node::BinaryArith { op, .. } => op.precedence(),
            Node::UnaryArith { .. } => 11,
            _ => 13,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn max_depth<'a>(nodes: impl Iterator<Item = &'a Node>) -> usize {
    nodes.map(Node::depth).max().unwrap_or(0)
}

fn fmt_list(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, n) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", n)?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(v) => write!(f, "{}", v),
            Node::Identifier(name) => f.write_str(name),
            Node::Not(inner) => {
                write!(f, "not ")?;
                inner.fmt_operand(f, 3)
            }
            Node::BoolChain { op, operands } => {
                let min = self.precedence() + 1;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op)?;
                    }
                    operand.fmt_operand(f, min)?;
                }
                Ok(())
            }
            Node::CompareChain { first, rest } => {
                first.fmt_operand(f, 5)?;
                for (op, operand) in rest {
                    write!(f, " {} ", op)?;
                    operand.fmt_operand(f, 5)?;
                }
                Ok(())
            }
            Node::Call { callee, args } => {
                callee.fmt_operand(f, 13)?;
                write!(f, "(")?;
                fmt_list(f, args)?;
                write!(f, ")")
            }
            Node::Attribute { base, name } => {
                // `1.lower` would lex as a float
                if matches!(**base, Node::Literal(Value::Int(_))) {
                    write!(f, "({}).{}", base, name)
                } else {
                    base.fmt_operand(f, 13)?;
                    write!(f, ".{}", name)
                }
            }
            Node::Sequence {
                kind: SequenceKind::List,
                elements,
            } => {
                write!(f, "[")?;
                fmt_list(f, elements)?;
                write!(f, "]")
            }
            Node::Sequence {
                kind: SequenceKind::Tuple,
                elements,
            } => {
                write!(f, "(")?;
                fmt_list(f, elements)?;
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Node::Set(elements) => {
                write!(f, "{{")?;
                fmt_list(f, elements)?;
                write!(f, "}}")
            }
            Node::BinaryArith { op, left, right } => {
                let prec = op.precedence();
                // `**` is right-associative and binds a unary right operand
                let (lmin, rmin) = if *op == ArithOp::Pow {
                    (prec + 1, prec - 1)
                } else {
                    (prec, prec + 1)
                };
                left.fmt_operand(f, lmin)?;
                write!(f, " {} ", op.as_str())?;
                right.fmt_operand(f, rmin)
            }
            Node::UnaryArith { op, operand } => {
                write!(f, "{}", op.as_str())?;
                operand.fmt_operand(f, 11)
            }
            Node::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Node::Rejected { source, .. } => f.write_str(source),
        }
    }
}
