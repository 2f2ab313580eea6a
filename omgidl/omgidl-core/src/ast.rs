//! Typed AST for OMG IDL compilation units.
//!
//! Every node owns its children. Nodes are built once by the parser; the
//! semantic passes only fill in [`NamedType::target`] and
//! [`ConstExpr::value`], each at most once.

use std::fmt::{Display, Formatter, Result};

use crate::{id::DefId, span::Span, value::EvaluatedConstant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.name)
    }
}

/// `a::b::c`, or `::a::b` when absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedName {
    pub segments: Vec<Identifier>,
    pub absolute: bool,
    pub span: Span,
}

impl ScopedName {
    pub fn first(&self) -> &Identifier {
        &self.segments[0]
    }

    pub fn last(&self) -> &Identifier {
        &self.segments[self.segments.len() - 1]
    }
}

impl Display for ScopedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.absolute {
            f.write_str("::")?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            f.write_str(&segment.name)?;
        }
        Ok(())
    }
}

/// Compilation unit root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Specification {
    pub imports: Vec<Import>,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    Scope(ScopedName),
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub target: ImportTarget,
    pub span: Span,
}

// ── annotations ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationParams {
    None,
    Single(ConstExpr),
    Named(Vec<(Identifier, ConstExpr)>),
}

/// `@name`, `@name(expr)` or `@name(key = expr, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: ScopedName,
    pub params: AnnotationParams,
    pub span: Span,
}

impl Annotation {
    /// Unqualified annotation name, e.g. `key` for `@key`.
    pub fn simple_name(&self) -> &str {
        &self.name.last().name
    }

    /// The single positional parameter, or the one named `value`.
    pub fn value(&self) -> Option<&ConstExpr> {
        match &self.params {
            AnnotationParams::Single(expr) => Some(expr),
            AnnotationParams::Named(params) => params
                .iter()
                .find(|(name, _)| name.name == "value")
                .map(|(_, expr)| expr),
            AnnotationParams::None => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut ConstExpr> {
        match &mut self.params {
            AnnotationParams::Single(expr) => Some(expr),
            AnnotationParams::Named(params) => params
                .iter_mut()
                .find(|(name, _)| name.name == "value")
                .map(|(_, expr)| expr),
            AnnotationParams::None => None,
        }
    }
}

pub fn find_annotation<'a>(annotations: &'a [Annotation], name: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.simple_name() == name)
}

// ── definitions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub annotations: Vec<Annotation>,
    pub kind: DefinitionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionKind {
    Module(Module),
    Struct(StructType),
    Union(UnionType),
    Enum(EnumType),
    Bitset(BitsetType),
    Bitmask(BitmaskType),
    Typedef(Typedef),
    Const(ConstDecl),
    Exception(Exception),
    Native(Identifier),
    Forward(ForwardDecl),
    Interface(Interface),
    ValueType(ValueType),
    ValueBox(ValueBox),
    Event(ValueType),
    Component(Component),
    Home(Home),
    TypeId(TypeIdDecl),
    TypePrefix(TypePrefixDecl),
    Annotation(AnnotationDecl),
}

impl DefinitionKind {
    /// The identifier this definition introduces, if it introduces exactly one.
    pub fn name(&self) -> Option<&Identifier> {
        match self {
            DefinitionKind::Module(m) => Some(&m.name),
            DefinitionKind::Struct(s) => Some(&s.name),
            DefinitionKind::Union(u) => Some(&u.name),
            DefinitionKind::Enum(e) => Some(&e.name),
            DefinitionKind::Bitset(b) => Some(&b.name),
            DefinitionKind::Bitmask(b) => Some(&b.name),
            DefinitionKind::Const(c) => Some(&c.name),
            DefinitionKind::Exception(e) => Some(&e.name),
            DefinitionKind::Native(name) => Some(name),
            DefinitionKind::Forward(f) => Some(&f.name),
            DefinitionKind::Interface(i) => Some(&i.name),
            DefinitionKind::ValueType(v) | DefinitionKind::Event(v) => Some(&v.name),
            DefinitionKind::ValueBox(v) => Some(&v.name),
            DefinitionKind::Component(c) => Some(&c.name),
            DefinitionKind::Home(h) => Some(&h.name),
            DefinitionKind::Annotation(a) => Some(&a.name),
            DefinitionKind::Typedef(_) | DefinitionKind::TypeId(_) | DefinitionKind::TypePrefix(_) => {
                None
            }
        }
    }
}

/// `module X { ... };` Modules with the same name in one scope merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: Identifier,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: Identifier,
    pub base: Option<NamedType>,
    pub members: Vec<Member>,
    pub span: Span,
}

/// One member statement; may declare several names of the same type.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub annotations: Vec<Annotation>,
    pub ty: TypeSpec,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declarator {
    Simple(Identifier),
    Array(Identifier, Vec<ConstExpr>),
}

impl Declarator {
    pub fn name(&self) -> &Identifier {
        match self {
            Declarator::Simple(name) | Declarator::Array(name, _) => name,
        }
    }

    pub fn dims(&self) -> &[ConstExpr] {
        match self {
            Declarator::Simple(_) => &[],
            Declarator::Array(_, dims) => dims,
        }
    }

    pub fn dims_mut(&mut self) -> &mut [ConstExpr] {
        match self {
            Declarator::Simple(_) => &mut [],
            Declarator::Array(_, dims) => dims,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub name: Identifier,
    pub discriminant: SwitchType,
    pub cases: Vec<UnionCase>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchType {
    pub annotations: Vec<Annotation>,
    pub ty: TypeSpec,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionCase {
    pub labels: Vec<CaseLabel>,
    pub element: ElementSpec,
    pub span: Span,
}

impl UnionCase {
    pub fn is_default(&self) -> bool {
        self.labels
            .iter()
            .any(|label| matches!(label, CaseLabel::Default(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseLabel {
    Value(ConstExpr),
    Default(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementSpec {
    pub annotations: Vec<Annotation>,
    pub ty: TypeSpec,
    pub declarator: Declarator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: Identifier,
    /// Declaration order defines the ordinals (0-based).
    pub enumerators: Vec<Enumerator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator {
    pub annotations: Vec<Annotation>,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitsetType {
    pub name: Identifier,
    pub base: Option<NamedType>,
    pub bitfields: Vec<Bitfield>,
    pub span: Span,
}

/// `bitfield<width[, type]> names;` with no names for anonymous padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitfield {
    pub annotations: Vec<Annotation>,
    pub width: ConstExpr,
    pub ty: Option<PrimitiveKind>,
    pub names: Vec<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitmaskType {
    pub name: Identifier,
    pub values: Vec<BitValue>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitValue {
    pub annotations: Vec<Annotation>,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typedef {
    pub ty: TypeSpec,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub ty: TypeSpec,
    pub name: Identifier,
    pub value: ConstExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exception {
    pub name: Identifier,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardKind {
    Struct,
    Union,
    Interface,
    ValueType,
    Event,
    Component,
}

impl Display for ForwardKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            ForwardKind::Struct => "struct",
            ForwardKind::Union => "union",
            ForwardKind::Interface => "interface",
            ForwardKind::ValueType => "valuetype",
            ForwardKind::Event => "eventtype",
            ForwardKind::Component => "component",
        };
        f.write_str(text)
    }
}

/// `struct X;`, `interface X;` and the other name-only forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardDecl {
    pub kind: ForwardKind,
    pub name: Identifier,
    /// `abstract`/`local` prefix on interface or value forms.
    pub qualifier: Option<String>,
}

// ── CORBA constructs (kept opaque by the semantic passes) ─────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    Unconstrained,
    Abstract,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: Identifier,
    pub kind: InterfaceKind,
    pub bases: Vec<ScopedName>,
    pub body: Vec<Export>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Concrete,
    Abstract,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueInheritance {
    pub truncatable: bool,
    pub bases: Vec<ScopedName>,
    pub supports: Vec<ScopedName>,
}

/// A `valuetype` or `eventtype` with a body.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueType {
    pub name: Identifier,
    pub kind: ValueKind,
    pub inheritance: ValueInheritance,
    pub body: Vec<Export>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueBox {
    pub name: Identifier,
    pub ty: TypeSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: Identifier,
    pub base: Option<ScopedName>,
    pub supports: Vec<ScopedName>,
    pub body: Vec<Export>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Home {
    pub name: Identifier,
    pub base: Option<ScopedName>,
    pub supports: Vec<ScopedName>,
    pub manages: ScopedName,
    pub primary_key: Option<ScopedName>,
    pub body: Vec<Export>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeIdDecl {
    pub target: ScopedName,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePrefixDecl {
    pub target: ScopedName,
    pub prefix: String,
}

/// `@annotation name { members };`
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDecl {
    pub name: Identifier,
    pub members: Vec<AnnotationMember>,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationMember {
    pub ty: TypeSpec,
    pub name: Identifier,
    pub default: Option<ConstExpr>,
}

/// Items allowed inside interface, value, component and home bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum Export {
    Definition(Definition),
    Attribute(Attribute),
    Operation(Operation),
    StateMember(StateMember),
    Initializer(Initializer),
    Port(Port),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub annotations: Vec<Annotation>,
    pub readonly: bool,
    pub ty: TypeSpec,
    pub names: Vec<Identifier>,
    pub get_raises: Vec<ScopedName>,
    pub set_raises: Vec<ScopedName>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub annotations: Vec<Annotation>,
    pub oneway: bool,
    /// `None` for `void`.
    pub return_type: Option<TypeSpec>,
    pub name: Identifier,
    pub params: Vec<Param>,
    pub raises: Vec<ScopedName>,
    pub context: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamDirection {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub annotations: Vec<Annotation>,
    pub direction: ParamDirection,
    pub ty: TypeSpec,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateMember {
    pub public: bool,
    pub member: Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitializerKind {
    Factory,
    Finder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Initializer {
    pub kind: InitializerKind,
    pub name: Identifier,
    pub params: Vec<Param>,
    pub raises: Vec<ScopedName>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    Provides,
    Uses { multiple: bool },
    Emits,
    Publishes,
    Consumes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub kind: PortKind,
    pub ty: ScopedName,
    pub name: Identifier,
    pub span: Span,
}

// ── types ─────────────────────────────────────────────────────────────────────

/// Built-in base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Short,
    UShort,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    LongDouble,
    Char,
    WChar,
    Boolean,
    Octet,
    Any,
    Object,
    ValueBase,
}

impl PrimitiveKind {
    /// Width in bits of the integer, octet and boolean kinds.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            PrimitiveKind::Boolean => Some(1),
            PrimitiveKind::Octet | PrimitiveKind::Int8 | PrimitiveKind::UInt8 => Some(8),
            PrimitiveKind::Short
            | PrimitiveKind::UShort
            | PrimitiveKind::Int16
            | PrimitiveKind::UInt16 => Some(16),
            PrimitiveKind::Long
            | PrimitiveKind::ULong
            | PrimitiveKind::Int32
            | PrimitiveKind::UInt32 => Some(32),
            PrimitiveKind::LongLong
            | PrimitiveKind::ULongLong
            | PrimitiveKind::Int64
            | PrimitiveKind::UInt64 => Some(64),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Short => "short",
            PrimitiveKind::UShort => "unsigned short",
            PrimitiveKind::Long => "long",
            PrimitiveKind::ULong => "unsigned long",
            PrimitiveKind::LongLong => "long long",
            PrimitiveKind::ULongLong => "unsigned long long",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::UInt8 => "uint8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::UInt16 => "uint16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::LongDouble => "long double",
            PrimitiveKind::Char => "char",
            PrimitiveKind::WChar => "wchar",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Octet => "octet",
            PrimitiveKind::Any => "any",
            PrimitiveKind::Object => "Object",
            PrimitiveKind::ValueBase => "ValueBase",
        }
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a declared type; `target` is filled by name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub name: ScopedName,
    pub target: Option<DefId>,
}

impl NamedType {
    pub fn new(name: ScopedName) -> Self {
        Self { name, target: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateType {
    Sequence {
        elem: Box<TypeSpec>,
        bound: Option<ConstExpr>,
    },
    Set {
        elem: Box<TypeSpec>,
        bound: Option<ConstExpr>,
    },
    Map {
        key: Box<TypeSpec>,
        value: Box<TypeSpec>,
        bound: Option<ConstExpr>,
    },
    String {
        bound: Option<ConstExpr>,
    },
    WString {
        bound: Option<ConstExpr>,
    },
    /// `fixed<digits, scale>`; both are `None` for the bare `fixed` const type.
    Fixed {
        digits: Option<Box<ConstExpr>>,
        scale: Option<Box<ConstExpr>>,
    },
}

/// Struct, union, enum, bitset or bitmask declared inline in a type position.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstrType {
    Struct(StructType),
    Union(UnionType),
    Enum(EnumType),
    Bitset(BitsetType),
    Bitmask(BitmaskType),
}

impl ConstrType {
    pub fn name(&self) -> &Identifier {
        match self {
            ConstrType::Struct(s) => &s.name,
            ConstrType::Union(u) => &u.name,
            ConstrType::Enum(e) => &e.name,
            ConstrType::Bitset(b) => &b.name,
            ConstrType::Bitmask(b) => &b.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Primitive(PrimitiveKind),
    Template(TemplateType),
    Constructed(Box<ConstrType>),
    Named(NamedType),
}

// ── constant expressions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    Xor,
    And,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::And => "&",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radix {
    Decimal,
    Octal,
    Hex,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(u64, Radix),
    Float(f64),
    Fixed(f64),
    Char(char),
    WChar(char),
    String(String),
    WString(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        lhs: Box<ConstExpr>,
        rhs: Box<ConstExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<ConstExpr>,
    },
    Literal(Literal),
    Name(ScopedName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstExpr {
    pub kind: ExprKind,
    pub span: Span,
    /// Set once by the evaluation pass on expressions in evaluated positions.
    pub value: Option<EvaluatedConstant>,
}

impl ConstExpr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            value: None,
        }
    }

    /// The evaluated value as a strictly positive size.
    pub fn positive_value(&self) -> Option<u64> {
        self.value.as_ref().and_then(|v| v.value.as_positive())
    }
}
