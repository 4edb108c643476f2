//! Model entities (spec §3.5): one flat arena per kind, each indexed by a
//! newtype id, plus the leaf expression/statement node shapes the builder
//! and resolver operate on.

use indexmap::IndexMap;

use crate::ast::{QualifiedName, Specifiers};
use crate::types::{TypeId, TypeRegistry};
use klang_core::Span;

pub type NamespaceId = u32;
pub type StructureId = u32;
pub type FunctionId = u32;
pub type ParameterId = u32;
pub type VariableId = u32;
pub type StmtId = u32;
pub type ExprId = u32;

/// Up-link to the entity a node was declared or nested inside (spec §3.5's
/// "every entity carries a parent pointer" requirement).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParentId {
    None,
    Namespace(NamespaceId),
    Structure(StructureId),
    Function(FunctionId),
    Stmt(StmtId),
}

/// A namespace, and the unit's implicit root namespace, double as the
/// innermost "variable holder" a bare top-level `var` binds into.
pub struct Namespace {
    pub name: Option<String>,
    pub qualified_name: QualifiedName,
    pub parent: ParentId,
    pub variables: IndexMap<String, VariableId>,
    pub functions: Vec<FunctionId>,
    pub structures: Vec<StructureId>,
    pub namespaces: Vec<NamespaceId>,
    pub span: Span,
}

pub struct Structure {
    pub name: QualifiedName,
    pub parent: ParentId,
    pub type_id: TypeId,
    pub fields: Vec<VariableId>,
    pub methods: Vec<FunctionId>,
    pub span: Span,
}

/// A function parameter. `index` is `-1` for the synthesized `this`
/// parameter of a member function and `0..` for user parameters, per spec
/// §3.7's external-indexing invariant; `this` is never present in
/// [`Function::parameters`].
pub struct Parameter {
    pub name: String,
    pub index: i32,
    pub type_id: TypeId,
    pub span: Span,
}

pub struct Function {
    pub name: String,
    pub qualified_name: QualifiedName,
    pub parent: ParentId,
    pub specifiers: Specifiers,
    pub this_param: Option<ParameterId>,
    pub parameters: Vec<ParameterId>,
    pub return_type: Option<TypeId>,
    pub owner_struct: Option<StructureId>,
    pub body: Option<StmtId>,
    pub type_id: TypeId,
    pub span: Span,
}

pub struct Variable {
    pub name: String,
    pub parent: ParentId,
    pub type_id: TypeId,
    pub initializer: Option<ExprId>,
    pub is_static: bool,
    pub is_const: bool,
    pub span: Span,
}

/// A statement. `Block`, and a `For`'s own frame, are variable holders in
/// their own right — each carries its own `IndexMap` of locals declared
/// directly inside it.
pub enum StmtKind {
    Block {
        variables: IndexMap<String, VariableId>,
        statements: Vec<StmtId>,
    },
    Return {
        value: Option<ExprId>,
    },
    If {
        condition: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        condition: ExprId,
        body: StmtId,
    },
    For {
        variables: IndexMap<String, VariableId>,
        init: Option<StmtId>,
        condition: Option<ExprId>,
        step: Option<ExprId>,
        body: StmtId,
    },
    ExprStmt(ExprId),
    VarDecl(VariableId),
}

pub struct StmtNode {
    pub kind: StmtKind,
    pub parent: ParentId,
    pub span: Span,
}

/// A literal value, typed by the builder from a fixed table (spec §3.6)
/// independent of symbol resolution. Integer/float magnitudes are stored
/// pre-parsed from the lexeme's digit text.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Char(char),
    Integer(i64),
    UnsignedInteger(u64),
    Float(f32),
    Double(f64),
    /// A string literal's bytes, modeled as a fixed-size `char` array (spec
    /// is silent on string literals; see DESIGN.md for the adopted rule).
    Str(String),
    /// The literal `null`; its natural type is a `byte*` (DESIGN.md).
    Null,
}

/// Every distinct leaf expression kind the builder can produce (spec
/// §4.4's "small fixed table drives the mapping"), mirroring the
/// original's `expressions.hpp` class hierarchy one-to-one rather than a
/// single generic binary/unary node.
pub enum ExprKind {
    Value(Value),
    /// An unqualified or qualified name; the resolver binds this to a
    /// variable, parameter, function or `this`.
    Symbol(QualifiedName),

    UnaryPlus(ExprId),
    UnaryMinus(ExprId),
    BitwiseNot(ExprId),
    LogicalNot(ExprId),
    AddressOf(ExprId),
    Dereference(ExprId),
    /// Synthesized only by the resolver: wraps an l-value expression to
    /// mark "read the value stored here" (spec §3.5, §4.5).
    LoadValue(ExprId),
    Cast(TypeId, ExprId),

    PreIncrement(ExprId),
    PreDecrement(ExprId),
    PostIncrement(ExprId),
    PostDecrement(ExprId),

    Addition(ExprId, ExprId),
    Substraction(ExprId, ExprId),
    Multiplication(ExprId, ExprId),
    Division(ExprId, ExprId),
    Modulo(ExprId, ExprId),
    BitwiseAnd(ExprId, ExprId),
    BitwiseOr(ExprId, ExprId),
    BitwiseXor(ExprId, ExprId),
    LeftShift(ExprId, ExprId),
    RightShift(ExprId, ExprId),

    LogicalAnd(ExprId, ExprId),
    LogicalOr(ExprId, ExprId),

    Equal(ExprId, ExprId),
    Different(ExprId, ExprId),
    Lesser(ExprId, ExprId),
    Greater(ExprId, ExprId),
    LesserEqual(ExprId, ExprId),
    GreaterEqual(ExprId, ExprId),

    SimpleAssignation(ExprId, ExprId),
    AddAssignation(ExprId, ExprId),
    SubAssignation(ExprId, ExprId),
    MulAssignation(ExprId, ExprId),
    DivAssignation(ExprId, ExprId),
    ModAssignation(ExprId, ExprId),
    ShlAssignation(ExprId, ExprId),
    ShrAssignation(ExprId, ExprId),
    BitAndAssignation(ExprId, ExprId),
    BitOrAssignation(ExprId, ExprId),
    BitXorAssignation(ExprId, ExprId),

    MemberOfObject(ExprId, String),
    MemberOfPointer(ExprId, String),
    Subscript(ExprId, ExprId),
    FunctionInvocation(ExprId, Vec<ExprId>),

    Conditional(ExprId, ExprId, ExprId),
    ExprList(Vec<ExprId>),

    /// A use of an operator the model has no mapping for (spec's builder
    /// never describes pointer-to-member semantics; see DESIGN.md).
    Error,
}

/// What a `Symbol` expression was bound to (spec §4.5's name-resolution
/// pass). `This` names the synthesized `this` parameter of a member
/// function, kept distinct from an ordinary `Parameter` since it never
/// appears in [`Function::parameters`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResolvedSymbol {
    Variable(VariableId),
    Parameter(ParameterId),
    This(ParameterId),
    Function(FunctionId),
}

pub struct ExprNode {
    pub kind: ExprKind,
    /// Set by the builder for literals (a fixed table, independent of
    /// symbol resolution); set by the resolver for everything else.
    pub ty: Option<TypeId>,
    /// Filled in by the resolver when `kind` is `Symbol`.
    pub resolved: Option<ResolvedSymbol>,
    pub span: Span,
}

/// The fully built, not-yet-resolved (or just-resolved) semantic model of
/// one compilation unit (spec §3.5).
pub struct Model {
    pub namespaces: Vec<Namespace>,
    pub structures: Vec<Structure>,
    pub functions: Vec<Function>,
    pub parameters: Vec<Parameter>,
    pub variables: Vec<Variable>,
    pub stmts: Vec<StmtNode>,
    pub exprs: Vec<ExprNode>,
    pub root: NamespaceId,
    pub types: TypeRegistry,
}

macro_rules! arena_accessors {
    ($get:ident, $get_mut:ident, $field:ident, $id:ty, $node:ty) => {
        pub fn $get(&self, id: $id) -> &$node {
            &self.$field[id as usize]
        }
        pub fn $get_mut(&mut self, id: $id) -> &mut $node {
            &mut self.$field[id as usize]
        }
    };
}

impl Model {
    arena_accessors!(namespace, namespace_mut, namespaces, NamespaceId, Namespace);
    arena_accessors!(structure, structure_mut, structures, StructureId, Structure);
    arena_accessors!(function, function_mut, functions, FunctionId, Function);
    arena_accessors!(parameter, parameter_mut, parameters, ParameterId, Parameter);
    arena_accessors!(variable, variable_mut, variables, VariableId, Variable);
    arena_accessors!(stmt, stmt_mut, stmts, StmtId, StmtNode);
    arena_accessors!(expr, expr_mut, exprs, ExprId, ExprNode);

    pub fn push_namespace(&mut self, ns: Namespace) -> NamespaceId {
        let id = self.namespaces.len() as NamespaceId;
        self.namespaces.push(ns);
        id
    }

    pub fn push_structure(&mut self, s: Structure) -> StructureId {
        let id = self.structures.len() as StructureId;
        self.structures.push(s);
        id
    }

    pub fn push_function(&mut self, f: Function) -> FunctionId {
        let id = self.functions.len() as FunctionId;
        self.functions.push(f);
        id
    }

    pub fn push_parameter(&mut self, p: Parameter) -> ParameterId {
        let id = self.parameters.len() as ParameterId;
        self.parameters.push(p);
        id
    }

    pub fn push_variable(&mut self, v: Variable) -> VariableId {
        let id = self.variables.len() as VariableId;
        self.variables.push(v);
        id
    }

    pub fn push_stmt(&mut self, s: StmtNode) -> StmtId {
        let id = self.stmts.len() as StmtId;
        self.stmts.push(s);
        id
    }

    pub fn push_expr(&mut self, e: ExprNode) -> ExprId {
        let id = self.exprs.len() as ExprId;
        self.exprs.push(e);
        id
    }
}
