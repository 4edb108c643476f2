//! Name and type resolution (spec §4.5). Walks every function body and
//! every namespace-level variable initializer once, binding each `Symbol`
//! leaf to a variable, parameter, `this` or function, attaching a type to
//! every expression node, and inserting `load_value` wrappers wherever an
//! l-value is read for its value rather than its storage.
//!
//! The model's arenas are append-only: injecting a `load_value` node means
//! pushing a new [`ExprNode`] and rewriting the referencing parent's child
//! id, rather than mutating the original node into something else.

use std::collections::HashMap;

use crate::ast::QualifiedName;
use crate::diagnostics::{resolver_codes, Diagnostics, Severity};
use crate::model::{
    ExprId, ExprKind, ExprNode, FunctionId, Model, NamespaceId, ParentId, ResolvedSymbol,
    StmtId, StmtKind, StructureId, VariableId,
};
use crate::types::{PrimitiveKind, TypeId, TypeKind};
use klang_core::Span;


/// A lexical scope the resolver is currently walking through, used for
/// ordered name lookup (innermost first).
enum Scope {
    Namespace(NamespaceId),
    /// A `Block` or `For` statement — both own a variable map.
    Stmt(StmtId),
}

struct Resolver<'m> {
    model: &'m mut Model,
    diagnostics: &'m mut Diagnostics,
    scope_stack: Vec<Scope>,
    current_function: Option<FunctionId>,
    struct_index: HashMap<TypeId, StructureId>,
}

/// Resolves every symbol and type in `model` in place (spec §4.5).
pub fn resolve_model(model: &mut Model, diagnostics: &mut Diagnostics) {
    let struct_index = model
        .structures
        .iter()
        .enumerate()
        .map(|(i, s)| (s.type_id, i as StructureId))
        .collect();
    let mut resolver = Resolver {
        model,
        diagnostics,
        scope_stack: Vec::new(),
        current_function: None,
        struct_index,
    };

    let variable_ids: Vec<VariableId> = (0..resolver.model.variables.len() as VariableId).collect();
    for vid in variable_ids {
        if matches!(resolver.model.variable(vid).parent, ParentId::Namespace(_)) {
            let chain = resolver.namespace_chain(resolver.model.variable(vid).parent);
            for ns in &chain {
                resolver.scope_stack.push(Scope::Namespace(*ns));
            }
            resolver.resolve_variable(vid);
            resolver.scope_stack.truncate(resolver.scope_stack.len() - chain.len());
        }
    }

    let function_ids: Vec<FunctionId> = (0..resolver.model.functions.len() as FunctionId).collect();
    for fid in function_ids {
        resolver.resolve_function(fid);
    }
}

impl<'m> Resolver<'m> {
    fn namespace_chain(&self, parent: ParentId) -> Vec<NamespaceId> {
        let mut chain = Vec::new();
        let mut cur = parent;
        loop {
            cur = match cur {
                ParentId::Namespace(id) => {
                    chain.push(id);
                    self.model.namespace(id).parent
                }
                ParentId::Structure(id) => self.model.structure(id).parent,
                ParentId::Function(id) => self.model.function(id).parent,
                ParentId::Stmt(id) => self.model.stmt(id).parent,
                ParentId::None => break,
            };
        }
        chain.reverse();
        chain
    }

    fn bool_ty(&mut self) -> TypeId {
        self.model.types.from_primitive_tag(PrimitiveKind::Bool)
    }

    /// Recovery type handed back after a resolution error, so the walk can
    /// keep going and surface further diagnostics instead of aborting.
    fn fallback_ty(&mut self) -> TypeId {
        self.model.types.from_primitive_tag(PrimitiveKind::Int)
    }

    fn require_numeric(&mut self, ty: TypeId, span: Span) {
        let ok = matches!(self.model.types.kind(ty), TypeKind::Primitive(p) if p.is_integer() || p.is_floating());
        if !ok {
            self.diagnostics.report(Severity::Error, resolver_codes::NOT_NUMERIC, span, "expected a numeric type");
        }
    }

    fn require_integer(&mut self, ty: TypeId, span: Span) {
        let ok = matches!(self.model.types.kind(ty), TypeKind::Primitive(p) if p.is_integer());
        if !ok {
            self.diagnostics.report(Severity::Error, resolver_codes::NOT_NUMERIC, span, "expected an integer type");
        }
    }

    fn require_numeric_or_bool(&mut self, ty: TypeId, span: Span) {
        let ok = matches!(self.model.types.kind(ty), TypeKind::Primitive(_));
        if !ok {
            self.diagnostics.report(Severity::Error, resolver_codes::NOT_NUMERIC, span, "expected a numeric or boolean type");
        }
    }

    /// Usual arithmetic conversions (spec §4.5): floating beats integer,
    /// `double` beats `float`; among integers, higher rank wins, and a tie
    /// in rank prefers the unsigned kind.
    fn usual_arithmetic_conversion(&mut self, a: TypeId, b: TypeId, span: Span) -> TypeId {
        if a == b {
            return a;
        }
        let (pa, pb) = match (self.model.types.kind(a), self.model.types.kind(b)) {
            (TypeKind::Primitive(x), TypeKind::Primitive(y)) => (*x, *y),
            _ => {
                self.diagnostics.report(Severity::Error, resolver_codes::NOT_NUMERIC, span, "operands are not of compatible arithmetic types");
                return a;
            }
        };
        let winner = if pa.is_floating() || pb.is_floating() {
            match (pa, pb) {
                (PrimitiveKind::Double, _) | (_, PrimitiveKind::Double) => PrimitiveKind::Double,
                _ if pa.is_floating() => pa,
                _ => pb,
            }
        } else if pa.integer_rank() != pb.integer_rank() {
            if pa.integer_rank() > pb.integer_rank() { pa } else { pb }
        } else if pa.is_unsigned() != pb.is_unsigned() {
            if pa.is_unsigned() { pa } else { pb }
        } else {
            pa
        };
        self.model.types.from_primitive_tag(winner)
    }

    /// Permissive implicit-conversion rule: any two primitives convert
    /// (arithmetic narrowing/widening), as do any two pointers; anything
    /// else needs an explicit cast.
    fn require_convertible(&mut self, src: TypeId, dst: TypeId, span: Span) {
        if src == dst {
            return;
        }
        let ok = matches!(
            (self.model.types.kind(src), self.model.types.kind(dst)),
            (TypeKind::Primitive(_), TypeKind::Primitive(_)) | (TypeKind::Pointer(_), TypeKind::Pointer(_))
        );
        if !ok {
            self.diagnostics.report(Severity::Error, resolver_codes::NO_IMPLICIT_CONVERSION, span, "no implicit conversion between these types");
        }
    }

    fn check_cast(&mut self, src: TypeId, target: TypeId, span: Span) {
        if src == target {
            return;
        }
        let ok = match (self.model.types.kind(src), self.model.types.kind(target)) {
            (TypeKind::Primitive(_), TypeKind::Primitive(_)) => true,
            (TypeKind::Pointer(_), TypeKind::Pointer(_)) => true,
            (TypeKind::Primitive(p), TypeKind::Pointer(_)) => p.is_integer(),
            (TypeKind::Pointer(_), TypeKind::Primitive(p)) => p.is_integer(),
            _ => false,
        };
        if !ok {
            self.diagnostics.report(Severity::Error, resolver_codes::ILLEGAL_CAST, span, "no conversion between these types is permitted in a cast");
        }
    }

    fn deref_target(&mut self, ty: TypeId, span: Span) -> TypeId {
        match self.model.types.kind(ty) {
            TypeKind::Pointer(inner) | TypeKind::Reference(inner) => *inner,
            _ => {
                self.diagnostics.report(Severity::Error, resolver_codes::NOT_A_POINTER, span, "expected a pointer type");
                self.fallback_ty()
            }
        }
    }

    fn array_or_pointer_element(&mut self, ty: TypeId, span: Span) -> TypeId {
        match self.model.types.kind(ty) {
            TypeKind::Pointer(inner) | TypeKind::UnsizedArray(inner) | TypeKind::SizedArray(inner, _) => *inner,
            _ => {
                self.diagnostics.report(Severity::Error, resolver_codes::NOT_AN_ARRAY_OR_POINTER, span, "expected an array or pointer type");
                self.fallback_ty()
            }
        }
    }

    /// Looks up a field or method of `struct_ty` by name without reporting
    /// a diagnostic on failure — used both by explicit member access and by
    /// the implicit-`this` fallback in [`Self::resolve_symbol`].
    fn find_member_quiet(&self, struct_ty: TypeId, name: &str) -> Option<TypeId> {
        if let TypeKind::Struct(st) = self.model.types.kind(struct_ty) {
            if let Some((_, field_ty)) = st.fields.iter().find(|(n, _)| n == name) {
                return Some(*field_ty);
            }
        }
        if let Some(&sid) = self.struct_index.get(&struct_ty) {
            let method = self.model.structure(sid).methods.iter().copied().find(|&fid| self.model.function(fid).name == name);
            if let Some(fid) = method {
                return Some(self.model.function(fid).type_id);
            }
        }
        None
    }

    fn resolve_member(&mut self, struct_ty: TypeId, name: &str, span: Span) -> TypeId {
        if let Some(ty) = self.find_member_quiet(struct_ty, name) {
            return ty;
        }
        self.diagnostics.report(Severity::Error, resolver_codes::NOT_A_MEMBER, span, format!("no member named '{name}'"));
        self.fallback_ty()
    }

    /// Strips one layer of `&` so field/method lookup works the same way
    /// on a plain struct-typed object and on a struct reference (notably
    /// `this`, whose declared type is `Struct&`).
    fn struct_target(&self, ty: TypeId) -> TypeId {
        match self.model.types.kind(ty) {
            TypeKind::Reference(inner) => *inner,
            _ => ty,
        }
    }

    /// Wraps `id` (of type `from`) in a `Cast` node if `from != to`, so
    /// that every implicit arithmetic promotion is as visible in the model
    /// as an explicit cast (spec §4.5's widening example).
    fn coerce(&mut self, id: ExprId, from: TypeId, to: TypeId) -> ExprId {
        if from == to {
            return id;
        }
        let span = self.model.expr(id).span;
        self.model.push_expr(ExprNode { kind: ExprKind::Cast(to, id), ty: Some(to), resolved: None, span })
    }

    /// Checks an invocation and casts each argument to its declared
    /// parameter type (spec §4.5: "each argument is cast to the declared
    /// parameter type"), returning the (possibly rewrapped) argument ids.
    fn check_call(&mut self, callee_ty: TypeId, args: Vec<(ExprId, TypeId)>, span: Span) -> (Vec<ExprId>, TypeId) {
        let signature = match self.model.types.kind(callee_ty) {
            TypeKind::FunctionRef(f) => Some((f.parameters.clone(), f.return_type)),
            _ => None,
        };
        let Some((params, ret)) = signature else {
            self.diagnostics.report(Severity::Error, resolver_codes::NOT_CALLABLE, span, "expression is not callable");
            return (args.into_iter().map(|(id, _)| id).collect(), self.fallback_ty());
        };
        let ret_ty = ret.unwrap_or_else(|| self.fallback_ty());
        if params.len() != args.len() {
            self.diagnostics.report(
                Severity::Error,
                resolver_codes::WRONG_ARGUMENT_COUNT,
                span,
                format!("expected {} argument(s), got {}", params.len(), args.len()),
            );
            return (args.into_iter().map(|(id, _)| id).collect(), ret_ty);
        }
        let mut coerced = Vec::with_capacity(args.len());
        for (&p, (id, ty)) in params.iter().zip(args.into_iter()) {
            self.require_convertible(ty, p, span);
            coerced.push(self.coerce(id, ty, p));
        }
        (coerced, ret_ty)
    }

    fn is_lvalue_kind(&self, kind: &ExprKind, resolved: Option<ResolvedSymbol>) -> bool {
        match kind {
            ExprKind::Symbol(_) => matches!(
                resolved,
                Some(ResolvedSymbol::Variable(_)) | Some(ResolvedSymbol::Parameter(_)) | Some(ResolvedSymbol::This(_))
            ),
            ExprKind::Dereference(_)
            | ExprKind::Subscript(_, _)
            | ExprKind::MemberOfObject(_, _)
            | ExprKind::MemberOfPointer(_, _)
            | ExprKind::PreIncrement(_)
            | ExprKind::PreDecrement(_) => true,
            _ => false,
        }
    }

    /// Resolves `id` and, if it names storage (a variable, `*p`, `a[i]`,
    /// `obj.field`, ...), wraps it in a fresh `load_value` node (spec
    /// §3.5). Returns the id the caller should actually reference.
    fn resolve_value(&mut self, id: ExprId) -> (ExprId, TypeId) {
        let ty = self.resolve_node(id);
        let node = self.model.expr(id);
        if self.is_lvalue_kind(&node.kind, node.resolved) {
            let span = node.span;
            let new_id = self.model.push_expr(ExprNode { kind: ExprKind::LoadValue(id), ty: Some(ty), resolved: None, span });
            (new_id, ty)
        } else {
            (id, ty)
        }
    }

    /// Resolves `id` without loading; reports `NOT_AN_LVALUE` if the
    /// resolved expression doesn't actually name storage.
    fn resolve_lvalue(&mut self, id: ExprId, span: Span) -> TypeId {
        let ty = self.resolve_node(id);
        let node = self.model.expr(id);
        if !self.is_lvalue_kind(&node.kind, node.resolved) {
            self.diagnostics.report(Severity::Error, resolver_codes::NOT_AN_LVALUE, span, "expression is not an lvalue");
        }
        ty
    }

    fn resolve_node(&mut self, id: ExprId) -> TypeId {
        let span = self.model.expr(id).span;
        let existing_ty = self.model.expr(id).ty;
        let kind = std::mem::replace(&mut self.model.expr_mut(id).kind, ExprKind::Error);
        let (new_kind, ty, resolved) = self.resolve_kind(kind, existing_ty, span);
        let node = self.model.expr_mut(id);
        node.kind = new_kind;
        node.ty = Some(ty);
        node.resolved = resolved;
        ty
    }

    fn resolve_kind(&mut self, kind: ExprKind, existing_ty: Option<TypeId>, span: Span) -> (ExprKind, TypeId, Option<ResolvedSymbol>) {
        use ExprKind::*;
        match kind {
            Value(v) => {
                let ty = existing_ty.expect("the builder types every literal");
                (Value(v), ty, None)
            }
            Symbol(name) => self.resolve_symbol(name, span),
            Error => (Error, existing_ty.unwrap_or_else(|| self.fallback_ty()), None),

            UnaryPlus(e) => {
                let (e, t) = self.resolve_value(e);
                self.require_numeric(t, span);
                (UnaryPlus(e), t, None)
            }
            UnaryMinus(e) => {
                let (e, t) = self.resolve_value(e);
                self.require_numeric(t, span);
                (UnaryMinus(e), t, None)
            }
            BitwiseNot(e) => {
                let (e, t) = self.resolve_value(e);
                self.require_integer(t, span);
                (BitwiseNot(e), t, None)
            }
            LogicalNot(e) => {
                let (e, t) = self.resolve_value(e);
                self.require_numeric_or_bool(t, span);
                let bool_ty = self.bool_ty();
                (LogicalNot(e), bool_ty, None)
            }
            AddressOf(e) => {
                let t = self.resolve_lvalue(e, span);
                let ptr = self.model.types.pointer_to(t);
                (AddressOf(e), ptr, None)
            }
            Dereference(e) => {
                let (e, t) = self.resolve_value(e);
                let inner = self.deref_target(t, span);
                (Dereference(e), inner, None)
            }
            LoadValue(e) => {
                let t = self.model.expr(e).ty.expect("load_value always wraps an already-resolved node");
                (LoadValue(e), t, None)
            }
            Cast(target, e) => {
                let (e, src) = self.resolve_value(e);
                self.check_cast(src, target, span);
                (Cast(target, e), target, None)
            }

            PreIncrement(e) => {
                let t = self.resolve_lvalue(e, span);
                self.require_numeric(t, span);
                (PreIncrement(e), t, None)
            }
            PreDecrement(e) => {
                let t = self.resolve_lvalue(e, span);
                self.require_numeric(t, span);
                (PreDecrement(e), t, None)
            }
            PostIncrement(e) => {
                let t = self.resolve_lvalue(e, span);
                self.require_numeric(t, span);
                (PostIncrement(e), t, None)
            }
            PostDecrement(e) => {
                let t = self.resolve_lvalue(e, span);
                self.require_numeric(t, span);
                (PostDecrement(e), t, None)
            }

            Addition(l, r) => self.resolve_arithmetic(l, r, span, Addition),
            Substraction(l, r) => self.resolve_arithmetic(l, r, span, Substraction),
            Multiplication(l, r) => self.resolve_arithmetic(l, r, span, Multiplication),
            Division(l, r) => self.resolve_arithmetic(l, r, span, Division),
            Modulo(l, r) => self.resolve_arithmetic(l, r, span, Modulo),
            BitwiseAnd(l, r) => self.resolve_arithmetic(l, r, span, BitwiseAnd),
            BitwiseOr(l, r) => self.resolve_arithmetic(l, r, span, BitwiseOr),
            BitwiseXor(l, r) => self.resolve_arithmetic(l, r, span, BitwiseXor),
            LeftShift(l, r) => self.resolve_arithmetic(l, r, span, LeftShift),
            RightShift(l, r) => self.resolve_arithmetic(l, r, span, RightShift),

            LogicalAnd(l, r) => self.resolve_logical(l, r, span, LogicalAnd),
            LogicalOr(l, r) => self.resolve_logical(l, r, span, LogicalOr),

            Equal(l, r) => self.resolve_comparison(l, r, span, Equal),
            Different(l, r) => self.resolve_comparison(l, r, span, Different),
            Lesser(l, r) => self.resolve_comparison(l, r, span, Lesser),
            Greater(l, r) => self.resolve_comparison(l, r, span, Greater),
            LesserEqual(l, r) => self.resolve_comparison(l, r, span, LesserEqual),
            GreaterEqual(l, r) => self.resolve_comparison(l, r, span, GreaterEqual),

            SimpleAssignation(l, r) => self.resolve_assignment(l, r, span, SimpleAssignation),
            AddAssignation(l, r) => self.resolve_assignment(l, r, span, AddAssignation),
            SubAssignation(l, r) => self.resolve_assignment(l, r, span, SubAssignation),
            MulAssignation(l, r) => self.resolve_assignment(l, r, span, MulAssignation),
            DivAssignation(l, r) => self.resolve_assignment(l, r, span, DivAssignation),
            ModAssignation(l, r) => self.resolve_assignment(l, r, span, ModAssignation),
            ShlAssignation(l, r) => self.resolve_assignment(l, r, span, ShlAssignation),
            ShrAssignation(l, r) => self.resolve_assignment(l, r, span, ShrAssignation),
            BitAndAssignation(l, r) => self.resolve_assignment(l, r, span, BitAndAssignation),
            BitOrAssignation(l, r) => self.resolve_assignment(l, r, span, BitOrAssignation),
            BitXorAssignation(l, r) => self.resolve_assignment(l, r, span, BitXorAssignation),

            MemberOfObject(obj, name) => {
                let obj_ty = self.resolve_lvalue(obj, span);
                let struct_ty = self.struct_target(obj_ty);
                let field_ty = self.resolve_member(struct_ty, &name, span);
                (MemberOfObject(obj, name), field_ty, None)
            }
            MemberOfPointer(obj, name) => {
                let (obj, obj_ty) = self.resolve_value(obj);
                let pointee = self.deref_target(obj_ty, span);
                let field_ty = self.resolve_member(pointee, &name, span);
                (MemberOfPointer(obj, name), field_ty, None)
            }
            Subscript(arr, idx) => {
                let (arr, arr_ty) = self.resolve_value(arr);
                let (idx, idx_ty) = self.resolve_value(idx);
                self.require_integer(idx_ty, span);
                let elem = self.array_or_pointer_element(arr_ty, span);
                (Subscript(arr, idx), elem, None)
            }
            FunctionInvocation(callee, args) => {
                let (callee, callee_ty) = self.resolve_value(callee);
                let resolved_args: Vec<(ExprId, TypeId)> = args.into_iter().map(|a| self.resolve_value(a)).collect();
                let (args, ret) = self.check_call(callee_ty, resolved_args, span);
                (FunctionInvocation(callee, args), ret, None)
            }

            Conditional(c, t, e) => {
                let (c, ct) = self.resolve_value(c);
                self.require_numeric_or_bool(ct, span);
                let (t, tt) = self.resolve_value(t);
                let (e, et) = self.resolve_value(e);
                let result = self.usual_arithmetic_conversion(tt, et, span);
                let t = self.coerce(t, tt, result);
                let e = self.coerce(e, et, result);
                (Conditional(c, t, e), result, None)
            }
            ExprList(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                let mut last_ty = self.fallback_ty();
                for item in items {
                    let (id, ty) = self.resolve_value(item);
                    resolved.push(id);
                    last_ty = ty;
                }
                (ExprList(resolved), last_ty, None)
            }
        }
    }

    /// Computes the usual arithmetic conversion of both operands and
    /// wraps whichever one needs widening in an explicit `Cast` node
    /// (spec §4.5/§8 S2 — `add(a:int, b:long)`'s `a` gets cast to `long`).
    fn resolve_arithmetic(&mut self, l: ExprId, r: ExprId, span: Span, ctor: fn(ExprId, ExprId) -> ExprKind) -> (ExprKind, TypeId, Option<ResolvedSymbol>) {
        let (l, lt) = self.resolve_value(l);
        let (r, rt) = self.resolve_value(r);
        let ty = self.usual_arithmetic_conversion(lt, rt, span);
        let l = self.coerce(l, lt, ty);
        let r = self.coerce(r, rt, ty);
        (ctor(l, r), ty, None)
    }

    fn resolve_logical(&mut self, l: ExprId, r: ExprId, span: Span, ctor: fn(ExprId, ExprId) -> ExprKind) -> (ExprKind, TypeId, Option<ResolvedSymbol>) {
        let (l, lt) = self.resolve_value(l);
        self.require_numeric_or_bool(lt, span);
        let (r, rt) = self.resolve_value(r);
        self.require_numeric_or_bool(rt, span);
        let bool_ty = self.bool_ty();
        (ctor(l, r), bool_ty, None)
    }

    fn resolve_comparison(&mut self, l: ExprId, r: ExprId, span: Span, ctor: fn(ExprId, ExprId) -> ExprKind) -> (ExprKind, TypeId, Option<ResolvedSymbol>) {
        let (l, lt) = self.resolve_value(l);
        let (r, rt) = self.resolve_value(r);
        let both_pointers = matches!((self.model.types.kind(lt), self.model.types.kind(rt)), (TypeKind::Pointer(_), TypeKind::Pointer(_)));
        let (l, r) = if both_pointers {
            (l, r)
        } else {
            let common = self.usual_arithmetic_conversion(lt, rt, span);
            (self.coerce(l, lt, common), self.coerce(r, rt, common))
        };
        let bool_ty = self.bool_ty();
        (ctor(l, r), bool_ty, None)
    }

    /// Spec §4.5: "the right side is cast to the element type of that
    /// reference" — the RHS is wrapped in a `Cast` to the lvalue's type.
    fn resolve_assignment(&mut self, l: ExprId, r: ExprId, span: Span, ctor: fn(ExprId, ExprId) -> ExprKind) -> (ExprKind, TypeId, Option<ResolvedSymbol>) {
        let lt = self.resolve_lvalue(l, span);
        let (r, rt) = self.resolve_value(r);
        self.require_convertible(rt, lt, span);
        let r = self.coerce(r, rt, lt);
        (ctor(l, r), lt, None)
    }

    fn resolve_symbol(&mut self, name: QualifiedName, span: Span) -> (ExprKind, TypeId, Option<ResolvedSymbol>) {
        if let Some(short) = name.is_simple().then(|| name.short_name()).flatten() {
            let short = short.to_string();
            if short == "this" {
                if let Some(fid) = self.current_function {
                    if let Some(pid) = self.model.function(fid).this_param {
                        let ty = self.model.parameter(pid).type_id;
                        return (ExprKind::Symbol(name), ty, Some(ResolvedSymbol::This(pid)));
                    }
                }
                self.diagnostics.report(Severity::Error, resolver_codes::UNRESOLVED_SYMBOL, span, "'this' used outside a member function");
                let fallback = self.fallback_ty();
                return (ExprKind::Symbol(name), fallback, None);
            }

            // 1. enclosing block / `for` locals, innermost first (spec §4.5).
            for i in (0..self.scope_stack.len()).rev() {
                if let Scope::Stmt(id) = self.scope_stack[i] {
                    let found = match &self.model.stmt(id).kind {
                        StmtKind::Block { variables, .. } | StmtKind::For { variables, .. } => variables.get(&short).copied(),
                        _ => None,
                    };
                    if let Some(vid) = found {
                        let ty = self.model.variable(vid).type_id;
                        return (ExprKind::Symbol(name), ty, Some(ResolvedSymbol::Variable(vid)));
                    }
                }
            }

            // 2. the enclosing function's parameter list.
            if let Some(fid) = self.current_function {
                let param = self
                    .model
                    .function(fid)
                    .parameters
                    .iter()
                    .copied()
                    .find(|&pid| self.model.parameter(pid).name == short);
                if let Some(pid) = param {
                    let ty = self.model.parameter(pid).type_id;
                    return (ExprKind::Symbol(name), ty, Some(ResolvedSymbol::Parameter(pid)));
                }
            }

            // 3. the owning structure: bare field/method access inside a
            // member function implicitly targets `this` (spec §8 S4: `a`
            // inside `sum()` means `this.a`).
            if let Some(fid) = self.current_function {
                if let Some(this_pid) = self.model.function(fid).this_param {
                    let this_ty = self.model.parameter(this_pid).type_id;
                    let struct_ty = self.struct_target(this_ty);
                    if let Some(field_ty) = self.find_member_quiet(struct_ty, &short) {
                        let this_id = self.model.push_expr(ExprNode {
                            kind: ExprKind::Symbol(QualifiedName::simple("this")),
                            ty: Some(this_ty),
                            resolved: Some(ResolvedSymbol::This(this_pid)),
                            span,
                        });
                        return (ExprKind::MemberOfObject(this_id, short.clone()), field_ty, None);
                    }
                }
            }

            // 4. the namespace chain, innermost first, checking both
            // variables and functions at each level before moving outward.
            for i in (0..self.scope_stack.len()).rev() {
                if let Scope::Namespace(id) = self.scope_stack[i] {
                    if let Some(&vid) = self.model.namespace(id).variables.get(&short) {
                        let ty = self.model.variable(vid).type_id;
                        return (ExprKind::Symbol(name), ty, Some(ResolvedSymbol::Variable(vid)));
                    }
                    let found = self.model.namespace(id).functions.iter().copied().find(|&fid| self.model.function(fid).name == short);
                    if let Some(fid) = found {
                        let ty = self.model.function(fid).type_id;
                        return (ExprKind::Symbol(name), ty, Some(ResolvedSymbol::Function(fid)));
                    }
                }
            }
        }

        self.diagnostics.report(Severity::Error, resolver_codes::UNRESOLVED_SYMBOL, span, format!("unresolved symbol '{name}'"));
        let fallback = self.fallback_ty();
        (ExprKind::Symbol(name), fallback, None)
    }

    fn resolve_variable(&mut self, vid: VariableId) {
        let declared = self.model.variable(vid).type_id;
        let span = self.model.variable(vid).span;
        if let Some(init) = self.model.variable(vid).initializer {
            let (new_init, init_ty) = self.resolve_value(init);
            self.require_convertible(init_ty, declared, span);
            let new_init = self.coerce(new_init, init_ty, declared);
            self.model.variable_mut(vid).initializer = Some(new_init);
        }
    }

    fn resolve_function(&mut self, fid: FunctionId) {
        let parent = self.model.function(fid).parent;
        let chain = self.namespace_chain(parent);
        let saved_function = self.current_function.replace(fid);
        for ns in &chain {
            self.scope_stack.push(Scope::Namespace(*ns));
        }
        if let Some(body) = self.model.function(fid).body {
            self.resolve_stmt(body);
        }
        self.scope_stack.truncate(self.scope_stack.len() - chain.len());
        self.current_function = saved_function;
    }

    fn resolve_stmt(&mut self, id: StmtId) {
        enum Shape {
            Block(Vec<StmtId>),
            Return(Option<ExprId>),
            If(ExprId, StmtId, Option<StmtId>),
            While(ExprId, StmtId),
            For(Option<StmtId>, Option<ExprId>, Option<ExprId>, StmtId),
            ExprStmt(ExprId),
            VarDecl(VariableId),
        }
        let shape = match &self.model.stmt(id).kind {
            StmtKind::Block { statements, .. } => Shape::Block(statements.clone()),
            StmtKind::Return { value } => Shape::Return(*value),
            StmtKind::If { condition, then_branch, else_branch } => Shape::If(*condition, *then_branch, *else_branch),
            StmtKind::While { condition, body } => Shape::While(*condition, *body),
            StmtKind::For { init, condition, step, body, .. } => Shape::For(*init, *condition, *step, *body),
            StmtKind::ExprStmt(e) => Shape::ExprStmt(*e),
            StmtKind::VarDecl(v) => Shape::VarDecl(*v),
        };
        let span = self.model.stmt(id).span;
        match shape {
            Shape::Block(children) => {
                self.scope_stack.push(Scope::Stmt(id));
                for c in children {
                    self.resolve_stmt(c);
                }
                self.scope_stack.pop();
            }
            Shape::Return(value) => {
                if let Some(v) = value {
                    let (new_v, ret_ty) = self.resolve_value(v);
                    let new_v = if let Some(fid) = self.current_function {
                        if let Some(expected) = self.model.function(fid).return_type {
                            self.require_convertible(ret_ty, expected, span);
                            self.coerce(new_v, ret_ty, expected)
                        } else {
                            new_v
                        }
                    } else {
                        new_v
                    };
                    if let StmtKind::Return { value } = &mut self.model.stmt_mut(id).kind {
                        *value = Some(new_v);
                    }
                }
            }
            Shape::If(cond, then_b, else_b) => {
                let (c, ct) = self.resolve_value(cond);
                self.require_numeric_or_bool(ct, span);
                if let StmtKind::If { condition, .. } = &mut self.model.stmt_mut(id).kind {
                    *condition = c;
                }
                self.resolve_stmt(then_b);
                if let Some(e) = else_b {
                    self.resolve_stmt(e);
                }
            }
            Shape::While(cond, body) => {
                let (c, ct) = self.resolve_value(cond);
                self.require_numeric_or_bool(ct, span);
                if let StmtKind::While { condition, .. } = &mut self.model.stmt_mut(id).kind {
                    *condition = c;
                }
                self.resolve_stmt(body);
            }
            Shape::For(init, cond, step, body) => {
                self.scope_stack.push(Scope::Stmt(id));
                if let Some(i) = init {
                    self.resolve_stmt(i);
                }
                if let Some(c) = cond {
                    let (c2, ct) = self.resolve_value(c);
                    self.require_numeric_or_bool(ct, span);
                    if let StmtKind::For { condition, .. } = &mut self.model.stmt_mut(id).kind {
                        *condition = Some(c2);
                    }
                }
                if let Some(s) = step {
                    let (s2, _) = self.resolve_value(s);
                    if let StmtKind::For { step, .. } = &mut self.model.stmt_mut(id).kind {
                        *step = Some(s2);
                    }
                }
                self.resolve_stmt(body);
                self.scope_stack.pop();
            }
            Shape::ExprStmt(e) => {
                let (new_e, _) = self.resolve_value(e);
                if let StmtKind::ExprStmt(slot) = &mut self.model.stmt_mut(id).kind {
                    *slot = new_e;
                }
            }
            Shape::VarDecl(vid) => self.resolve_variable(vid),
        }
    }
}
