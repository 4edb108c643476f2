//! AST-to-model builder (spec §4.4): walks the parsed tree once, creating
//! one model entity per declaration and one leaf expression node per
//! operator use, from the fixed table spec §4.4 describes. Types named in
//! the source are interned eagerly through [`crate::types::TypeRegistry`];
//! forward references to not-yet-seen structs are resolved afterward by
//! [`TypeRegistry::resolve_types`].

use indexmap::IndexMap;

use crate::ast::{self, BinOp, Decl, Expr, Literal, QualifiedName, UnaryOp};
use crate::diagnostics::{builder_codes, Diagnostics, Severity};
use crate::lexer::{FloatSize, IntegerSize, NumericBase};
use crate::types::{PrimitiveKind, TypeId};
use klang_core::Span;

use super::entities::*;

/// The nearest enclosing scope the builder is currently inside. Drives both
/// parent-pointer assignment and "nearest variable holder" lookup — a
/// `Structure`/`Function` frame is a lexical parent but not itself a
/// holder, so [`Builder::declare_variable`] walks past it.
enum ScopeFrame {
    Namespace(NamespaceId),
    Structure(StructureId),
    Function(FunctionId),
    Stmt(StmtId),
}

struct Builder<'a> {
    model: Model,
    scope_stack: Vec<ScopeFrame>,
    qname_stack: Vec<QualifiedName>,
    diagnostics: &'a mut Diagnostics,
}

pub fn build_model(unit: &ast::Unit, diagnostics: &mut Diagnostics) -> Model {
    let mut builder = Builder::new(diagnostics);
    builder.build_unit(unit);
    builder.finish()
}

impl<'a> Builder<'a> {
    fn new(diagnostics: &'a mut Diagnostics) -> Self {
        let mut model = Model {
            namespaces: Vec::new(),
            structures: Vec::new(),
            functions: Vec::new(),
            parameters: Vec::new(),
            variables: Vec::new(),
            stmts: Vec::new(),
            exprs: Vec::new(),
            root: 0,
            types: crate::types::TypeRegistry::new(),
        };
        let root = model.push_namespace(Namespace {
            name: None,
            qualified_name: QualifiedName::default(),
            parent: ParentId::None,
            variables: IndexMap::new(),
            functions: Vec::new(),
            structures: Vec::new(),
            namespaces: Vec::new(),
            span: Span::point(klang_core::SourceCoord::START),
        });
        model.root = root;
        Builder {
            model,
            scope_stack: vec![ScopeFrame::Namespace(root)],
            qname_stack: vec![QualifiedName::default()],
            diagnostics,
        }
    }

    fn finish(mut self) -> Model {
        self.model.types.resolve_types(self.diagnostics);
        self.model
    }

    // ---- scope bookkeeping ------------------------------------------------

    fn current_parent(&self) -> ParentId {
        match self.scope_stack.last() {
            Some(ScopeFrame::Namespace(id)) => ParentId::Namespace(*id),
            Some(ScopeFrame::Structure(id)) => ParentId::Structure(*id),
            Some(ScopeFrame::Function(id)) => ParentId::Function(*id),
            Some(ScopeFrame::Stmt(id)) => ParentId::Stmt(*id),
            None => ParentId::None,
        }
    }

    fn current_qualified_name(&self) -> QualifiedName {
        self.qname_stack.last().cloned().unwrap_or_default()
    }

    fn current_namespace(&self) -> NamespaceId {
        for frame in self.scope_stack.iter().rev() {
            if let ScopeFrame::Namespace(id) = frame {
                return *id;
            }
        }
        unreachable!("the unit's root namespace frame is never popped")
    }

    /// Binds `name` into the nearest enclosing variable holder (a
    /// namespace, or a `Block`/`For` statement). Reports
    /// `VARIABLE_OUTSIDE_HOLDER` if the scope stack has none, which should
    /// be unreachable since the root namespace is always present.
    fn declare_variable(&mut self, name: &str, var_id: VariableId, span: Span) {
        for frame in self.scope_stack.iter().rev() {
            match *frame {
                ScopeFrame::Namespace(id) => {
                    if self.model.namespace(id).variables.contains_key(name) {
                        self.report_duplicate(name, span);
                        return;
                    }
                    self.model.namespace_mut(id).variables.insert(name.to_string(), var_id);
                    return;
                }
                ScopeFrame::Stmt(id) => {
                    let (bound, duplicate) = match &mut self.model.stmt_mut(id).kind {
                        StmtKind::Block { variables, .. } | StmtKind::For { variables, .. } => {
                            if variables.contains_key(name) {
                                (true, true)
                            } else {
                                variables.insert(name.to_string(), var_id);
                                (true, false)
                            }
                        }
                        _ => (false, false),
                    };
                    if duplicate {
                        self.report_duplicate(name, span);
                    }
                    if bound {
                        return;
                    }
                }
                _ => {}
            }
        }
        self.diagnostics.report(
            Severity::Error,
            builder_codes::VARIABLE_OUTSIDE_HOLDER,
            span,
            format!("'{name}' declared outside any variable holder"),
        );
    }

    fn report_duplicate(&mut self, name: &str, span: Span) {
        self.diagnostics.report(Severity::Error, builder_codes::DUPLICATE_DEFINITION, span, format!("'{name}' is already defined in this scope"));
    }

    // ---- declarations -------------------------------------------------

    fn build_unit(&mut self, unit: &ast::Unit) {
        if let Some(name) = &unit.module_name {
            self.model.namespace_mut(self.model.root).qualified_name = name.clone();
            *self.qname_stack.last_mut().unwrap() = name.clone();
        }
        for decl in &unit.declarations {
            self.build_decl(decl);
        }
    }

    fn build_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Namespace(n) => {
                let id = self.build_namespace(n);
                self.model.namespace_mut(self.current_namespace()).namespaces.push(id);
            }
            Decl::Function(f) => {
                let ns = self.current_namespace();
                if self.model.namespace(ns).functions.iter().any(|&fid| self.model.function(fid).name == f.name) {
                    self.report_duplicate(&f.name, f.span);
                }
                let id = self.build_function(f, None);
                self.model.namespace_mut(ns).functions.push(id);
            }
            Decl::Variable(v) => {
                self.build_variable(v);
            }
            Decl::Struct(s) => {
                let ns = self.current_namespace();
                if self.model.namespace(ns).structures.iter().any(|&sid| self.model.structure(sid).name.short_name() == Some(s.name.as_str())) {
                    self.report_duplicate(&s.name, s.span);
                }
                let id = self.build_struct(s);
                self.model.namespace_mut(ns).structures.push(id);
            }
        }
    }

    fn build_namespace(&mut self, decl: &ast::NamespaceDecl) -> NamespaceId {
        let parent = self.current_parent();
        let qualified_name = match &decl.name {
            Some(n) => self.current_qualified_name().joined(&QualifiedName::simple(n.clone())),
            None => self.current_qualified_name(),
        };
        let id = self.model.push_namespace(Namespace {
            name: decl.name.clone(),
            qualified_name: qualified_name.clone(),
            parent,
            variables: IndexMap::new(),
            functions: Vec::new(),
            structures: Vec::new(),
            namespaces: Vec::new(),
            span: decl.span,
        });
        self.qname_stack.push(qualified_name);
        self.scope_stack.push(ScopeFrame::Namespace(id));
        for d in &decl.declarations {
            self.build_decl(d);
        }
        self.scope_stack.pop();
        self.qname_stack.pop();
        id
    }

    fn build_struct(&mut self, decl: &ast::StructDecl) -> StructureId {
        let parent = self.current_parent();
        let qualified_name = self.current_qualified_name().joined(&QualifiedName::simple(decl.name.clone()));

        let mut field_table = Vec::new();
        let mut field_var_ids = Vec::new();
        for f in &decl.fields {
            if field_table.iter().any(|(n, _): &(String, TypeId)| n == &f.name) {
                self.report_duplicate(&f.name, f.span);
                continue;
            }
            let ty = self.model.types.from_type_specifier(&f.ty);
            let var_id = self.model.push_variable(Variable {
                name: f.name.clone(),
                parent: ParentId::None,
                type_id: ty,
                initializer: None,
                is_static: f.specifiers.is_static,
                is_const: f.specifiers.is_const,
                span: f.span,
            });
            field_table.push((f.name.clone(), ty));
            field_var_ids.push(var_id);
        }
        let type_id = self.model.types.register_struct(qualified_name.clone(), field_table);
        let structure_id = self.model.push_structure(Structure {
            name: qualified_name.clone(),
            parent,
            type_id,
            fields: field_var_ids.clone(),
            methods: Vec::new(),
            span: decl.span,
        });
        for var_id in &field_var_ids {
            self.model.variable_mut(*var_id).parent = ParentId::Structure(structure_id);
        }

        self.qname_stack.push(qualified_name);
        self.scope_stack.push(ScopeFrame::Structure(structure_id));
        for m in &decl.methods {
            let already_a_method =
                self.model.structure(structure_id).methods.iter().any(|&fid| self.model.function(fid).name == m.name);
            let already_a_field = field_var_ids.iter().any(|&vid| self.model.variable(vid).name == m.name);
            if already_a_method || already_a_field {
                self.report_duplicate(&m.name, m.span);
            }
            let fn_id = self.build_function(m, Some(structure_id));
            self.model.structure_mut(structure_id).methods.push(fn_id);
        }
        self.scope_stack.pop();
        self.qname_stack.pop();
        structure_id
    }

    fn build_function(&mut self, decl: &ast::FunctionDecl, owner_struct: Option<StructureId>) -> FunctionId {
        let parent = self.current_parent();
        let qualified_name = self.current_qualified_name().joined(&QualifiedName::simple(decl.name.clone()));
        let return_type = decl.return_type.as_ref().map(|t| self.model.types.from_type_specifier(t));

        let fn_id = self.model.push_function(Function {
            name: decl.name.clone(),
            qualified_name,
            parent,
            specifiers: decl.specifiers,
            this_param: None,
            parameters: Vec::new(),
            return_type,
            owner_struct,
            body: None,
            type_id: TypeId::MAX,
            span: decl.span,
        });

        let this_param = owner_struct.map(|sid| {
            let struct_ty = self.model.structure(sid).type_id;
            let this_ty = self.model.types.reference_to(struct_ty);
            self.model.push_parameter(Parameter { name: "this".into(), index: -1, type_id: this_ty, span: decl.span })
        });

        let mut param_ids = Vec::new();
        let mut param_types = Vec::new();
        for (i, p) in decl.parameters.iter().enumerate() {
            let ty = self.model.types.from_type_specifier(&p.ty);
            param_types.push(ty);
            param_ids.push(self.model.push_parameter(Parameter { name: p.name.clone(), index: i as i32, type_id: ty, span: p.span }));
        }

        let owner_type = owner_struct.map(|sid| self.model.structure(sid).type_id);
        let fn_type = self.model.types.function_ref(return_type, param_types, owner_type);

        let func = self.model.function_mut(fn_id);
        func.this_param = this_param;
        func.parameters = param_ids;
        func.type_id = fn_type;

        self.scope_stack.push(ScopeFrame::Function(fn_id));
        let body = decl.body.as_ref().map(|b| self.build_block(b));
        self.scope_stack.pop();
        self.model.function_mut(fn_id).body = body;
        fn_id
    }

    fn build_variable(&mut self, decl: &ast::VariableDecl) -> VariableId {
        let parent = self.current_parent();
        let ty = self.model.types.from_type_specifier(&decl.ty);
        let init = decl.initializer.as_ref().map(|e| self.build_expr(e));
        let var_id = self.model.push_variable(Variable {
            name: decl.name.clone(),
            parent,
            type_id: ty,
            initializer: init,
            is_static: decl.specifiers.is_static,
            is_const: decl.specifiers.is_const,
            span: decl.span,
        });
        self.declare_variable(&decl.name, var_id, decl.span);
        var_id
    }

    // ---- statements --------------------------------------------------

    fn build_block(&mut self, block: &ast::Block) -> StmtId {
        let parent = self.current_parent();
        let stmt_id = self.model.push_stmt(StmtNode {
            kind: StmtKind::Block { variables: IndexMap::new(), statements: Vec::new() },
            parent,
            span: block.span,
        });
        self.scope_stack.push(ScopeFrame::Stmt(stmt_id));
        let mut children = Vec::new();
        for s in &block.statements {
            children.push(self.build_stmt(s));
        }
        self.scope_stack.pop();
        if let StmtKind::Block { statements, .. } = &mut self.model.stmt_mut(stmt_id).kind {
            *statements = children;
        }
        stmt_id
    }

    fn build_stmt(&mut self, stmt: &ast::Stmt) -> StmtId {
        use ast::Stmt::*;
        match stmt {
            Block(b) => self.build_block(b),
            Return { value, span } => {
                if !self.scope_stack.iter().any(|f| matches!(f, ScopeFrame::Function(_))) {
                    self.diagnostics.report(
                        Severity::Error,
                        builder_codes::RETURN_OUTSIDE_FUNCTION,
                        *span,
                        "return statement outside a function body",
                    );
                }
                let parent = self.current_parent();
                let value_id = value.as_ref().map(|e| self.build_expr(e));
                self.model.push_stmt(StmtNode { kind: StmtKind::Return { value: value_id }, parent, span: *span })
            }
            If { condition, then_branch, else_branch, span } => {
                let parent = self.current_parent();
                let cond = self.build_expr(condition);
                let then_id = self.build_stmt(then_branch);
                let else_id = else_branch.as_ref().map(|s| self.build_stmt(s));
                self.model.push_stmt(StmtNode { kind: StmtKind::If { condition: cond, then_branch: then_id, else_branch: else_id }, parent, span: *span })
            }
            While { condition, body, span } => {
                let parent = self.current_parent();
                let cond = self.build_expr(condition);
                let body_id = self.build_stmt(body);
                self.model.push_stmt(StmtNode { kind: StmtKind::While { condition: cond, body: body_id }, parent, span: *span })
            }
            For { init, condition, step, body, span } => {
                let parent = self.current_parent();
                let for_id = self.model.push_stmt(StmtNode {
                    kind: StmtKind::For { variables: IndexMap::new(), init: None, condition: None, step: None, body: 0 },
                    parent,
                    span: *span,
                });
                self.scope_stack.push(ScopeFrame::Stmt(for_id));
                let init_id = init.as_ref().map(|s| self.build_stmt(s));
                let cond_id = condition.as_ref().map(|e| self.build_expr(e));
                let step_id = step.as_ref().map(|e| self.build_expr(e));
                let body_id = self.build_stmt(body);
                self.scope_stack.pop();
                if let StmtKind::For { init: i, condition: c, step: st, body: b, .. } = &mut self.model.stmt_mut(for_id).kind {
                    *i = init_id;
                    *c = cond_id;
                    *st = step_id;
                    *b = body_id;
                }
                for_id
            }
            Expr { expr, span } => {
                let parent = self.current_parent();
                let e = self.build_expr(expr);
                self.model.push_stmt(StmtNode { kind: StmtKind::ExprStmt(e), parent, span: *span })
            }
            VarDecl(decl) => {
                let parent = self.current_parent();
                let var_id = self.build_variable(decl);
                self.model.push_stmt(StmtNode { kind: StmtKind::VarDecl(var_id), parent, span: decl.span })
            }
        }
    }

    // ---- expressions ---------------------------------------------------

    fn push_expr_kind(&mut self, kind: ExprKind, ty: Option<TypeId>, span: Span) -> ExprId {
        self.model.push_expr(ExprNode { kind, ty, resolved: None, span })
    }

    fn build_expr(&mut self, expr: &Expr) -> ExprId {
        match expr {
            Expr::Literal(lit, span) => self.build_literal(lit, *span),
            Expr::Identifier(name, span) => self.push_expr_kind(ExprKind::Symbol(name.clone()), None, *span),
            Expr::This(span) => self.push_expr_kind(ExprKind::Symbol(QualifiedName::simple("this")), None, *span),
            Expr::Unary { op, operand, span } => self.build_unary(*op, operand, *span),
            Expr::Binary { op, left, right, span } => self.build_binary(*op, left, right, *span),
            Expr::Conditional { condition, then_value, else_value, span } => {
                let c = self.build_expr(condition);
                let t = self.build_expr(then_value);
                let e = self.build_expr(else_value);
                self.push_expr_kind(ExprKind::Conditional(c, t, e), None, *span)
            }
            Expr::Cast { target, operand, span } => {
                let ty = self.model.types.from_type_specifier(target);
                let sub = self.build_expr(operand);
                self.push_expr_kind(ExprKind::Cast(ty, sub), None, *span)
            }
            Expr::Subscript { array, index, span } => {
                let a = self.build_expr(array);
                let i = self.build_expr(index);
                self.push_expr_kind(ExprKind::Subscript(a, i), None, *span)
            }
            Expr::Call { callee, arguments, span } => {
                let c = self.build_expr(callee);
                let args = arguments.iter().map(|a| self.build_expr(a)).collect();
                self.push_expr_kind(ExprKind::FunctionInvocation(c, args), None, *span)
            }
            Expr::Member { object, member, via_pointer, span } => {
                let o = self.build_expr(object);
                let kind = if *via_pointer {
                    ExprKind::MemberOfPointer(o, member.clone())
                } else {
                    ExprKind::MemberOfObject(o, member.clone())
                };
                self.push_expr_kind(kind, None, *span)
            }
            Expr::ExprList(items, span) => {
                let ids = items.iter().map(|e| self.build_expr(e)).collect();
                self.push_expr_kind(ExprKind::ExprList(ids), None, *span)
            }
        }
    }

    fn build_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> ExprId {
        let sub = self.build_expr(operand);
        let kind = match op {
            UnaryOp::PreIncrement => ExprKind::PreIncrement(sub),
            UnaryOp::PreDecrement => ExprKind::PreDecrement(sub),
            UnaryOp::PostIncrement => ExprKind::PostIncrement(sub),
            UnaryOp::PostDecrement => ExprKind::PostDecrement(sub),
            UnaryOp::Deref => ExprKind::Dereference(sub),
            UnaryOp::AddressOf => ExprKind::AddressOf(sub),
            UnaryOp::Plus => ExprKind::UnaryPlus(sub),
            UnaryOp::Negate => ExprKind::UnaryMinus(sub),
            UnaryOp::LogicalNot => ExprKind::LogicalNot(sub),
            UnaryOp::BitNot => ExprKind::BitwiseNot(sub),
        };
        self.push_expr_kind(kind, None, span)
    }

    /// `.*`/`->*` have no model mapping in the system this builder follows
    /// (see DESIGN.md); both operands are still built so diagnostics inside
    /// them surface, but the expression itself lowers to `ExprKind::Error`.
    fn build_binary(&mut self, op: BinOp, left: &Expr, right: &Expr, span: Span) -> ExprId {
        let l = self.build_expr(left);
        if matches!(op, BinOp::PtrToMemberObject | BinOp::PtrToMemberPointer) {
            let _ = self.build_expr(right);
            self.diagnostics.report(
                Severity::Error,
                builder_codes::UNSUPPORTED_OPERATOR,
                span,
                "pointer-to-member operators are not supported",
            );
            return self.push_expr_kind(ExprKind::Error, None, span);
        }
        let r = self.build_expr(right);
        let kind = match op {
            BinOp::Add => ExprKind::Addition(l, r),
            BinOp::Sub => ExprKind::Substraction(l, r),
            BinOp::Mul => ExprKind::Multiplication(l, r),
            BinOp::Div => ExprKind::Division(l, r),
            BinOp::Mod => ExprKind::Modulo(l, r),
            BinOp::Shl => ExprKind::LeftShift(l, r),
            BinOp::Shr => ExprKind::RightShift(l, r),
            BinOp::Lt => ExprKind::Lesser(l, r),
            BinOp::Le => ExprKind::LesserEqual(l, r),
            BinOp::Gt => ExprKind::Greater(l, r),
            BinOp::Ge => ExprKind::GreaterEqual(l, r),
            BinOp::Eq => ExprKind::Equal(l, r),
            BinOp::Ne => ExprKind::Different(l, r),
            BinOp::BitAnd => ExprKind::BitwiseAnd(l, r),
            BinOp::BitOr => ExprKind::BitwiseOr(l, r),
            BinOp::BitXor => ExprKind::BitwiseXor(l, r),
            BinOp::And => ExprKind::LogicalAnd(l, r),
            BinOp::Or => ExprKind::LogicalOr(l, r),
            BinOp::Assign => ExprKind::SimpleAssignation(l, r),
            BinOp::AddAssign => ExprKind::AddAssignation(l, r),
            BinOp::SubAssign => ExprKind::SubAssignation(l, r),
            BinOp::MulAssign => ExprKind::MulAssignation(l, r),
            BinOp::DivAssign => ExprKind::DivAssignation(l, r),
            BinOp::ModAssign => ExprKind::ModAssignation(l, r),
            BinOp::ShlAssign => ExprKind::ShlAssignation(l, r),
            BinOp::ShrAssign => ExprKind::ShrAssignation(l, r),
            BinOp::BitAndAssign => ExprKind::BitAndAssignation(l, r),
            BinOp::BitOrAssign => ExprKind::BitOrAssignation(l, r),
            BinOp::BitXorAssign => ExprKind::BitXorAssignation(l, r),
            BinOp::PtrToMemberObject | BinOp::PtrToMemberPointer => unreachable!("handled above"),
        };
        self.push_expr_kind(kind, None, span)
    }

    fn build_literal(&mut self, lit: &Literal, span: Span) -> ExprId {
        let (value, ty) = match lit {
            Literal::Integer { unsigned, size, digits, base } => self.literal_integer_value(*unsigned, *size, *base, digits),
            Literal::Float { size, digits } => self.literal_float_value(*size, digits),
            Literal::Char(c) => (Value::Char(*c), self.model.types.from_primitive_tag(PrimitiveKind::Char)),
            Literal::Str(s) => {
                let char_ty = self.model.types.from_primitive_tag(PrimitiveKind::Char);
                let len = s.len() as u64 + 1;
                (Value::Str(s.clone()), self.model.types.sized_array_of(char_ty, len))
            }
            Literal::Bool(b) => (Value::Bool(*b), self.model.types.from_primitive_tag(PrimitiveKind::Bool)),
            Literal::Null => {
                let byte_ty = self.model.types.from_primitive_tag(PrimitiveKind::UnsignedChar);
                (Value::Null, self.model.types.pointer_to(byte_ty))
            }
        };
        self.push_expr_kind(ExprKind::Value(value), Some(ty), span)
    }

    /// Generalizes the original's "unsigned flag picks byte vs. char"
    /// literal-typing rule to all six integer-size tiers (spec §3.2);
    /// `LongLong`/`BigInt` collapse onto `long`/`unsigned long` since the
    /// type system models nothing wider (spec §3.6).
    fn literal_integer_value(&mut self, unsigned: bool, size: IntegerSize, base: NumericBase, digits: &str) -> (Value, TypeId) {
        use IntegerSize::*;
        let kind = match size {
            Byte => if unsigned { PrimitiveKind::UnsignedChar } else { PrimitiveKind::Char },
            Short => if unsigned { PrimitiveKind::UnsignedShort } else { PrimitiveKind::Short },
            Int => if unsigned { PrimitiveKind::UnsignedInt } else { PrimitiveKind::Int },
            Long | LongLong | BigInt => if unsigned { PrimitiveKind::UnsignedLong } else { PrimitiveKind::Long },
        };
        let ty = self.model.types.from_primitive_tag(kind);
        let magnitude = parse_digits(base, digits);
        let value = if unsigned { Value::UnsignedInteger(magnitude) } else { Value::Integer(magnitude as i64) };
        (value, ty)
    }

    fn literal_float_value(&mut self, size: FloatSize, digits: &str) -> (Value, TypeId) {
        let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
        match size {
            FloatSize::Float => {
                let v: f32 = cleaned.parse().unwrap_or(0.0);
                (Value::Float(v), self.model.types.from_primitive_tag(PrimitiveKind::Float))
            }
            FloatSize::Double => {
                let v: f64 = cleaned.parse().unwrap_or(0.0);
                (Value::Double(v), self.model.types.from_primitive_tag(PrimitiveKind::Double))
            }
        }
    }
}

fn parse_digits(base: NumericBase, digits: &str) -> u64 {
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    u64::from_str_radix(&cleaned, base as u32).unwrap_or(0)
}
