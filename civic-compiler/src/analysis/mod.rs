//! Binder and type checker.
//!
//! Walks the normalized AST once, resolving every identifier and call to its
//! declaration, inferring and checking types, and enforcing the language
//! rules (redefinition, immutability, array ranks, missing returns, global
//! initialization order). Diagnostics accumulate; analysis never stops at
//! the first error.

pub mod symbol_table;

use crate::ast::{ArrayDim, Ast, NodeId, NodeKind, Operator, Type, INIT_FUNCTION};
use crate::{CompileError, Diagnostic};
use std::collections::{HashMap, HashSet};
use symbol_table::{Record, ScopeTable, SymbolKind};

/// Analyze the tree in place. Returns the accumulated diagnostics as one
/// error if any rule was violated; the pipeline must not continue past it.
pub fn analyze(ast: &mut Ast) -> Result<(), CompileError> {
    let mut analyzer = Analyzer::new(ast);
    analyzer.run();
    if analyzer.diagnostics.is_empty() {
        Ok(())
    } else {
        Err(CompileError::Semantic {
            diagnostics: analyzer.diagnostics,
        })
    }
}

struct Analyzer<'a> {
    ast: &'a mut Ast,
    table: ScopeTable,
    diagnostics: Vec<Diagnostic>,
    /// Stack of enclosing function definitions.
    functions: Vec<NodeId>,
    /// Declarations already inserted by the declare phase of their scope.
    predeclared: HashSet<NodeId>,
    /// Source order of root-level globals, for the initializer ordering rule.
    global_order: HashMap<NodeId, usize>,
}

impl<'a> Analyzer<'a> {
    fn new(ast: &'a mut Ast) -> Self {
        Self {
            ast,
            table: ScopeTable::new(),
            diagnostics: Vec::new(),
            functions: Vec::new(),
            predeclared: HashSet::new(),
            global_order: HashMap::new(),
        }
    }

    fn run(&mut self) {
        self.table.enter_scope();
        let decls = self.ast.root_decls();

        for (order, &decl) in decls.iter().enumerate() {
            if matches!(
                self.ast.kind(decl),
                NodeKind::GlobalDef { .. } | NodeKind::GlobalDec { .. }
            ) {
                self.global_order.insert(decl, order);
            }
        }

        // Declare phase: signatures first, so forward references to sibling
        // functions and globals resolve.
        for &decl in &decls {
            self.declare(decl);
        }

        // Body phase.
        for &decl in &decls {
            if matches!(self.ast.kind(decl), NodeKind::FunctionDef { .. }) {
                self.check_function(decl);
            }
        }
    }

    /// Inserts the signature of a declaration into the current scope. The
    /// synthesized module initializer is not a callable symbol and is skipped.
    fn declare(&mut self, id: NodeId) {
        let (name, record) = match self.ast.kind(id) {
            NodeKind::FunctionDec { header } => (
                header.name.clone(),
                Record::function(
                    header.return_type,
                    header.params.iter().map(|p| p.ty).collect(),
                    id,
                ),
            ),
            NodeKind::FunctionDef { header, .. } => {
                if header.name == INIT_FUNCTION {
                    return;
                }
                (
                    header.name.clone(),
                    Record::function(
                        header.return_type,
                        header.params.iter().map(|p| p.ty).collect(),
                        id,
                    ),
                )
            }
            NodeKind::GlobalDec { param } => (
                param.name.clone(),
                Record::variable(param.ty, id).with_dims(
                    param.dims.iter().cloned().map(ArrayDim::Named).collect(),
                ),
            ),
            NodeKind::GlobalDef { var, .. } => (
                var.name.clone(),
                Record::variable(var.ty, id).with_dims(var.dims.clone()),
            ),
            NodeKind::VarDec {
                immutable, var, ..
            } => {
                let mut record = Record::variable(var.ty, id).with_dims(var.dims.clone());
                if *immutable {
                    record = record.immutable();
                }
                (var.name.clone(), record)
            }
            _ => return,
        };
        if !self.table.insert(&name, record) {
            self.error(id, format!("redefinition of '{name}'"));
        }
        self.predeclared.insert(id);
    }

    fn check_function(&mut self, def: NodeId) {
        let (header, body) = match self.ast.kind(def) {
            NodeKind::FunctionDef { header, body, .. } => (header.clone(), body.clone()),
            _ => return,
        };
        let is_init = header.name == INIT_FUNCTION;

        self.functions.push(def);
        self.table.enter_scope();

        for param in &header.params {
            let record = Record::variable(param.ty, def)
                .with_dims(param.dims.iter().cloned().map(ArrayDim::Named).collect());
            if !self.table.insert(&param.name, record) {
                self.error(def, format!("redefinition of parameter '{}'", param.name));
            }
        }

        for &item in &body {
            self.declare(item);
        }
        for &item in &body {
            self.check_statement(item, is_init);
        }

        if header.return_type != Type::Void {
            let ends_in_return = body
                .last()
                .is_some_and(|&s| matches!(self.ast.kind(s), NodeKind::Return { .. }));
            if !ends_in_return {
                self.error(def, "missing return statement".to_string());
            }
        }

        self.table.exit_scope();
        self.functions.pop();
    }

    fn check_statement(&mut self, id: NodeId, in_init: bool) {
        match self.ast.kind(id).clone() {
            NodeKind::VarDec { .. } => {
                // Declarations hoisted into nested statement lists were not
                // visible to the declare phase; insert them on first visit.
                if !self.predeclared.contains(&id) {
                    self.declare(id);
                }
            }
            NodeKind::FunctionDef { .. } => self.check_function(id),
            NodeKind::Assignment {
                name, index, value, ..
            } => self.check_assignment(id, &name, index, value, in_init),
            NodeKind::Return { value, .. } => self.check_return(id, value),
            NodeKind::Call { .. } => {
                let _ = self.check_call(id);
            }
            NodeKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.check_condition(cond);
                for s in then_body {
                    self.check_statement(s, in_init);
                }
                for s in else_body {
                    self.check_statement(s, in_init);
                }
            }
            NodeKind::While { cond, body } => {
                self.check_condition(cond);
                for s in body {
                    self.check_statement(s, in_init);
                }
            }
            NodeKind::DoWhile { body, cond } => {
                for s in body {
                    self.check_statement(s, in_init);
                }
                self.check_condition(cond);
            }
            NodeKind::For { body, .. } => {
                // Bounds were separated into checked declarations already;
                // only the body remains to be analyzed here.
                for s in body {
                    self.check_statement(s, in_init);
                }
            }
            NodeKind::AllocateArray { dims, .. } => self.check_index(dims),
            _ => {}
        }
    }

    fn check_assignment(
        &mut self,
        id: NodeId,
        name: &str,
        index: Option<NodeId>,
        value: NodeId,
        in_init: bool,
    ) {
        let Some(record) = self.table.lookup(name).cloned() else {
            self.error(id, format!("unknown identifier '{name}'"));
            if let Some(ix) = index {
                self.check_index(ix);
            }
            let _ = self.check_expression(value);
            return;
        };

        if record.kind == SymbolKind::Function {
            self.error(id, format!("function '{name}' cannot be assigned"));
            let _ = self.check_expression(value);
            return;
        }

        if record.immutable && record.initialized {
            self.error(id, format!("identifier '{name}' is immutable"));
        } else if let Some(live) = self.table.lookup_mut(name) {
            live.initialized = true;
        }
        self.set_assignment_binding(id, record.dec, record.ty);

        if record.is_array() {
            match index {
                Some(ix) => {
                    if self.index_rank(ix) != record.dims.len() {
                        self.error(ix, format!("incompatible array dimensions for '{name}'"));
                    }
                    self.check_index(ix);
                    let vt = self.check_expression(value);
                    if vt != Type::None && vt != record.ty {
                        self.error(id, format!("incompatible types in assignment to '{name}'"));
                    }
                }
                None => {
                    self.error(id, format!("array '{name}' cannot be reassigned"));
                    let _ = self.check_expression(value);
                }
            }
        } else {
            if index.is_some() {
                self.error(id, format!("'{name}' is not an array"));
            }
            let vt = self.check_expression(value);
            if vt != Type::None && record.ty != Type::None && vt != record.ty {
                self.error(id, format!("incompatible types in assignment to '{name}'"));
            }
        }

        if in_init {
            if let Some(&target_order) = self.global_order.get(&record.dec) {
                self.check_init_order(target_order, value);
            }
        }
    }

    /// Inside the module initializer, the right-hand side of a global
    /// assignment may only name globals declared earlier in source order.
    fn check_init_order(&mut self, target_order: usize, expr: NodeId) {
        match self.ast.kind(expr).clone() {
            NodeKind::Identifier {
                name,
                dec: Some(dec),
                index,
                ..
            } => {
                if let Some(&order) = self.global_order.get(&dec) {
                    if order >= target_order {
                        self.error(expr, format!("global '{name}' used before its declaration"));
                    }
                }
                if let Some(ix) = index {
                    self.check_init_order(target_order, ix);
                }
            }
            NodeKind::ArrayExpr { exprs } => {
                for e in exprs {
                    self.check_init_order(target_order, e);
                }
            }
            NodeKind::BinaryOp { left, right, .. } => {
                self.check_init_order(target_order, left);
                self.check_init_order(target_order, right);
            }
            NodeKind::UnaryOp { operand, .. } | NodeKind::Cast { operand, .. } => {
                self.check_init_order(target_order, operand);
            }
            NodeKind::Call { args, .. } => {
                for a in args {
                    self.check_init_order(target_order, a);
                }
            }
            NodeKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                self.check_init_order(target_order, cond);
                self.check_init_order(target_order, then_value);
                self.check_init_order(target_order, else_value);
            }
            _ => {}
        }
    }

    fn check_return(&mut self, id: NodeId, value: Option<NodeId>) {
        let Some(&func) = self.functions.last() else {
            return;
        };
        let header = match self.ast.kind(func) {
            NodeKind::FunctionDef { header, .. } => header.clone(),
            _ => return,
        };
        self.set_return_info(id, header.name.clone(), header.return_type);
        match value {
            Some(v) => {
                let vt = self.check_expression(v);
                if header.return_type == Type::Void {
                    self.error(
                        id,
                        format!("void function '{}' cannot return a value", header.name),
                    );
                } else if vt != Type::None && vt != header.return_type {
                    self.error(
                        id,
                        "return type does not match the function declaration".to_string(),
                    );
                }
            }
            None => {
                if header.return_type != Type::Void {
                    self.error(
                        id,
                        format!("function '{}' must return a value", header.name),
                    );
                }
            }
        }
    }

    fn check_condition(&mut self, cond: NodeId) {
        let ty = self.check_expression(cond);
        if ty != Type::None && ty != Type::Bool {
            self.error(cond, "condition must be of type bool".to_string());
        }
    }

    /// Checks an expression and returns its value type. Comparisons and
    /// boolean operators yield `Bool` here even though the node itself keeps
    /// the operand type for instruction selection later.
    fn check_expression(&mut self, id: NodeId) -> Type {
        match self.ast.kind(id).clone() {
            NodeKind::Literal { value } => value.ty(),
            NodeKind::Identifier { name, index, .. } => {
                let Some(record) = self.table.lookup(&name).cloned() else {
                    self.error(id, format!("unknown identifier '{name}'"));
                    return Type::None;
                };
                if record.kind == SymbolKind::Function {
                    self.error(id, format!("function '{name}' used as a variable"));
                    return Type::None;
                }
                self.set_identifier_binding(id, record.dec, record.ty);
                if let Some(ix) = index {
                    if !record.is_array() {
                        self.error(id, format!("'{name}' is not an array"));
                    } else if self.index_rank(ix) != record.dims.len() {
                        self.error(ix, format!("incompatible array dimensions for '{name}'"));
                    }
                    self.check_index(ix);
                }
                record.ty
            }
            NodeKind::Call { .. } => self.check_call(id),
            NodeKind::BinaryOp {
                op, left, right, ..
            } => self.check_binary(id, op, left, right),
            NodeKind::UnaryOp { op, operand, .. } => {
                let ty = self.check_expression(operand);
                if ty == Type::None {
                    return Type::None;
                }
                match op {
                    Operator::Not => {
                        if ty != Type::Bool {
                            self.error(operand, "'!' requires a bool operand".to_string());
                        }
                        self.set_unary_ty(id, Type::Bool);
                        Type::Bool
                    }
                    Operator::Negate => {
                        if !numeric(ty) {
                            self.error(operand, "'-' requires a numeric operand".to_string());
                        }
                        self.set_unary_ty(id, ty);
                        ty
                    }
                    _ => Type::None,
                }
            }
            NodeKind::Cast { to, operand, .. } => {
                let from = self.check_expression(operand);
                self.set_cast_from(id, from);
                to
            }
            NodeKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                self.check_condition(cond);
                let tt = self.check_expression(then_value);
                let et = self.check_expression(else_value);
                if tt != Type::None && et != Type::None && tt != et {
                    self.error(id, "ternary branches have different types".to_string());
                }
                tt
            }
            _ => Type::None,
        }
    }

    fn check_binary(&mut self, id: NodeId, op: Operator, left: NodeId, right: NodeId) -> Type {
        let lt = self.check_expression(left);
        let rt = self.check_expression(right);
        if lt == Type::None || rt == Type::None {
            // A sub-expression already produced a diagnostic; reporting a
            // mismatch against the sentinel would only cascade.
            return Type::None;
        }
        match op {
            Operator::And | Operator::Or => {
                if lt != Type::Bool || rt != Type::Bool {
                    self.error(left, format!("operands of '{op}' must be of type bool"));
                }
                self.set_binary_ty(id, Type::Bool);
                Type::Bool
            }
            Operator::Equal | Operator::NotEqual => {
                if lt != rt {
                    self.error(left, "operand types differ".to_string());
                }
                self.set_binary_ty(id, lt);
                Type::Bool
            }
            Operator::Less | Operator::LessEqual | Operator::More | Operator::MoreEqual => {
                if lt != rt {
                    self.error(left, "operand types differ".to_string());
                } else if !numeric(lt) {
                    self.error(left, format!("operator '{op}' requires numeric operands"));
                }
                self.set_binary_ty(id, lt);
                Type::Bool
            }
            Operator::Add | Operator::Subtract | Operator::Multiply => {
                if lt != rt {
                    self.error(left, "operand types differ".to_string());
                }
                self.set_binary_ty(id, lt);
                lt
            }
            Operator::Divide | Operator::Modulo => {
                if lt != rt {
                    self.error(left, "operand types differ".to_string());
                } else if !numeric(lt) {
                    self.error(left, format!("operator '{op}' requires numeric operands"));
                }
                self.set_binary_ty(id, lt);
                lt
            }
            Operator::Negate | Operator::Not => Type::None,
        }
    }

    fn check_call(&mut self, id: NodeId) -> Type {
        let NodeKind::Call { name, args, .. } = self.ast.kind(id).clone() else {
            return Type::None;
        };
        let Some(record) = self.table.lookup(&name).cloned() else {
            self.error(id, format!("unknown function '{name}'"));
            for a in args {
                let _ = self.check_expression(a);
            }
            return Type::None;
        };
        if record.kind != SymbolKind::Function {
            self.error(id, format!("'{name}' is not a function"));
            return Type::None;
        }
        self.set_call_binding(id, record.dec);

        if args.len() != record.params.len() {
            self.error(
                id,
                format!(
                    "call to '{name}' expects {} argument(s), got {}",
                    record.params.len(),
                    args.len()
                ),
            );
            for a in args {
                let _ = self.check_expression(a);
            }
            return record.ty;
        }

        let callee_params = match self.ast.kind(record.dec) {
            NodeKind::FunctionDec { header } => header.params.clone(),
            NodeKind::FunctionDef { header, .. } => header.params.clone(),
            _ => Vec::new(),
        };

        for (i, &arg) in args.iter().enumerate() {
            let at = self.check_expression(arg);
            let expected = record.params[i];
            if at != Type::None && at != expected {
                self.error(
                    arg,
                    format!("argument {} of '{name}' must be of type {expected}", i + 1),
                );
            }

            let param_dims = callee_params
                .get(i)
                .map(|p| p.dims.clone())
                .unwrap_or_default();
            let arg_ident = match self.ast.kind(arg) {
                NodeKind::Identifier {
                    name: arg_name,
                    index: None,
                    ..
                } => Some(arg_name.clone()),
                _ => None,
            };
            if let Some(arg_name) = arg_ident {
                let arg_dims = self
                    .table
                    .lookup(&arg_name)
                    .map(|r| r.dims.clone())
                    .unwrap_or_default();
                if (!arg_dims.is_empty() || !param_dims.is_empty())
                    && !dims_compatible(&param_dims, &arg_dims)
                {
                    self.error(
                        arg,
                        format!("incompatible array dimensions for argument '{arg_name}'"),
                    );
                }
            }
        }
        record.ty
    }

    /// Index expressions are forced to `Int`.
    fn check_index(&mut self, index: NodeId) {
        let NodeKind::ArrayExpr { exprs } = self.ast.kind(index).clone() else {
            return;
        };
        for e in exprs {
            let ty = self.check_expression(e);
            if ty != Type::None && ty != Type::Int {
                self.error(e, "array index must be of type int".to_string());
            }
        }
    }

    fn index_rank(&self, index: NodeId) -> usize {
        match self.ast.kind(index) {
            NodeKind::ArrayExpr { exprs } => exprs.len(),
            _ => 0,
        }
    }

    // ── Node annotation helpers ─────────────────────────────────────────

    fn set_identifier_binding(&mut self, id: NodeId, dec: NodeId, ty: Type) {
        if let NodeKind::Identifier {
            dec: slot, ty: t, ..
        } = self.ast.kind_mut(id)
        {
            *slot = Some(dec);
            *t = ty;
        }
    }

    fn set_assignment_binding(&mut self, id: NodeId, dec: NodeId, ty: Type) {
        if let NodeKind::Assignment {
            dec: slot, ty: t, ..
        } = self.ast.kind_mut(id)
        {
            *slot = Some(dec);
            *t = ty;
        }
    }

    fn set_call_binding(&mut self, id: NodeId, dec: NodeId) {
        if let NodeKind::Call { dec: slot, .. } = self.ast.kind_mut(id) {
            *slot = Some(dec);
        }
    }

    fn set_binary_ty(&mut self, id: NodeId, ty: Type) {
        if let NodeKind::BinaryOp { ty: t, .. } = self.ast.kind_mut(id) {
            *t = ty;
        }
    }

    fn set_unary_ty(&mut self, id: NodeId, ty: Type) {
        if let NodeKind::UnaryOp { ty: t, .. } = self.ast.kind_mut(id) {
            *t = ty;
        }
    }

    fn set_cast_from(&mut self, id: NodeId, from: Type) {
        if let NodeKind::Cast { from: f, .. } = self.ast.kind_mut(id) {
            *f = from;
        }
    }

    fn set_return_info(&mut self, id: NodeId, function: String, ty: Type) {
        if let NodeKind::Return {
            function: f, ty: t, ..
        } = self.ast.kind_mut(id)
        {
            *f = function;
            *t = ty;
        }
    }

    fn error(&mut self, id: NodeId, message: String) {
        let (line, col) = self.ast.pos(id);
        self.diagnostics.push(Diagnostic { line, col, message });
    }
}

fn numeric(ty: Type) -> bool {
    matches!(ty, Type::Int | Type::Float)
}

fn dims_compatible(param_dims: &[String], arg_dims: &[ArrayDim]) -> bool {
    if param_dims.len() != arg_dims.len() {
        return false;
    }
    param_dims
        .iter()
        .zip(arg_dims)
        .all(|(p, a)| matches!(a, ArrayDim::Named(n) if n == p))
}
