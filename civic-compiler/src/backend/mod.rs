//! Assembly emission for the lowered tree.
//!
//! The generator assumes its input passed the analyzer with zero diagnostics
//! and was fully lowered. It performs no further validation: a missing map
//! entry or an unlowered node kind panics, because it indicates a bug in an
//! earlier stage rather than a user-facing error.

pub mod frames;
pub mod instruction;

use crate::ast::{Ast, Literal, NodeId, NodeKind, Operator, Type};
use self::frames::Frames;
use self::instruction::{ConstantPool, InstrType, SubScope};
use std::collections::VecDeque;

pub fn generate(ast: &Ast) -> String {
    AssemblyGenerator::new(ast).generate()
}

struct AssemblyGenerator<'a> {
    ast: &'a Ast,
    frames: Frames,
    pool: ConstantPool,
    label_count: usize,
    out: String,
    globals: Vec<String>,
    exports: Vec<String>,
    current_function: Option<NodeId>,
}

impl<'a> AssemblyGenerator<'a> {
    fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            frames: frames::resolve(ast),
            pool: ConstantPool::new(),
            label_count: 0,
            out: String::new(),
            globals: Vec::new(),
            exports: Vec::new(),
            current_function: None,
        }
    }

    fn generate(mut self) -> String {
        // Breadth-first over function definitions: all top-level bodies
        // first, then the nested ones they enqueue.
        let mut queue = VecDeque::new();
        for decl in self.ast.root_decls() {
            match self.ast.kind(decl) {
                NodeKind::FunctionDef { .. } => queue.push_back(decl),
                NodeKind::GlobalDef { var, .. } => {
                    self.globals.push(format!(".global {}", var.ty));
                }
                _ => {}
            }
        }
        while let Some(def) = queue.pop_front() {
            self.emit_function(def, &mut queue);
        }

        self.out.push_str("\n; globals:\n");
        let table = self.pool.table();
        self.out.push_str(&table);
        for line in &self.globals {
            self.out.push_str(line);
            self.out.push('\n');
        }
        for line in &self.frames.import_lines {
            self.out.push_str(line);
            self.out.push('\n');
        }
        for line in &self.exports {
            self.out.push_str(line);
            self.out.push('\n');
        }
        self.out
    }

    fn emit_function(&mut self, def: NodeId, queue: &mut VecDeque<NodeId>) {
        let NodeKind::FunctionDef {
            exported,
            header,
            body,
        } = self.ast.kind(def).clone()
        else {
            return;
        };
        self.current_function = Some(def);

        if exported {
            let mut line = format!(".export \"{}\" {}", header.name, header.return_type);
            for param in &header.params {
                line.push_str(&format!(" {}", param.ty));
            }
            line.push_str(&format!(" {}", header.name));
            self.exports.push(line);
        }

        self.emit_label(&header.name);
        self.emit(instruction::enter_sub(self.count_locals(&body)));

        for &stmt in &body {
            if matches!(self.ast.kind(stmt), NodeKind::FunctionDef { .. }) {
                queue.push_back(stmt);
                continue;
            }
            self.emit_statement(stmt);
        }

        let ends_in_return = body
            .last()
            .is_some_and(|&s| matches!(self.ast.kind(s), NodeKind::Return { .. }));
        if !ends_in_return {
            self.emit(instruction::ret(InstrType::Void));
        }
        self.current_function = None;
    }

    /// Number of local slots the prologue reserves: every declaration in the
    /// body, nested function bodies excluded.
    fn count_locals(&self, body: &[NodeId]) -> usize {
        let mut count = 0;
        let mut stack: Vec<NodeId> = body.to_vec();
        while let Some(id) = stack.pop() {
            match self.ast.kind(id) {
                NodeKind::VarDec { .. } => count += 1,
                NodeKind::FunctionDef { .. } => {}
                _ => stack.extend(self.ast.children(id)),
            }
        }
        count
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn emit_statement(&mut self, id: NodeId) {
        match self.ast.kind(id).clone() {
            NodeKind::VarDec { .. } => {}
            NodeKind::AllocateArray { ty, dec, dims } => self.emit_allocation(ty, dec, dims),
            NodeKind::Assignment { .. } => self.emit_assignment(id),
            NodeKind::Call { .. } => self.emit_call(id, false),
            NodeKind::Return { ty, value, .. } => match value {
                Some(v) => {
                    self.emit_expression(v);
                    self.emit(instruction::ret(InstrType::from(ty)));
                }
                None => self.emit(instruction::ret(InstrType::Void)),
            },
            NodeKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let n = self.next_label();
                let else_label = format!("{n}_else");
                let end_label = format!("{n}_end");
                self.emit_expression(cond);
                self.emit(instruction::branch(false, &else_label));
                for s in then_body {
                    self.emit_statement(s);
                }
                if else_body.is_empty() {
                    self.emit_label(&else_label);
                } else {
                    self.emit(instruction::jump(&end_label));
                    self.emit_label(&else_label);
                    for s in else_body {
                        self.emit_statement(s);
                    }
                    self.emit_label(&end_label);
                }
            }
            NodeKind::DoWhile { body, cond } => {
                let n = self.next_label();
                let label = format!("{n}_do_while");
                self.emit_label(&label);
                for s in body {
                    self.emit_statement(s);
                }
                self.emit_expression(cond);
                self.emit(instruction::branch(true, &label));
            }
            other => panic!("statement not lowered before code generation: {other:?}"),
        }
    }

    fn emit_allocation(&mut self, ty: Type, dec: NodeId, dims: NodeId) {
        let NodeKind::ArrayExpr { exprs } = self.ast.kind(dims).clone() else {
            panic!("array allocation without a dimension list");
        };
        let rank = exprs.len();
        for e in exprs {
            self.emit_expression(e);
        }
        self.emit(instruction::new_array(InstrType::from(ty), rank));
        match self.ast.kind(dec) {
            NodeKind::VarDec { .. } => {
                let slot = self.frames.locals[&dec];
                self.emit(instruction::store_local(InstrType::Array, slot.index));
            }
            NodeKind::GlobalDef { .. } => {
                let index = self.frames.globals[&dec];
                self.emit(instruction::store_global(InstrType::Array, index));
            }
            other => panic!("array allocation for a non-variable: {other:?}"),
        }
    }

    fn emit_assignment(&mut self, id: NodeId) {
        let NodeKind::Assignment {
            name,
            dec,
            ty,
            index,
            value,
        } = self.ast.kind(id).clone()
        else {
            return;
        };
        let dec = dec.unwrap_or_else(|| panic!("unresolved assignment to '{name}'"));
        let ty = InstrType::from(ty);

        match self.ast.kind(dec).clone() {
            NodeKind::VarDec { .. } => {
                let slot = self.frames.locals[&dec];
                let levels = self.frames.site_frames[&id] - slot.frame;
                match index {
                    Some(ix) => {
                        self.emit_frame_load(InstrType::Array, levels, slot.index);
                        self.emit_indices(ix);
                        self.emit_expression(value);
                        self.emit(instruction::store_array(ty));
                    }
                    None => {
                        self.emit_expression(value);
                        if levels == 0 {
                            self.emit(instruction::store_local(ty, slot.index));
                        } else {
                            self.emit(instruction::store_relative(ty, levels, slot.index));
                        }
                    }
                }
            }
            NodeKind::FunctionDef { header, .. } => {
                let slot = param_slot(&header.params, &name);
                let levels = self.frames.site_frames[&id] - self.frames.function_frames[&dec];
                match index {
                    Some(ix) => {
                        self.emit_frame_load(InstrType::Array, levels, slot);
                        self.emit_indices(ix);
                        self.emit_expression(value);
                        self.emit(instruction::store_array(ty));
                    }
                    None => {
                        self.emit_expression(value);
                        if levels == 0 {
                            self.emit(instruction::store_local(ty, slot));
                        } else {
                            self.emit(instruction::store_relative(ty, levels, slot));
                        }
                    }
                }
            }
            NodeKind::GlobalDef { .. } | NodeKind::GlobalDec { .. } => {
                let gindex = self.frames.globals[&dec];
                match index {
                    Some(ix) => {
                        self.emit(instruction::load_global(InstrType::Array, gindex));
                        self.emit_indices(ix);
                        self.emit_expression(value);
                        self.emit(instruction::store_array(ty));
                    }
                    None => {
                        self.emit_expression(value);
                        self.emit(instruction::store_global(ty, gindex));
                    }
                }
            }
            other => panic!("assignment to a non-variable declaration: {other:?}"),
        }
    }

    // ── Calls ───────────────────────────────────────────────────────────

    fn emit_call(&mut self, id: NodeId, expression_position: bool) {
        let NodeKind::Call { name, dec, args } = self.ast.kind(id).clone() else {
            return;
        };
        let dec = dec.unwrap_or_else(|| panic!("unresolved call to '{name}'"));

        match self.ast.kind(dec).clone() {
            NodeKind::FunctionDec { header } => {
                self.emit(instruction::initiate_sub(SubScope::Global));
                for a in args {
                    self.emit_expression(a);
                }
                self.emit(instruction::jump_ext_sub(self.frames.imports[&dec]));
                if !expression_position && header.return_type != Type::Void {
                    self.emit(instruction::pop(InstrType::from(header.return_type)));
                }
            }
            NodeKind::FunctionDef { header, .. } => {
                let callee_frame = self.frames.function_frames[&dec];
                let call_frame = self.frames.call_frames[&id];
                let recursive = self
                    .current_function
                    .is_some_and(|f| self.frames.is_within(f, dec));
                let scope = if callee_frame == 0 {
                    SubScope::Global
                } else if call_frame - callee_frame == 1 && recursive {
                    SubScope::Current
                } else if call_frame == callee_frame {
                    SubScope::Local
                } else {
                    SubScope::Outer(call_frame - callee_frame - 1)
                };
                self.emit(instruction::initiate_sub(scope));
                let argc = args.len();
                for a in args {
                    self.emit_expression(a);
                }
                self.emit(instruction::jump_sub(argc, &name));
                if !expression_position && header.return_type != Type::Void {
                    self.emit(instruction::pop(InstrType::from(header.return_type)));
                }
            }
            other => panic!("call does not reference a function: {other:?}"),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn emit_expression(&mut self, id: NodeId) {
        match self.ast.kind(id).clone() {
            NodeKind::Literal { value } => {
                let text = match value {
                    Literal::Int(v) => self.pool.load_int(v),
                    Literal::Float(v) => self.pool.load_float(v),
                    Literal::Bool(v) => ConstantPool::load_bool(v),
                };
                self.emit(text);
            }
            NodeKind::Identifier {
                name,
                dec,
                ty,
                index,
            } => self.emit_identifier(id, &name, dec, ty, index),
            NodeKind::BinaryOp {
                op,
                ty,
                left,
                right,
            } => {
                self.emit_expression(left);
                self.emit_expression(right);
                let ty = InstrType::from(ty);
                let text = match op {
                    Operator::Add => instruction::add(ty),
                    Operator::Subtract => instruction::sub(ty),
                    Operator::Multiply => instruction::mul(ty),
                    Operator::Divide => instruction::div(ty),
                    Operator::Modulo => instruction::rem(ty),
                    Operator::Equal => instruction::equal(ty),
                    Operator::NotEqual => instruction::not_equal(ty),
                    Operator::Less => instruction::less(ty),
                    Operator::LessEqual => instruction::less_equal(ty),
                    Operator::More => instruction::greater(ty),
                    Operator::MoreEqual => instruction::greater_equal(ty),
                    Operator::And | Operator::Or | Operator::Negate | Operator::Not => {
                        panic!("operator {op} not lowered before code generation")
                    }
                };
                self.emit(text);
            }
            NodeKind::UnaryOp { op, ty, operand } => {
                self.emit_expression(operand);
                let ty = InstrType::from(ty);
                let text = match op {
                    Operator::Negate => instruction::neg(ty),
                    Operator::Not => instruction::not(ty),
                    other => panic!("unary operator {other} not lowered"),
                };
                self.emit(text);
            }
            NodeKind::Cast { to, from, operand } => {
                self.emit_expression(operand);
                if to != from {
                    let text = match to {
                        Type::Int => instruction::float_to_int(),
                        Type::Float => instruction::int_to_float(),
                        other => panic!("cast to {other} not lowered before code generation"),
                    };
                    self.emit(text);
                }
            }
            NodeKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                let n = self.next_label();
                let false_label = format!("{n}_false_expr");
                let end_label = format!("{n}_end");
                self.emit_expression(cond);
                self.emit(instruction::branch(false, &false_label));
                self.emit_expression(then_value);
                self.emit(instruction::jump(&end_label));
                self.emit_label(&false_label);
                self.emit_expression(else_value);
                self.emit_label(&end_label);
            }
            NodeKind::Call { .. } => self.emit_call(id, true),
            other => panic!("expression not lowered before code generation: {other:?}"),
        }
    }

    fn emit_identifier(
        &mut self,
        id: NodeId,
        name: &str,
        dec: Option<NodeId>,
        ty: Type,
        index: Option<NodeId>,
    ) {
        let dec = dec.unwrap_or_else(|| panic!("unresolved identifier '{name}'"));
        let ty = InstrType::from(ty);

        match self.ast.kind(dec).clone() {
            NodeKind::VarDec { var, .. } => {
                let slot = self.frames.locals[&dec];
                let levels = self.frames.site_frames[&id] - slot.frame;
                match index {
                    Some(ix) => {
                        self.emit_frame_load(InstrType::Array, levels, slot.index);
                        self.emit_indices(ix);
                        self.emit(instruction::read_array(ty));
                    }
                    None => {
                        let load_ty = if var.dims.is_empty() {
                            ty
                        } else {
                            InstrType::Array
                        };
                        self.emit_frame_load(load_ty, levels, slot.index);
                    }
                }
            }
            NodeKind::FunctionDef { header, .. } => {
                let slot = param_slot(&header.params, name);
                let levels = self.frames.site_frames[&id] - self.frames.function_frames[&dec];
                let param = &header.params[slot as usize];
                match index {
                    Some(ix) => {
                        self.emit_frame_load(InstrType::Array, levels, slot);
                        self.emit_indices(ix);
                        self.emit(instruction::read_array(ty));
                    }
                    None => {
                        let load_ty = if param.dims.is_empty() {
                            ty
                        } else {
                            InstrType::Array
                        };
                        self.emit_frame_load(load_ty, levels, slot);
                    }
                }
            }
            NodeKind::GlobalDef { var, .. } => {
                self.emit_global_load(dec, ty, !var.dims.is_empty(), index);
            }
            NodeKind::GlobalDec { param } => {
                self.emit_global_load(dec, ty, !param.dims.is_empty(), index);
            }
            other => panic!("identifier does not reference a variable: {other:?}"),
        }
    }

    fn emit_global_load(
        &mut self,
        dec: NodeId,
        ty: InstrType,
        is_array: bool,
        index: Option<NodeId>,
    ) {
        let gindex = self.frames.globals[&dec];
        match index {
            Some(ix) => {
                self.emit(instruction::load_global(InstrType::Array, gindex));
                self.emit_indices(ix);
                self.emit(instruction::read_array(ty));
            }
            None => {
                let load_ty = if is_array { InstrType::Array } else { ty };
                self.emit(instruction::load_global(load_ty, gindex));
            }
        }
    }

    fn emit_frame_load(&mut self, ty: InstrType, levels: i32, slot: i32) {
        if levels == 0 {
            self.emit(instruction::load_local(ty, slot));
        } else {
            self.emit(instruction::load_relative(ty, levels, slot));
        }
    }

    fn emit_indices(&mut self, index: NodeId) {
        let NodeKind::ArrayExpr { exprs } = self.ast.kind(index).clone() else {
            panic!("array access without an index list");
        };
        for e in exprs {
            self.emit_expression(e);
        }
    }

    // ── Output helpers ──────────────────────────────────────────────────

    fn next_label(&mut self) -> usize {
        let n = self.label_count;
        self.label_count += 1;
        n
    }

    fn emit(&mut self, text: impl AsRef<str>) {
        self.out.push('\t');
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn emit_label(&mut self, label: &str) {
        self.out.push_str(label);
        self.out.push_str(":\n");
    }
}

fn param_slot(params: &[crate::ast::Param], name: &str) -> i32 {
    params
        .iter()
        .position(|p| p.name == name)
        .unwrap_or_else(|| panic!("parameter '{name}' not found in the callee header")) as i32
}
