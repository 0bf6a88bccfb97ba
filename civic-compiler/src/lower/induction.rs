//! For-loop induction separation.
//!
//! The loop counter, upper bound and step of every `for` loop become
//! immutable declarations with initializing assignments hoisted immediately
//! before the loop. Each loop instance gets fresh names, and uses of the
//! source counter inside the body are renamed accordingly, so sibling or
//! nested loops reusing the same counter name cannot collide.

use crate::ast::{Ast, NodeId, NodeKind, Type, Variable};

pub fn separate_for_induction(ast: &mut Ast) {
    let mut counter = 0usize;
    for decl in ast.root_decls() {
        if matches!(ast.kind(decl), NodeKind::FunctionDef { .. }) {
            separate_in_function(ast, decl, &mut counter);
        }
    }
}

fn separate_in_function(ast: &mut Ast, def: NodeId, counter: &mut usize) {
    let body = match ast.kind(def) {
        NodeKind::FunctionDef { body, .. } => body.clone(),
        _ => return,
    };
    let body = process_body(ast, body, counter);
    if let NodeKind::FunctionDef { body: b, .. } = ast.kind_mut(def) {
        *b = body;
    }
}

fn process_body(ast: &mut Ast, items: Vec<NodeId>, counter: &mut usize) -> Vec<NodeId> {
    let mut out = Vec::new();
    for item in items {
        match ast.kind(item).clone() {
            NodeKind::For {
                var,
                lower,
                upper,
                step,
                body,
            } => {
                let instance = *counter;
                *counter += 1;
                let counter_name = format!("__for{instance}_{var}");
                let upper_name = format!("__for{instance}_upper");
                let step_name = format!("__for{instance}_step");

                let counter_dec = make_induction_var(ast, item, &counter_name, lower, &mut out);
                let upper_dec = make_induction_var(ast, item, &upper_name, upper, &mut out);
                let step_dec = make_induction_var(ast, item, &step_name, step, &mut out);

                for &stmt in &body {
                    rename_uses(ast, stmt, &var, &counter_name);
                }
                let body = process_body(ast, body, counter);

                if let NodeKind::For {
                    lower: l,
                    upper: u,
                    step: s,
                    body: b,
                    ..
                } = ast.kind_mut(item)
                {
                    *l = counter_dec;
                    *u = upper_dec;
                    *s = step_dec;
                    *b = body;
                }
                out.push(item);
            }
            NodeKind::If {
                then_body,
                else_body,
                ..
            } => {
                let then_body = process_body(ast, then_body, counter);
                let else_body = process_body(ast, else_body, counter);
                if let NodeKind::If {
                    then_body: t,
                    else_body: e,
                    ..
                } = ast.kind_mut(item)
                {
                    *t = then_body;
                    *e = else_body;
                }
                out.push(item);
            }
            NodeKind::While { body, .. } => {
                let body = process_body(ast, body, counter);
                if let NodeKind::While { body: b, .. } = ast.kind_mut(item) {
                    *b = body;
                }
                out.push(item);
            }
            NodeKind::DoWhile { body, .. } => {
                let body = process_body(ast, body, counter);
                if let NodeKind::DoWhile { body: b, .. } = ast.kind_mut(item) {
                    *b = body;
                }
                out.push(item);
            }
            NodeKind::FunctionDef { .. } => {
                separate_in_function(ast, item, counter);
                out.push(item);
            }
            _ => out.push(item),
        }
    }
    out
}

/// Emits `VarDec` + initializing `Assignment` for one induction value and
/// returns the declaration's id. The declaration is immutable: the single
/// initializing assignment is allowed, any later one is rejected by the
/// analyzer.
fn make_induction_var(
    ast: &mut Ast,
    for_node: NodeId,
    name: &str,
    value: NodeId,
    out: &mut Vec<NodeId>,
) -> NodeId {
    let (line, col) = ast.pos(for_node);
    let dec = ast.add(
        NodeKind::VarDec {
            immutable: true,
            var: Variable {
                name: name.to_string(),
                ty: Type::Int,
                dims: Vec::new(),
            },
            init: None,
        },
        line,
        col,
    );
    let assign = ast.add(
        NodeKind::Assignment {
            name: name.to_string(),
            dec: None,
            ty: Type::None,
            index: None,
            value,
        },
        line,
        col,
    );
    out.push(dec);
    out.push(assign);
    dec
}

fn rename_uses(ast: &mut Ast, id: NodeId, old: &str, new: &str) {
    match ast.kind(id).clone() {
        NodeKind::Identifier { name, index, .. } => {
            if name == old {
                if let NodeKind::Identifier { name: n, .. } = ast.kind_mut(id) {
                    *n = new.to_string();
                }
            }
            if let Some(ix) = index {
                rename_uses(ast, ix, old, new);
            }
        }
        NodeKind::Assignment {
            name, index, value, ..
        } => {
            if name == old {
                if let NodeKind::Assignment { name: n, .. } = ast.kind_mut(id) {
                    *n = new.to_string();
                }
            }
            if let Some(ix) = index {
                rename_uses(ast, ix, old, new);
            }
            rename_uses(ast, value, old, new);
        }
        NodeKind::For {
            var,
            lower,
            upper,
            step,
            body,
        } => {
            // Bounds of an inner loop see the outer counter; its body does
            // not when the inner loop shadows the same source name.
            rename_uses(ast, lower, old, new);
            rename_uses(ast, upper, old, new);
            rename_uses(ast, step, old, new);
            if var != old {
                for stmt in body {
                    rename_uses(ast, stmt, old, new);
                }
            }
        }
        _ => {
            for child in ast.children(id) {
                rename_uses(ast, child, old, new);
            }
        }
    }
}
