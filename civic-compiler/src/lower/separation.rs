//! Declaration/initializer separation.
//!
//! Splits every declaration that carries an inline initializer into a bare
//! declaration followed by a separate assignment, and synthesizes array
//! allocations for declarations with dimensions. Separated global
//! initializers are collected, in source order, into a `__init` function
//! appended to the program; the analyzer's declaration-order rule protects
//! its body.

use crate::ast::{
    ArrayDim, Ast, FunctionHeader, Literal, NodeId, NodeKind, Type, Variable, INIT_FUNCTION,
};

pub fn separate_initializers(ast: &mut Ast) {
    let decls = ast.root_decls();
    let mut init_body = Vec::new();

    for decl in decls {
        match ast.kind(decl).clone() {
            NodeKind::GlobalDef { var, init, .. } => {
                if !var.dims.is_empty() {
                    init_body.push(make_allocation(ast, decl, &var));
                }
                if let Some(value) = init {
                    init_body.push(make_assignment(ast, decl, &var.name, value));
                    if let NodeKind::GlobalDef { init, .. } = ast.kind_mut(decl) {
                        *init = None;
                    }
                }
            }
            NodeKind::FunctionDef { .. } => separate_in_function(ast, decl),
            _ => {}
        }
    }

    if !init_body.is_empty() {
        let header = FunctionHeader {
            name: INIT_FUNCTION.to_string(),
            return_type: Type::Void,
            params: Vec::new(),
        };
        let def = ast.add(
            NodeKind::FunctionDef {
                exported: false,
                header,
                body: init_body,
            },
            0,
            0,
        );
        ast.push_root_decl(def);
    }
}

fn separate_in_function(ast: &mut Ast, def: NodeId) {
    let body = match ast.kind(def) {
        NodeKind::FunctionDef { body, .. } => body.clone(),
        _ => return,
    };
    let body = separate_in_body(ast, body);
    if let NodeKind::FunctionDef { body: b, .. } = ast.kind_mut(def) {
        *b = body;
    }
}

fn separate_in_body(ast: &mut Ast, items: Vec<NodeId>) -> Vec<NodeId> {
    let mut out = Vec::new();
    for item in items {
        match ast.kind(item).clone() {
            NodeKind::VarDec { var, init, .. } => {
                out.push(item);
                if !var.dims.is_empty() {
                    out.push(make_allocation(ast, item, &var));
                }
                if let Some(value) = init {
                    out.push(make_assignment(ast, item, &var.name, value));
                    if let NodeKind::VarDec { init, .. } = ast.kind_mut(item) {
                        *init = None;
                    }
                }
            }
            NodeKind::FunctionDef { .. } => {
                separate_in_function(ast, item);
                out.push(item);
            }
            NodeKind::If {
                then_body,
                else_body,
                ..
            } => {
                let then_body = separate_in_body(ast, then_body);
                let else_body = separate_in_body(ast, else_body);
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
                let body = separate_in_body(ast, body);
                if let NodeKind::While { body: b, .. } = ast.kind_mut(item) {
                    *b = body;
                }
                out.push(item);
            }
            NodeKind::DoWhile { body, .. } => {
                let body = separate_in_body(ast, body);
                if let NodeKind::DoWhile { body: b, .. } = ast.kind_mut(item) {
                    *b = body;
                }
                out.push(item);
            }
            NodeKind::For { body, .. } => {
                let body = separate_in_body(ast, body);
                if let NodeKind::For { body: b, .. } = ast.kind_mut(item) {
                    *b = body;
                }
                out.push(item);
            }
            _ => out.push(item),
        }
    }
    out
}

fn make_assignment(ast: &mut Ast, dec: NodeId, name: &str, value: NodeId) -> NodeId {
    let (line, col) = ast.pos(dec);
    ast.add(
        NodeKind::Assignment {
            name: name.to_string(),
            dec: None,
            ty: Type::None,
            index: None,
            value,
        },
        line,
        col,
    )
}

fn make_allocation(ast: &mut Ast, dec: NodeId, var: &Variable) -> NodeId {
    let (line, col) = ast.pos(dec);
    let mut exprs = Vec::new();
    for dim in &var.dims {
        let expr = match dim {
            ArrayDim::Fixed(n) => ast.add(
                NodeKind::Literal {
                    value: Literal::Int(*n),
                },
                line,
                col,
            ),
            ArrayDim::Named(name) => ast.add(
                NodeKind::Identifier {
                    name: name.clone(),
                    dec: None,
                    ty: Type::None,
                    index: None,
                },
                line,
                col,
            ),
        };
        exprs.push(expr);
    }
    let dims = ast.add(NodeKind::ArrayExpr { exprs }, line, col);
    ast.add(
        NodeKind::AllocateArray {
            ty: var.ty,
            dec,
            dims,
        },
        line,
        col,
    )
}
