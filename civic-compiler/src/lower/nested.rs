//! Nested-function flattening.
//!
//! The target's label namespace is flat, so every function definition nested
//! inside another gets a globally unique `outer__inner` name (outer levels
//! first, so deeper nesting accumulates prefixes), and every call that
//! resolved to a renamed definition is rewritten to the mangled name.

use crate::ast::{Ast, NodeId, NodeKind};

pub fn flatten_nested_functions(ast: &mut Ast) {
    for decl in ast.root_decls() {
        if matches!(ast.kind(decl), NodeKind::FunctionDef { .. }) {
            mangle_children(ast, decl);
        }
    }
    rewrite_calls(ast, ast.root());
}

fn mangle_children(ast: &mut Ast, def: NodeId) {
    let (outer_name, body) = match ast.kind(def) {
        NodeKind::FunctionDef { header, body, .. } => (header.name.clone(), body.clone()),
        _ => return,
    };
    for item in body {
        let mangled = match ast.kind(item) {
            NodeKind::FunctionDef { header, .. } => {
                Some(format!("{outer_name}__{}", header.name))
            }
            _ => None,
        };
        if let Some(mangled) = mangled {
            if let NodeKind::FunctionDef { header, .. } = ast.kind_mut(item) {
                header.name = mangled;
            }
            mangle_children(ast, item);
        }
    }
}

fn rewrite_calls(ast: &mut Ast, id: NodeId) {
    if let NodeKind::Call { dec: Some(dec), .. } = ast.kind(id) {
        let dec = *dec;
        if let NodeKind::FunctionDef { header, .. } = ast.kind(dec) {
            let mangled = header.name.clone();
            if let NodeKind::Call { name, .. } = ast.kind_mut(id) {
                *name = mangled;
            }
        }
    }
    for child in ast.children(id) {
        rewrite_calls(ast, child);
    }
}
