//! Global accessor synthesis.
//!
//! Cross-module globals cannot be addressed by static slot index, only by
//! call. Every exported global gets an exported `_get_<name>`/`_set_<name>`
//! function pair; every extern global declaration gets matching imported
//! getter/setter prototypes, and direct reads/writes of extern globals are
//! rewritten into calls to them. A module's own exported globals keep their
//! direct slot access; the accessors exist for other compilation units.

use crate::ast::{Ast, FunctionHeader, NodeId, NodeKind, Param, Type};
use std::collections::HashMap;

pub fn synthesize_global_accessors(ast: &mut Ast) {
    let decls = ast.root_decls();
    let mut accessors: HashMap<NodeId, (NodeId, NodeId)> = HashMap::new();

    for decl in decls {
        match ast.kind(decl).clone() {
            NodeKind::GlobalDef {
                exported: true,
                var,
                ..
            } => {
                let (line, col) = ast.pos(decl);

                let get_name = format!("_get_{}", var.name);
                let value = ast.add(
                    NodeKind::Identifier {
                        name: var.name.clone(),
                        dec: Some(decl),
                        ty: var.ty,
                        index: None,
                    },
                    line,
                    col,
                );
                let ret = ast.add(
                    NodeKind::Return {
                        function: get_name.clone(),
                        ty: var.ty,
                        value: Some(value),
                    },
                    line,
                    col,
                );
                let getter = ast.add(
                    NodeKind::FunctionDef {
                        exported: true,
                        header: FunctionHeader {
                            name: get_name,
                            return_type: var.ty,
                            params: Vec::new(),
                        },
                        body: vec![ret],
                    },
                    line,
                    col,
                );
                ast.push_root_decl(getter);

                let set_name = format!("_set_{}", var.name);
                let setter = ast.add(
                    NodeKind::FunctionDef {
                        exported: true,
                        header: FunctionHeader {
                            name: set_name,
                            return_type: Type::Void,
                            params: vec![Param {
                                name: "v".to_string(),
                                ty: var.ty,
                                dims: Vec::new(),
                            }],
                        },
                        body: Vec::new(),
                    },
                    line,
                    col,
                );
                let param_use = ast.add(
                    NodeKind::Identifier {
                        name: "v".to_string(),
                        dec: Some(setter),
                        ty: var.ty,
                        index: None,
                    },
                    line,
                    col,
                );
                let assign = ast.add(
                    NodeKind::Assignment {
                        name: var.name.clone(),
                        dec: Some(decl),
                        ty: var.ty,
                        index: None,
                        value: param_use,
                    },
                    line,
                    col,
                );
                if let NodeKind::FunctionDef { body, .. } = ast.kind_mut(setter) {
                    body.push(assign);
                }
                ast.push_root_decl(setter);
            }
            NodeKind::GlobalDec { param } => {
                let (line, col) = ast.pos(decl);
                let getter = ast.add(
                    NodeKind::FunctionDec {
                        header: FunctionHeader {
                            name: format!("_get_{}", param.name),
                            return_type: param.ty,
                            params: Vec::new(),
                        },
                    },
                    line,
                    col,
                );
                let setter = ast.add(
                    NodeKind::FunctionDec {
                        header: FunctionHeader {
                            name: format!("_set_{}", param.name),
                            return_type: Type::Void,
                            params: vec![Param {
                                name: "v".to_string(),
                                ty: param.ty,
                                dims: Vec::new(),
                            }],
                        },
                    },
                    line,
                    col,
                );
                ast.push_root_decl(getter);
                ast.push_root_decl(setter);
                accessors.insert(decl, (getter, setter));
            }
            _ => {}
        }
    }

    let root = ast.root();
    rewrite_extern_access(ast, root, &accessors);
}

fn rewrite_extern_access(
    ast: &mut Ast,
    id: NodeId,
    accessors: &HashMap<NodeId, (NodeId, NodeId)>,
) {
    for child in ast.children(id) {
        rewrite_extern_access(ast, child, accessors);
    }

    match ast.kind(id).clone() {
        NodeKind::Assignment {
            dec: Some(dec),
            index: None,
            value,
            ..
        } => {
            if let Some(&(_, setter)) = accessors.get(&dec) {
                let name = header_name(ast, setter);
                *ast.kind_mut(id) = NodeKind::Call {
                    name,
                    dec: Some(setter),
                    args: vec![value],
                };
            }
        }
        NodeKind::Identifier {
            dec: Some(dec),
            index: None,
            ..
        } => {
            if let Some(&(getter, _)) = accessors.get(&dec) {
                let name = header_name(ast, getter);
                *ast.kind_mut(id) = NodeKind::Call {
                    name,
                    dec: Some(getter),
                    args: Vec::new(),
                };
            }
        }
        _ => {}
    }
}

fn header_name(ast: &Ast, dec: NodeId) -> String {
    match ast.kind(dec) {
        NodeKind::FunctionDec { header } => header.name.clone(),
        NodeKind::FunctionDef { header, .. } => header.name.clone(),
        other => unreachable!("accessor reference is not a function: {other:?}"),
    }
}
