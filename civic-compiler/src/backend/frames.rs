//! Static frame and slot resolution.
//!
//! One walk over the lowered tree builds the address book the instruction
//! emitter consults: every function's lexical frame, every local's
//! `(frame, slot)` pair, the frame of every identifier/assignment use site,
//! the frame every call executes in, flat global indices, and the import
//! table. The maps live for one `generate` invocation and are discarded
//! afterwards.

use crate::ast::{Ast, NodeId, NodeKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub frame: i32,
    pub index: i32,
}

#[derive(Debug, Default)]
pub struct Frames {
    /// FunctionDef → lexical nesting depth (top level = 0).
    pub function_frames: HashMap<NodeId, i32>,
    /// FunctionDef → enclosing FunctionDef, for recursion detection.
    pub function_parent: HashMap<NodeId, Option<NodeId>>,
    /// VarDec → (frame, slot); slots start after the parameters.
    pub locals: HashMap<NodeId, Slot>,
    /// Identifier/Assignment → frame of the function whose body contains it.
    pub site_frames: HashMap<NodeId, i32>,
    /// Call → frame the call executes in (enclosing function's frame + 1).
    pub call_frames: HashMap<NodeId, i32>,
    /// GlobalDef → flat slot index, in first-encountered order.
    pub globals: HashMap<NodeId, usize>,
    /// FunctionDec → import table index.
    pub imports: HashMap<NodeId, usize>,
    /// `.import` directives, in table order.
    pub import_lines: Vec<String>,
}

impl Frames {
    /// Whether `inner` is (or is nested inside) `outer`.
    pub fn is_within(&self, inner: NodeId, outer: NodeId) -> bool {
        let mut current = Some(inner);
        while let Some(def) = current {
            if def == outer {
                return true;
            }
            current = self.function_parent.get(&def).copied().flatten();
        }
        false
    }
}

pub fn resolve(ast: &Ast) -> Frames {
    let mut frames = Frames::default();
    for decl in ast.root_decls() {
        match ast.kind(decl) {
            // Extern globals get no slot: after lowering they are reached
            // exclusively through their accessor imports.
            NodeKind::GlobalDef { .. } => {
                let index = frames.globals.len();
                frames.globals.insert(decl, index);
            }
            NodeKind::FunctionDec { header } => {
                let mut line = format!(".import \"{}\" {}", header.name, header.return_type);
                for param in &header.params {
                    line.push_str(&format!(" {}", param.ty));
                }
                frames.imports.insert(decl, frames.import_lines.len());
                frames.import_lines.push(line);
            }
            NodeKind::FunctionDef { .. } => {
                visit_function(ast, &mut frames, decl, 0, None);
            }
            _ => {}
        }
    }
    frames
}

fn visit_function(
    ast: &Ast,
    frames: &mut Frames,
    def: NodeId,
    frame: i32,
    parent: Option<NodeId>,
) {
    frames.function_frames.insert(def, frame);
    frames.function_parent.insert(def, parent);

    let (params, body) = match ast.kind(def) {
        NodeKind::FunctionDef { header, body, .. } => (header.params.len(), body.clone()),
        _ => return,
    };
    let mut slot = params as i32;
    for item in body {
        visit_item(ast, frames, item, def, frame, &mut slot);
    }
}

fn visit_item(
    ast: &Ast,
    frames: &mut Frames,
    id: NodeId,
    def: NodeId,
    frame: i32,
    slot: &mut i32,
) {
    match ast.kind(id) {
        NodeKind::VarDec { .. } => {
            frames.locals.insert(
                id,
                Slot {
                    frame,
                    index: *slot,
                },
            );
            *slot += 1;
        }
        NodeKind::FunctionDef { .. } => {
            visit_function(ast, frames, id, frame + 1, Some(def));
        }
        NodeKind::Assignment { .. } | NodeKind::Identifier { .. } => {
            frames.site_frames.insert(id, frame);
            for child in ast.children(id) {
                visit_item(ast, frames, child, def, frame, slot);
            }
        }
        NodeKind::Call { .. } => {
            frames.call_frames.insert(id, frame + 1);
            for child in ast.children(id) {
                visit_item(ast, frames, child, def, frame, slot);
            }
        }
        _ => {
            for child in ast.children(id) {
                visit_item(ast, frames, child, def, frame, slot);
            }
        }
    }
}
