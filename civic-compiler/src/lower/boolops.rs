//! Boolean-operator rewrite.
//!
//! The target instruction set has no short-circuit boolean opcodes, so
//! `a && b` becomes `a ? b : false` and `a || b` becomes `a ? true : b`.
//! Bool-typed `*`/`+` (the eager forms of AND/OR) become nested ternaries
//! that still evaluate both operands. Casts between `bool` and the numeric
//! types are rewritten into comparisons against zero or a `1`/`0` ternary,
//! since the machine only converts between `int` and `float`.

use crate::ast::{Ast, Literal, NodeId, NodeKind, Operator, Type};

pub fn rewrite_boolean_operators(ast: &mut Ast) {
    rewrite(ast, ast.root());
}

fn rewrite(ast: &mut Ast, id: NodeId) {
    // Children first: operands of a rewritten operator must already be in
    // their lowered form when they are moved into the new ternary.
    for child in ast.children(id) {
        rewrite(ast, child);
    }

    match ast.kind(id).clone() {
        NodeKind::BinaryOp {
            op,
            ty,
            left,
            right,
        } => {
            let (line, col) = ast.pos(id);
            match op {
                Operator::And => {
                    let lit_false = bool_literal(ast, false, line, col);
                    *ast.kind_mut(id) = NodeKind::Ternary {
                        cond: left,
                        then_value: right,
                        else_value: lit_false,
                    };
                }
                Operator::Or => {
                    let lit_true = bool_literal(ast, true, line, col);
                    *ast.kind_mut(id) = NodeKind::Ternary {
                        cond: left,
                        then_value: lit_true,
                        else_value: right,
                    };
                }
                Operator::Multiply if ty == Type::Bool => {
                    // a * b  →  a ? b : (b ? false : false)
                    let right_again = ast.clone_subtree(right);
                    let f1 = bool_literal(ast, false, line, col);
                    let f2 = bool_literal(ast, false, line, col);
                    let inner = ast.add(
                        NodeKind::Ternary {
                            cond: right_again,
                            then_value: f1,
                            else_value: f2,
                        },
                        line,
                        col,
                    );
                    *ast.kind_mut(id) = NodeKind::Ternary {
                        cond: left,
                        then_value: right,
                        else_value: inner,
                    };
                }
                Operator::Add if ty == Type::Bool => {
                    // a + b  →  a ? (b ? true : true) : b
                    let right_again = ast.clone_subtree(right);
                    let t1 = bool_literal(ast, true, line, col);
                    let t2 = bool_literal(ast, true, line, col);
                    let inner = ast.add(
                        NodeKind::Ternary {
                            cond: right_again,
                            then_value: t1,
                            else_value: t2,
                        },
                        line,
                        col,
                    );
                    *ast.kind_mut(id) = NodeKind::Ternary {
                        cond: left,
                        then_value: inner,
                        else_value: right,
                    };
                }
                _ => {}
            }
        }
        NodeKind::Cast { to, from, operand } => {
            let (line, col) = ast.pos(id);
            if to == Type::Bool && matches!(from, Type::Int | Type::Float) {
                // (bool) x  →  x != 0
                let zero = numeric_literal(ast, from, 0, line, col);
                *ast.kind_mut(id) = NodeKind::BinaryOp {
                    op: Operator::NotEqual,
                    ty: from,
                    left: operand,
                    right: zero,
                };
            } else if matches!(to, Type::Int | Type::Float) && from == Type::Bool {
                // (int) b  →  b ? 1 : 0
                let one = numeric_literal(ast, to, 1, line, col);
                let zero = numeric_literal(ast, to, 0, line, col);
                *ast.kind_mut(id) = NodeKind::Ternary {
                    cond: operand,
                    then_value: one,
                    else_value: zero,
                };
            }
        }
        _ => {}
    }
}

fn bool_literal(ast: &mut Ast, value: bool, line: usize, col: usize) -> NodeId {
    ast.add(
        NodeKind::Literal {
            value: Literal::Bool(value),
        },
        line,
        col,
    )
}

fn numeric_literal(ast: &mut Ast, ty: Type, value: i32, line: usize, col: usize) -> NodeId {
    let value = match ty {
        Type::Float => Literal::Float(value as f32),
        _ => Literal::Int(value),
    };
    ast.add(NodeKind::Literal { value }, line, col)
}
