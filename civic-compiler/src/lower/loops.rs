//! Loop canonicalization.
//!
//! `for` loops (already induction-separated) become `while` loops over
//! `(step > 0 ? counter < upper : counter > upper)` with a trailing
//! counter increment. Every remaining `while` then becomes
//! `if (cond) { do { body } while (cond); }`, because the machine only has a
//! trailing branch-on-true loop primitive, not a pre-test loop.

use crate::ast::{Ast, Literal, NodeId, NodeKind, Operator, Type};

pub fn canonicalize_loops(ast: &mut Ast) {
    let root = ast.root();
    rewrite_fors(ast, root);
    rewrite_whiles(ast, root);
}

fn rewrite_fors(ast: &mut Ast, id: NodeId) {
    for child in ast.children(id) {
        rewrite_fors(ast, child);
    }

    let NodeKind::For {
        lower,
        upper,
        step,
        body,
        ..
    } = ast.kind(id).clone()
    else {
        return;
    };
    let (line, col) = ast.pos(id);

    // (step > 0) ? (counter < upper) : (counter > upper)
    let step_use = induction_use(ast, step, line, col);
    let zero = ast.add(
        NodeKind::Literal {
            value: Literal::Int(0),
        },
        line,
        col,
    );
    let step_positive = ast.add(
        NodeKind::BinaryOp {
            op: Operator::More,
            ty: Type::Int,
            left: step_use,
            right: zero,
        },
        line,
        col,
    );
    let counter_use = induction_use(ast, lower, line, col);
    let upper_use = induction_use(ast, upper, line, col);
    let ascending = ast.add(
        NodeKind::BinaryOp {
            op: Operator::Less,
            ty: Type::Int,
            left: counter_use,
            right: upper_use,
        },
        line,
        col,
    );
    let counter_use = induction_use(ast, lower, line, col);
    let upper_use = induction_use(ast, upper, line, col);
    let descending = ast.add(
        NodeKind::BinaryOp {
            op: Operator::More,
            ty: Type::Int,
            left: counter_use,
            right: upper_use,
        },
        line,
        col,
    );
    let cond = ast.add(
        NodeKind::Ternary {
            cond: step_positive,
            then_value: ascending,
            else_value: descending,
        },
        line,
        col,
    );

    // counter = counter + step
    let counter_use = induction_use(ast, lower, line, col);
    let step_use = induction_use(ast, step, line, col);
    let increment_value = ast.add(
        NodeKind::BinaryOp {
            op: Operator::Add,
            ty: Type::Int,
            left: counter_use,
            right: step_use,
        },
        line,
        col,
    );
    let counter_name = induction_name(ast, lower);
    let increment = ast.add(
        NodeKind::Assignment {
            name: counter_name,
            dec: Some(lower),
            ty: Type::Int,
            index: None,
            value: increment_value,
        },
        line,
        col,
    );

    let mut new_body = body;
    new_body.push(increment);
    *ast.kind_mut(id) = NodeKind::While {
        cond,
        body: new_body,
    };
}

fn rewrite_whiles(ast: &mut Ast, id: NodeId) {
    for child in ast.children(id) {
        rewrite_whiles(ast, child);
    }

    let NodeKind::While { cond, body } = ast.kind(id).clone() else {
        return;
    };
    let (line, col) = ast.pos(id);

    // The loop's trailing condition is a fresh copy: the if-header and the
    // do-while each own their subtree.
    let trailing_cond = ast.clone_subtree(cond);
    let do_while = ast.add(
        NodeKind::DoWhile {
            body,
            cond: trailing_cond,
        },
        line,
        col,
    );
    *ast.kind_mut(id) = NodeKind::If {
        cond,
        then_body: vec![do_while],
        else_body: Vec::new(),
    };
}

fn induction_name(ast: &Ast, dec: NodeId) -> String {
    match ast.kind(dec) {
        NodeKind::VarDec { var, .. } => var.name.clone(),
        other => unreachable!("for-loop bound does not reference a declaration: {other:?}"),
    }
}

fn induction_use(ast: &mut Ast, dec: NodeId, line: usize, col: usize) -> NodeId {
    let name = induction_name(ast, dec);
    ast.add(
        NodeKind::Identifier {
            name,
            dec: Some(dec),
            ty: Type::Int,
            index: None,
        },
        line,
        col,
    )
}
