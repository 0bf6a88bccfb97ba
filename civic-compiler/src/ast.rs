//! Arena-based abstract syntax tree for CiviC.
//!
//! Nodes live in a flat arena and refer to each other through [`NodeId`]
//! indices. Structural children are owned by their parent node; declaration
//! back-references (`dec` fields) are plain indices into the same arena and
//! never imply ownership, so rewriting passes can splice subtrees without
//! invalidating them.

use std::fmt;

/// Name of the synthesized module initializer that collects separated global
/// initializers. It is not a callable symbol.
pub const INIT_FUNCTION: &str = "__init";

/// Index of a node in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Value types of the language. `None` is the unresolved sentinel used
/// before semantic analysis; it never survives into code generation for a
/// well-formed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    None,
    Bool,
    Int,
    Float,
    Void,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::None => "none",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::Float => "float",
            Type::Void => "void",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    More,
    MoreEqual,
    And,
    Or,
    Negate,
    Not,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::More => ">",
            Operator::MoreEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Negate => "-",
            Operator::Not => "!",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl Literal {
    pub fn ty(self) -> Type {
        match self {
            Literal::Bool(_) => Type::Bool,
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One declared array dimension: either a symbolic name (`int v[n]`) or a
/// fixed extent (`int v[8]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayDim {
    Named(String),
    Fixed(i32),
}

/// A declared variable: name, element type and (possibly empty) dimensions.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub dims: Vec<ArrayDim>,
}

/// A formal parameter. Array parameters carry symbolic dimension names used
/// for per-dimension compatibility checks at call sites.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub dims: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionHeader {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Root {
        decls: Vec<NodeId>,
    },
    /// External function prototype (`extern`), reached through the import
    /// table rather than a label.
    FunctionDec {
        header: FunctionHeader,
    },
    FunctionDef {
        exported: bool,
        header: FunctionHeader,
        body: Vec<NodeId>,
    },
    /// External global declaration (`extern`), accessed through synthesized
    /// getter/setter imports after lowering.
    GlobalDec {
        param: Param,
    },
    GlobalDef {
        exported: bool,
        var: Variable,
        init: Option<NodeId>,
    },
    VarDec {
        immutable: bool,
        var: Variable,
        init: Option<NodeId>,
    },
    Assignment {
        name: String,
        dec: Option<NodeId>,
        ty: Type,
        index: Option<NodeId>,
        value: NodeId,
    },
    Return {
        function: String,
        ty: Type,
        value: Option<NodeId>,
    },
    Call {
        name: String,
        dec: Option<NodeId>,
        args: Vec<NodeId>,
    },
    BinaryOp {
        op: Operator,
        ty: Type,
        left: NodeId,
        right: NodeId,
    },
    UnaryOp {
        op: Operator,
        ty: Type,
        operand: NodeId,
    },
    Cast {
        to: Type,
        from: Type,
        operand: NodeId,
    },
    Literal {
        value: Literal,
    },
    Identifier {
        name: String,
        dec: Option<NodeId>,
        ty: Type,
        index: Option<NodeId>,
    },
    /// Bracketed expression list: array indices at a use site, or dimension
    /// extents of an allocation.
    ArrayExpr {
        exprs: Vec<NodeId>,
    },
    Ternary {
        cond: NodeId,
        then_value: NodeId,
        else_value: NodeId,
    },
    If {
        cond: NodeId,
        then_body: Vec<NodeId>,
        else_body: Vec<NodeId>,
    },
    While {
        cond: NodeId,
        body: Vec<NodeId>,
    },
    DoWhile {
        body: Vec<NodeId>,
        cond: NodeId,
    },
    /// Before induction separation `lower`/`upper`/`step` are expressions;
    /// afterwards they reference the synthesized induction declarations.
    For {
        var: String,
        lower: NodeId,
        upper: NodeId,
        step: NodeId,
        body: Vec<NodeId>,
    },
    AllocateArray {
        ty: Type,
        dec: NodeId,
        dims: NodeId,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Root { decls: Vec::new() },
            line: 0,
            col: 0,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn add(&mut self, kind: NodeKind, line: usize, col: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, line, col });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn pos(&self, id: NodeId) -> (usize, usize) {
        let node = &self.nodes[id.0];
        (node.line, node.col)
    }

    pub fn root_decls(&self) -> Vec<NodeId> {
        match self.kind(self.root) {
            NodeKind::Root { decls } => decls.clone(),
            _ => Vec::new(),
        }
    }

    pub fn push_root_decl(&mut self, id: NodeId) {
        if let NodeKind::Root { decls } = self.kind_mut(self.root) {
            decls.push(id);
        }
    }

    /// Structural children of a node in evaluation order. Declaration
    /// back-references are not children; neither are a `For` node's bounds,
    /// which reference sibling declarations once induction separation ran.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Root { decls } => decls.clone(),
            NodeKind::FunctionDec { .. } | NodeKind::GlobalDec { .. } => Vec::new(),
            NodeKind::FunctionDef { body, .. } => body.clone(),
            NodeKind::GlobalDef { init, .. } | NodeKind::VarDec { init, .. } => {
                init.iter().copied().collect()
            }
            NodeKind::Assignment { index, value, .. } => {
                index.iter().copied().chain([*value]).collect()
            }
            NodeKind::Return { value, .. } => value.iter().copied().collect(),
            NodeKind::Call { args, .. } => args.clone(),
            NodeKind::BinaryOp { left, right, .. } => vec![*left, *right],
            NodeKind::UnaryOp { operand, .. } | NodeKind::Cast { operand, .. } => vec![*operand],
            NodeKind::Literal { .. } => Vec::new(),
            NodeKind::Identifier { index, .. } => index.iter().copied().collect(),
            NodeKind::ArrayExpr { exprs } => exprs.clone(),
            NodeKind::Ternary {
                cond,
                then_value,
                else_value,
            } => vec![*cond, *then_value, *else_value],
            NodeKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let mut out = vec![*cond];
                out.extend(then_body);
                out.extend(else_body);
                out
            }
            NodeKind::While { cond, body } => {
                let mut out = vec![*cond];
                out.extend(body);
                out
            }
            NodeKind::DoWhile { body, cond } => {
                let mut out = body.clone();
                out.push(*cond);
                out
            }
            NodeKind::For { body, .. } => body.clone(),
            NodeKind::AllocateArray { dims, .. } => vec![*dims],
        }
    }

    /// Deep-copies an expression subtree, allocating fresh nodes for all
    /// structural children. Declaration back-references are copied verbatim:
    /// they point at declarations outside the copied subtree.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let Node { kind, line, col } = self.node(id).clone();
        let kind = match kind {
            NodeKind::Literal { value } => NodeKind::Literal { value },
            NodeKind::Identifier {
                name,
                dec,
                ty,
                index,
            } => {
                let index = index.map(|ix| self.clone_subtree(ix));
                NodeKind::Identifier {
                    name,
                    dec,
                    ty,
                    index,
                }
            }
            NodeKind::ArrayExpr { exprs } => {
                let exprs = exprs.into_iter().map(|e| self.clone_subtree(e)).collect();
                NodeKind::ArrayExpr { exprs }
            }
            NodeKind::BinaryOp {
                op,
                ty,
                left,
                right,
            } => {
                let left = self.clone_subtree(left);
                let right = self.clone_subtree(right);
                NodeKind::BinaryOp {
                    op,
                    ty,
                    left,
                    right,
                }
            }
            NodeKind::UnaryOp { op, ty, operand } => {
                let operand = self.clone_subtree(operand);
                NodeKind::UnaryOp { op, ty, operand }
            }
            NodeKind::Cast { to, from, operand } => {
                let operand = self.clone_subtree(operand);
                NodeKind::Cast { to, from, operand }
            }
            NodeKind::Call { name, dec, args } => {
                let args = args.into_iter().map(|a| self.clone_subtree(a)).collect();
                NodeKind::Call { name, dec, args }
            }
            NodeKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                let cond = self.clone_subtree(cond);
                let then_value = self.clone_subtree(then_value);
                let else_value = self.clone_subtree(else_value);
                NodeKind::Ternary {
                    cond,
                    then_value,
                    else_value,
                }
            }
            other => unreachable!("only expression subtrees are cloned, got {other:?}"),
        };
        self.add(kind, line, col)
    }

    /// Indented textual form of the tree, used by the verbose driver mode.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        use std::fmt::Write as _;

        let pad = "  ".repeat(depth);
        match self.kind(id) {
            NodeKind::Root { decls } => {
                let _ = writeln!(out, "{pad}Root");
                for d in decls {
                    self.dump_node(*d, depth + 1, out);
                }
            }
            NodeKind::FunctionDec { header } => {
                let _ = writeln!(
                    out,
                    "{pad}FunctionDec {} {}({})",
                    header.return_type,
                    header.name,
                    params_text(&header.params)
                );
            }
            NodeKind::FunctionDef {
                exported,
                header,
                body,
            } => {
                let exp = if *exported { " export" } else { "" };
                let _ = writeln!(
                    out,
                    "{pad}FunctionDef{exp} {} {}({})",
                    header.return_type,
                    header.name,
                    params_text(&header.params)
                );
                for s in body {
                    self.dump_node(*s, depth + 1, out);
                }
            }
            NodeKind::GlobalDec { param } => {
                let _ = writeln!(out, "{pad}GlobalDec {} {}", param.ty, param.name);
            }
            NodeKind::GlobalDef {
                exported,
                var,
                init,
            } => {
                let exp = if *exported { " export" } else { "" };
                let _ = writeln!(out, "{pad}GlobalDef{exp} {} {}", var.ty, var.name);
                if let Some(init) = init {
                    self.dump_node(*init, depth + 1, out);
                }
            }
            NodeKind::VarDec {
                immutable,
                var,
                init,
            } => {
                let imm = if *immutable { " immutable" } else { "" };
                let _ = writeln!(out, "{pad}VarDec{imm} {} {}", var.ty, var.name);
                if let Some(init) = init {
                    self.dump_node(*init, depth + 1, out);
                }
            }
            NodeKind::Assignment {
                name, index, value, ..
            } => {
                let _ = writeln!(out, "{pad}Assignment {name}");
                if let Some(ix) = index {
                    self.dump_node(*ix, depth + 1, out);
                }
                self.dump_node(*value, depth + 1, out);
            }
            NodeKind::Return { value, .. } => {
                let _ = writeln!(out, "{pad}Return");
                if let Some(v) = value {
                    self.dump_node(*v, depth + 1, out);
                }
            }
            NodeKind::Call { name, args, .. } => {
                let _ = writeln!(out, "{pad}Call {name}");
                for a in args {
                    self.dump_node(*a, depth + 1, out);
                }
            }
            NodeKind::BinaryOp {
                op, ty, left, right,
            } => {
                let _ = writeln!(out, "{pad}BinaryOp {op} {ty}");
                self.dump_node(*left, depth + 1, out);
                self.dump_node(*right, depth + 1, out);
            }
            NodeKind::UnaryOp { op, ty, operand } => {
                let _ = writeln!(out, "{pad}UnaryOp {op} {ty}");
                self.dump_node(*operand, depth + 1, out);
            }
            NodeKind::Cast { to, operand, .. } => {
                let _ = writeln!(out, "{pad}Cast {to}");
                self.dump_node(*operand, depth + 1, out);
            }
            NodeKind::Literal { value } => {
                let _ = writeln!(out, "{pad}Literal {} {}", value.ty(), value);
            }
            NodeKind::Identifier { name, index, .. } => {
                let _ = writeln!(out, "{pad}Identifier {name}");
                if let Some(ix) = index {
                    self.dump_node(*ix, depth + 1, out);
                }
            }
            NodeKind::ArrayExpr { exprs } => {
                let _ = writeln!(out, "{pad}ArrayExpr");
                for e in exprs {
                    self.dump_node(*e, depth + 1, out);
                }
            }
            NodeKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                let _ = writeln!(out, "{pad}Ternary");
                self.dump_node(*cond, depth + 1, out);
                self.dump_node(*then_value, depth + 1, out);
                self.dump_node(*else_value, depth + 1, out);
            }
            NodeKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let _ = writeln!(out, "{pad}If");
                self.dump_node(*cond, depth + 1, out);
                for s in then_body {
                    self.dump_node(*s, depth + 1, out);
                }
                if !else_body.is_empty() {
                    let _ = writeln!(out, "{pad}Else");
                    for s in else_body {
                        self.dump_node(*s, depth + 1, out);
                    }
                }
            }
            NodeKind::While { cond, body } => {
                let _ = writeln!(out, "{pad}While");
                self.dump_node(*cond, depth + 1, out);
                for s in body {
                    self.dump_node(*s, depth + 1, out);
                }
            }
            NodeKind::DoWhile { body, cond } => {
                let _ = writeln!(out, "{pad}DoWhile");
                for s in body {
                    self.dump_node(*s, depth + 1, out);
                }
                self.dump_node(*cond, depth + 1, out);
            }
            NodeKind::For {
                var,
                lower,
                upper,
                step,
                body,
            } => {
                let _ = writeln!(out, "{pad}For {var}");
                self.dump_node(*lower, depth + 1, out);
                self.dump_node(*upper, depth + 1, out);
                self.dump_node(*step, depth + 1, out);
                for s in body {
                    self.dump_node(*s, depth + 1, out);
                }
            }
            NodeKind::AllocateArray { ty, dims, .. } => {
                let _ = writeln!(out, "{pad}AllocateArray {ty}");
                self.dump_node(*dims, depth + 1, out);
            }
        }
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

fn params_text(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect::<Vec<_>>()
        .join(", ")
}
