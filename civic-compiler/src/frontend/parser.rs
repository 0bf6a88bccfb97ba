//! Recursive-descent parser with precedence climbing for expressions.
//!
//! Produces the arena AST consumed by the analyzer. Any grammar violation is
//! fatal and carries the offending token's position; the parser never
//! recovers.

use crate::ast::{
    ArrayDim, Ast, FunctionHeader, Literal, NodeId, NodeKind, Operator, Param, Type, Variable,
};
use crate::frontend::lexer::{SpannedToken, Token};
use crate::CompileError;

pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    ast: Ast,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
        }
    }

    pub fn program(mut self) -> Result<Ast, CompileError> {
        while self.pos < self.tokens.len() {
            let decl = self.declaration()?;
            self.ast.push_root_decl(decl);
        }
        Ok(self.ast)
    }

    // ── Declarations ────────────────────────────────────────────────────

    fn declaration(&mut self) -> Result<NodeId, CompileError> {
        if self.check(&Token::Extern) {
            let (line, col) = self.here();
            self.bump();
            let ty = self.return_type()?;
            let (name, ..) = self.ident("a name after the extern type")?;
            if self.check(&Token::LParen) {
                let header = self.function_header(ty, name)?;
                self.expect(Token::Semicolon, "';' after the extern declaration")?;
                return Ok(self.ast.add(NodeKind::FunctionDec { header }, line, col));
            }
            if ty == Type::Void {
                return Err(self.error_at(line, col, "extern globals cannot be void".into()));
            }
            let dims = self.named_dims()?;
            self.expect(Token::Semicolon, "';' after the extern declaration")?;
            let param = Param { name, ty, dims };
            return Ok(self.ast.add(NodeKind::GlobalDec { param }, line, col));
        }

        let exported = self.eat(&Token::Export);
        let (line, col) = self.here();
        let ty = self.return_type()?;
        let (name, ..) = self.ident("a name after the type")?;
        if self.check(&Token::LParen) {
            return self.function_def(exported, ty, name, line, col);
        }
        if ty == Type::Void {
            return Err(self.error_at(line, col, "globals cannot be void".into()));
        }
        let dims = self.array_dims()?;
        let init = if self.eat(&Token::Assign) {
            Some(self.expr()?)
        } else {
            None
        };
        self.expect(Token::Semicolon, "';' after the global definition")?;
        let var = Variable { name, ty, dims };
        Ok(self.ast.add(
            NodeKind::GlobalDef {
                exported,
                var,
                init,
            },
            line,
            col,
        ))
    }

    fn function_header(&mut self, return_type: Type, name: String) -> Result<FunctionHeader, CompileError> {
        self.expect(Token::LParen, "'(' before the parameter list")?;
        let params = self.params()?;
        self.expect(Token::RParen, "')' after the parameter list")?;
        Ok(FunctionHeader {
            name,
            return_type,
            params,
        })
    }

    fn function_def(
        &mut self,
        exported: bool,
        return_type: Type,
        name: String,
        line: usize,
        col: usize,
    ) -> Result<NodeId, CompileError> {
        let header = self.function_header(return_type, name)?;
        self.expect(Token::LBrace, "'{' before the function body")?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.pos >= self.tokens.len() {
                return Err(self.error("unexpected end of input inside a function body".into()));
            }
            body.push(self.body_item()?);
        }
        self.bump();
        Ok(self.ast.add(
            NodeKind::FunctionDef {
                exported,
                header,
                body,
            },
            line,
            col,
        ))
    }

    fn params(&mut self) -> Result<Vec<Param>, CompileError> {
        let mut params = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(params);
        }
        loop {
            let ty = self.value_type()?;
            let (name, ..) = self.ident("a parameter name")?;
            let dims = self.named_dims()?;
            params.push(Param { name, ty, dims });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(params)
    }

    /// `[ n, m ]` — symbolic dimension names of a parameter or extern global.
    fn named_dims(&mut self) -> Result<Vec<String>, CompileError> {
        let mut dims = Vec::new();
        if !self.eat(&Token::LBracket) {
            return Ok(dims);
        }
        loop {
            let (name, ..) = self.ident("an array dimension name")?;
            dims.push(name);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBracket, "']' after the array dimensions")?;
        Ok(dims)
    }

    /// `[ 8, n ]` — dimensions of a variable declaration.
    fn array_dims(&mut self) -> Result<Vec<ArrayDim>, CompileError> {
        let mut dims = Vec::new();
        if !self.eat(&Token::LBracket) {
            return Ok(dims);
        }
        loop {
            match self.bump() {
                Some(SpannedToken {
                    token: Token::IntLit(n),
                    ..
                }) => dims.push(ArrayDim::Fixed(n)),
                Some(SpannedToken {
                    token: Token::Ident(name),
                    ..
                }) => dims.push(ArrayDim::Named(name)),
                Some(tok) => {
                    return Err(self.error_at(
                        tok.line,
                        tok.col,
                        "array dimensions must be integer literals or names".into(),
                    ));
                }
                None => return Err(self.error("unexpected end of input in array dimensions".into())),
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBracket, "']' after the array dimensions")?;
        Ok(dims)
    }

    // ── Function bodies and statements ──────────────────────────────────

    fn body_item(&mut self) -> Result<NodeId, CompileError> {
        match self.peek() {
            Some(Token::Void) => {
                let (line, col) = self.here();
                self.bump();
                let (name, ..) = self.ident("a name after the type")?;
                self.function_def(false, Type::Void, name, line, col)
            }
            Some(Token::Bool | Token::Int | Token::Float) => {
                // `<type> <name> (` starts a nested function definition,
                // anything else is a local variable declaration.
                if matches!(self.peek_at(2), Some(Token::LParen)) {
                    let (line, col) = self.here();
                    let ty = self.value_type()?;
                    let (name, ..) = self.ident("a name after the type")?;
                    self.function_def(false, ty, name, line, col)
                } else {
                    self.var_dec()
                }
            }
            _ => self.statement(),
        }
    }

    fn var_dec(&mut self) -> Result<NodeId, CompileError> {
        let (line, col) = self.here();
        let ty = self.value_type()?;
        let (name, ..) = self.ident("a variable name")?;
        let dims = self.array_dims()?;
        let init = if self.eat(&Token::Assign) {
            Some(self.expr()?)
        } else {
            None
        };
        self.expect(Token::Semicolon, "';' after the variable declaration")?;
        let var = Variable { name, ty, dims };
        Ok(self.ast.add(
            NodeKind::VarDec {
                immutable: false,
                var,
                init,
            },
            line,
            col,
        ))
    }

    fn statement(&mut self) -> Result<NodeId, CompileError> {
        let (line, col) = self.here();
        match self.peek().cloned() {
            Some(Token::If) => {
                self.bump();
                self.expect(Token::LParen, "'(' after 'if'")?;
                let cond = self.expr()?;
                self.expect(Token::RParen, "')' after the condition")?;
                let then_body = self.block()?;
                let else_body = if self.eat(&Token::Else) {
                    self.block()?
                } else {
                    Vec::new()
                };
                Ok(self.ast.add(
                    NodeKind::If {
                        cond,
                        then_body,
                        else_body,
                    },
                    line,
                    col,
                ))
            }
            Some(Token::While) => {
                self.bump();
                self.expect(Token::LParen, "'(' after 'while'")?;
                let cond = self.expr()?;
                self.expect(Token::RParen, "')' after the condition")?;
                let body = self.block()?;
                Ok(self.ast.add(NodeKind::While { cond, body }, line, col))
            }
            Some(Token::Do) => {
                self.bump();
                let body = self.block()?;
                self.expect(Token::While, "'while' after the do block")?;
                self.expect(Token::LParen, "'(' after 'while'")?;
                let cond = self.expr()?;
                self.expect(Token::RParen, "')' after the condition")?;
                self.expect(Token::Semicolon, "';' after the do-while loop")?;
                Ok(self.ast.add(NodeKind::DoWhile { body, cond }, line, col))
            }
            Some(Token::For) => {
                self.bump();
                self.expect(Token::LParen, "'(' after 'for'")?;
                self.expect(Token::Int, "'int' before the loop counter")?;
                let (var, ..) = self.ident("a loop counter name")?;
                self.expect(Token::Assign, "'=' after the loop counter")?;
                let lower = self.expr()?;
                self.expect(Token::Comma, "',' after the lower bound")?;
                let upper = self.expr()?;
                let step = if self.eat(&Token::Comma) {
                    self.expr()?
                } else {
                    self.ast.add(
                        NodeKind::Literal {
                            value: Literal::Int(1),
                        },
                        line,
                        col,
                    )
                };
                self.expect(Token::RParen, "')' after the loop bounds")?;
                let body = self.block()?;
                Ok(self.ast.add(
                    NodeKind::For {
                        var,
                        lower,
                        upper,
                        step,
                        body,
                    },
                    line,
                    col,
                ))
            }
            Some(Token::Return) => {
                self.bump();
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(Token::Semicolon, "';' after the return statement")?;
                Ok(self.ast.add(
                    NodeKind::Return {
                        function: String::new(),
                        ty: Type::None,
                        value,
                    },
                    line,
                    col,
                ))
            }
            Some(Token::Ident(name)) => {
                self.bump();
                if self.check(&Token::LParen) {
                    let args = self.call_args()?;
                    self.expect(Token::Semicolon, "';' after the call")?;
                    return Ok(self.ast.add(
                        NodeKind::Call {
                            name,
                            dec: None,
                            args,
                        },
                        line,
                        col,
                    ));
                }
                let index = if self.check(&Token::LBracket) {
                    Some(self.index_expr()?)
                } else {
                    None
                };
                self.expect(Token::Assign, "'=' in the assignment")?;
                let value = self.expr()?;
                self.expect(Token::Semicolon, "';' after the assignment")?;
                Ok(self.ast.add(
                    NodeKind::Assignment {
                        name,
                        dec: None,
                        ty: Type::None,
                        index,
                        value,
                    },
                    line,
                    col,
                ))
            }
            Some(tok) => Err(self.error_at(line, col, format!("unexpected token {tok}"))),
            None => Err(self.error("unexpected end of input, expected a statement".into())),
        }
    }

    fn block(&mut self) -> Result<Vec<NodeId>, CompileError> {
        if self.eat(&Token::LBrace) {
            let mut stmts = Vec::new();
            while !self.check(&Token::RBrace) {
                if self.pos >= self.tokens.len() {
                    return Err(self.error("unexpected end of input inside a block".into()));
                }
                stmts.push(self.block_item()?);
            }
            self.bump();
            Ok(stmts)
        } else {
            Ok(vec![self.block_item()?])
        }
    }

    /// Blocks admit variable declarations but not nested function
    /// definitions; those may only appear directly in a function body.
    fn block_item(&mut self) -> Result<NodeId, CompileError> {
        match self.peek() {
            Some(Token::Bool | Token::Int | Token::Float) => self.var_dec(),
            _ => self.statement(),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn expr(&mut self) -> Result<NodeId, CompileError> {
        self.binary_expr(0)
    }

    /// Precedence climbing over the binary operator tiers; `min_level` is the
    /// tier below which this call stops consuming operators.
    fn binary_expr(&mut self, min_level: usize) -> Result<NodeId, CompileError> {
        const LEVELS: &[&[(Token, Operator)]] = &[
            &[(Token::Or, Operator::Or)],
            &[(Token::And, Operator::And)],
            &[(Token::Eq, Operator::Equal), (Token::Neq, Operator::NotEqual)],
            &[
                (Token::Lt, Operator::Less),
                (Token::Le, Operator::LessEqual),
                (Token::Gt, Operator::More),
                (Token::Ge, Operator::MoreEqual),
            ],
            &[(Token::Plus, Operator::Add), (Token::Minus, Operator::Subtract)],
            &[
                (Token::Star, Operator::Multiply),
                (Token::Slash, Operator::Divide),
                (Token::Percent, Operator::Modulo),
            ],
        ];

        if min_level >= LEVELS.len() {
            return self.unary_expr();
        }
        let mut left = self.binary_expr(min_level + 1)?;
        'outer: loop {
            for (tok, op) in LEVELS[min_level] {
                if self.check(tok) {
                    let (line, col) = self.here();
                    self.bump();
                    let right = self.binary_expr(min_level + 1)?;
                    left = self.ast.add(
                        NodeKind::BinaryOp {
                            op: *op,
                            ty: Type::None,
                            left,
                            right,
                        },
                        line,
                        col,
                    );
                    continue 'outer;
                }
            }
            break;
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> Result<NodeId, CompileError> {
        let (line, col) = self.here();
        if self.eat(&Token::Not) {
            let operand = self.unary_expr()?;
            return Ok(self.ast.add(
                NodeKind::UnaryOp {
                    op: Operator::Not,
                    ty: Type::None,
                    operand,
                },
                line,
                col,
            ));
        }
        if self.eat(&Token::Minus) {
            let operand = self.unary_expr()?;
            // A negated literal is a negative literal, which keeps the
            // machine's dedicated -1 encoding reachable.
            let folded = match self.ast.kind(operand) {
                NodeKind::Literal {
                    value: Literal::Int(n),
                } => Some(Literal::Int(-*n)),
                NodeKind::Literal {
                    value: Literal::Float(n),
                } => Some(Literal::Float(-*n)),
                _ => None,
            };
            if let Some(folded) = folded {
                if let NodeKind::Literal { value } = self.ast.kind_mut(operand) {
                    *value = folded;
                }
                return Ok(operand);
            }
            return Ok(self.ast.add(
                NodeKind::UnaryOp {
                    op: Operator::Negate,
                    ty: Type::None,
                    operand,
                },
                line,
                col,
            ));
        }
        // `( <type> )` is a cast, any other parenthesis belongs to primary.
        if self.check(&Token::LParen)
            && matches!(
                self.peek_at(1),
                Some(Token::Bool | Token::Int | Token::Float)
            )
            && matches!(self.peek_at(2), Some(Token::RParen))
        {
            self.bump();
            let to = self.value_type()?;
            self.bump();
            let operand = self.unary_expr()?;
            return Ok(self.ast.add(
                NodeKind::Cast {
                    to,
                    from: Type::None,
                    operand,
                },
                line,
                col,
            ));
        }
        self.primary_expr()
    }

    fn primary_expr(&mut self) -> Result<NodeId, CompileError> {
        let (line, col) = self.here();
        match self.bump() {
            Some(SpannedToken {
                token: Token::True, ..
            }) => Ok(self.ast.add(
                NodeKind::Literal {
                    value: Literal::Bool(true),
                },
                line,
                col,
            )),
            Some(SpannedToken {
                token: Token::False,
                ..
            }) => Ok(self.ast.add(
                NodeKind::Literal {
                    value: Literal::Bool(false),
                },
                line,
                col,
            )),
            Some(SpannedToken {
                token: Token::IntLit(n),
                ..
            }) => Ok(self.ast.add(
                NodeKind::Literal {
                    value: Literal::Int(n),
                },
                line,
                col,
            )),
            Some(SpannedToken {
                token: Token::FloatLit(n),
                ..
            }) => Ok(self.ast.add(
                NodeKind::Literal {
                    value: Literal::Float(n),
                },
                line,
                col,
            )),
            Some(SpannedToken {
                token: Token::LParen,
                ..
            }) => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')' after the expression")?;
                Ok(inner)
            }
            Some(SpannedToken {
                token: Token::Ident(name),
                ..
            }) => {
                if self.check(&Token::LParen) {
                    let args = self.call_args()?;
                    return Ok(self.ast.add(
                        NodeKind::Call {
                            name,
                            dec: None,
                            args,
                        },
                        line,
                        col,
                    ));
                }
                let index = if self.check(&Token::LBracket) {
                    Some(self.index_expr()?)
                } else {
                    None
                };
                Ok(self.ast.add(
                    NodeKind::Identifier {
                        name,
                        dec: None,
                        ty: Type::None,
                        index,
                    },
                    line,
                    col,
                ))
            }
            Some(tok) => Err(self.error_at(
                tok.line,
                tok.col,
                format!("expected an expression, found {}", tok.token),
            )),
            None => Err(self.error("unexpected end of input, expected an expression".into())),
        }
    }

    fn call_args(&mut self) -> Result<Vec<NodeId>, CompileError> {
        self.expect(Token::LParen, "'(' before the arguments")?;
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen, "')' after the arguments")?;
        Ok(args)
    }

    /// `[ expr, expr ]` at a use site, wrapped in an [`NodeKind::ArrayExpr`].
    fn index_expr(&mut self) -> Result<NodeId, CompileError> {
        let (line, col) = self.here();
        self.expect(Token::LBracket, "'[' before the array index")?;
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBracket, "']' after the array index")?;
        Ok(self.ast.add(NodeKind::ArrayExpr { exprs }, line, col))
    }

    // ── Token helpers ───────────────────────────────────────────────────

    fn value_type(&mut self) -> Result<Type, CompileError> {
        match self.bump() {
            Some(SpannedToken {
                token: Token::Bool, ..
            }) => Ok(Type::Bool),
            Some(SpannedToken {
                token: Token::Int, ..
            }) => Ok(Type::Int),
            Some(SpannedToken {
                token: Token::Float,
                ..
            }) => Ok(Type::Float),
            Some(tok) => Err(self.error_at(
                tok.line,
                tok.col,
                format!("expected a type, found {}", tok.token),
            )),
            None => Err(self.error("unexpected end of input, expected a type".into())),
        }
    }

    fn return_type(&mut self) -> Result<Type, CompileError> {
        if self.check(&Token::Void) {
            self.bump();
            return Ok(Type::Void);
        }
        self.value_type()
    }

    fn ident(&mut self, what: &str) -> Result<(String, usize, usize), CompileError> {
        match self.bump() {
            Some(SpannedToken {
                token: Token::Ident(name),
                line,
                col,
            }) => Ok((name, line, col)),
            Some(tok) => Err(self.error_at(
                tok.line,
                tok.col,
                format!("expected {what}, found {}", tok.token),
            )),
            None => Err(self.error(format!("unexpected end of input, expected {what}"))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bump(&mut self) -> Option<SpannedToken> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<SpannedToken, CompileError> {
        match self.bump() {
            Some(tok) if tok.token == token => Ok(tok),
            Some(tok) => Err(self.error_at(
                tok.line,
                tok.col,
                format!("expected {what}, found {}", tok.token),
            )),
            None => Err(self.error(format!("unexpected end of input, expected {what}"))),
        }
    }

    /// Position of the current token, or of the last one at end of input.
    fn here(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| (t.line, t.col))
            .unwrap_or((1, 1))
    }

    fn error(&self, message: String) -> CompileError {
        let (line, col) = self.here();
        self.error_at(line, col, message)
    }

    fn error_at(&self, line: usize, col: usize, message: String) -> CompileError {
        CompileError::Parse { line, col, message }
    }
}
