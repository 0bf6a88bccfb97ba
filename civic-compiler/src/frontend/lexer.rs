use logos::Logos;
use std::fmt;

/// Cause of a tokenizer failure, attached to logos error tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexErrorKind {
    #[default]
    UnexpectedCharacter,
    IntegerOverflow,
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\n]+")] // Whitespace
#[logos(skip r"//[^\n]*")] // Line comments
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")] // Block comments
pub enum Token {
    // --- Keywords ---
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("return")]
    Return,
    #[token("export")]
    Export,
    #[token("extern")]
    Extern,

    #[token("bool")]
    Bool,
    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("void")]
    Void,

    #[token("true")]
    True,
    #[token("false")]
    False,

    // --- Identifiers and literals ---
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i32>().map_err(|_| LexErrorKind::IntegerOverflow))]
    IntLit(i32),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f32>().map_err(|_| LexErrorKind::UnexpectedCharacter))]
    FloatLit(f32),

    // --- Operators ---
    #[token("==")]
    Eq,
    #[token("!=")]
    Neq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,

    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // --- Punctuation ---
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Do => write!(f, "do"),
            Token::For => write!(f, "for"),
            Token::Return => write!(f, "return"),
            Token::Export => write!(f, "export"),
            Token::Extern => write!(f, "extern"),
            Token::Bool => write!(f, "bool"),
            Token::Int => write!(f, "int"),
            Token::Float => write!(f, "float"),
            Token::Void => write!(f, "void"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Ident(s) => write!(f, "'{s}'"),
            Token::IntLit(n) => write!(f, "{n}"),
            Token::FloatLit(n) => write!(f, "{n}"),
            Token::Eq => write!(f, "=="),
            Token::Neq => write!(f, "!="),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Not => write!(f, "!"),
            Token::Assign => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
        }
    }
}

/// A fatal tokenizer error with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalError {
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
    pub context: String,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            LexErrorKind::UnexpectedCharacter => "unexpected character",
            LexErrorKind::IntegerOverflow => "integer literal overflow",
        };
        write!(
            f,
            "{what} at line {} column {}: {}",
            self.line, self.column, self.context
        )
    }
}

impl std::error::Error for LexicalError {}

/// A token together with its 1-based line/column.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
    pub col: usize,
}

/// Convert a byte position to 1-based line and column numbers.
pub fn position_to_line_col(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= position {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// The source line containing an error position, trimmed for display.
pub fn error_context(source: &str, position: usize) -> String {
    let line_start = source[..position].rfind('\n').map(|p| p + 1).unwrap_or(0);
    let line_end = source[position..]
        .find('\n')
        .map(|p| position + p)
        .unwrap_or(source.len());
    source[line_start..line_end].trim().to_string()
}

/// Tokenize the whole source, failing fast on the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexicalError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line, col) = position_to_line_col(source, span.start);
        match result {
            Ok(token) => tokens.push(SpannedToken { token, line, col }),
            Err(kind) => {
                return Err(LexicalError {
                    kind,
                    line,
                    column: col,
                    context: error_context(source, span.start),
                });
            }
        }
    }
    Ok(tokens)
}
