//! Textual instruction selection for the stack machine.
//!
//! Every function returns the exact mnemonic/operand text of one
//! instruction. Selection panics on type combinations the machine cannot
//! encode; by the time instructions are selected, the analyzer and the
//! lowering passes must have removed them, so a panic here is a compiler
//! bug, not a user error.

use crate::ast::Type;

/// Machine-level type classes. `Array` covers reference loads/stores of
/// whole arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrType {
    Int,
    Float,
    Bool,
    Void,
    Array,
}

impl From<Type> for InstrType {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Int => InstrType::Int,
            Type::Float => InstrType::Float,
            Type::Bool => InstrType::Bool,
            Type::Void => InstrType::Void,
            Type::None => panic!("unresolved type reached the code generator"),
        }
    }
}

fn prefix(ty: InstrType) -> char {
    match ty {
        InstrType::Int => 'i',
        InstrType::Float => 'f',
        InstrType::Bool => 'b',
        InstrType::Array => 'a',
        InstrType::Void => panic!("void has no addressable encoding"),
    }
}

fn numeric_prefix(ty: InstrType) -> char {
    match ty {
        InstrType::Int => 'i',
        InstrType::Float => 'f',
        other => panic!("numeric instruction selected for {other:?}"),
    }
}

// ── Arithmetic and comparison ───────────────────────────────────────────

pub fn add(ty: InstrType) -> String {
    format!("{}add", numeric_prefix(ty))
}

pub fn sub(ty: InstrType) -> String {
    format!("{}sub", numeric_prefix(ty))
}

pub fn mul(ty: InstrType) -> String {
    format!("{}mul", numeric_prefix(ty))
}

pub fn div(ty: InstrType) -> String {
    format!("{}div", numeric_prefix(ty))
}

pub fn rem(ty: InstrType) -> String {
    assert!(ty == InstrType::Int, "modulo is only defined on int");
    "irem".to_string()
}

pub fn neg(ty: InstrType) -> String {
    format!("{}neg", numeric_prefix(ty))
}

pub fn not(ty: InstrType) -> String {
    assert!(ty == InstrType::Bool, "negation is only defined on bool");
    "bnot".to_string()
}

pub fn equal(ty: InstrType) -> String {
    format!("{}eq", prefix(ty))
}

pub fn not_equal(ty: InstrType) -> String {
    format!("{}ne", prefix(ty))
}

pub fn less(ty: InstrType) -> String {
    format!("{}lt", numeric_prefix(ty))
}

pub fn less_equal(ty: InstrType) -> String {
    format!("{}le", numeric_prefix(ty))
}

pub fn greater(ty: InstrType) -> String {
    format!("{}gt", numeric_prefix(ty))
}

pub fn greater_equal(ty: InstrType) -> String {
    format!("{}ge", numeric_prefix(ty))
}

// ── Control flow ────────────────────────────────────────────────────────

/// How a callee's static link is established before the jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubScope {
    /// Direct recursion: re-enter the scope currently being set up.
    Current,
    /// Walk this many static links outward before entering the callee.
    Outer(i32),
    /// Callee is declared in the caller's own body scope.
    Local,
    /// Callee is a top-level function.
    Global,
}

pub fn initiate_sub(scope: SubScope) -> String {
    match scope {
        SubScope::Current => "isr".to_string(),
        SubScope::Outer(levels) => format!("isrn {levels}"),
        SubScope::Local => "isrl".to_string(),
        SubScope::Global => "isrg".to_string(),
    }
}

pub fn jump_sub(arguments: usize, label: &str) -> String {
    format!("jsr {arguments} {label}")
}

pub fn jump_ext_sub(index: usize) -> String {
    format!("jsre {index}")
}

pub fn enter_sub(locals: usize) -> String {
    format!("esr {locals}")
}

pub fn ret(ty: InstrType) -> String {
    match ty {
        InstrType::Int => "ireturn".to_string(),
        InstrType::Float => "freturn".to_string(),
        InstrType::Bool => "breturn".to_string(),
        InstrType::Void => "return".to_string(),
        InstrType::Array => panic!("arrays cannot be returned"),
    }
}

pub fn jump(label: &str) -> String {
    format!("jump {label}")
}

pub fn branch(condition: bool, label: &str) -> String {
    if condition {
        format!("branch_t {label}")
    } else {
        format!("branch_f {label}")
    }
}

// ── Variable access ─────────────────────────────────────────────────────

pub fn load_local(ty: InstrType, index: i32) -> String {
    // The machine has short encodings for the first four slots.
    if (0..=3).contains(&index) {
        format!("{}load_{index}", prefix(ty))
    } else {
        format!("{}load {index}", prefix(ty))
    }
}

pub fn store_local(ty: InstrType, index: i32) -> String {
    format!("{}store {index}", prefix(ty))
}

pub fn load_relative(ty: InstrType, levels: i32, index: i32) -> String {
    format!("{}loadn {levels} {index}", prefix(ty))
}

pub fn store_relative(ty: InstrType, levels: i32, index: i32) -> String {
    format!("{}storen {levels} {index}", prefix(ty))
}

pub fn load_global(ty: InstrType, index: usize) -> String {
    format!("{}loadg {index}", prefix(ty))
}

pub fn store_global(ty: InstrType, index: usize) -> String {
    format!("{}storeg {index}", prefix(ty))
}

pub fn pop(ty: InstrType) -> String {
    format!("{}pop", numeric_or_bool_prefix(ty))
}

fn numeric_or_bool_prefix(ty: InstrType) -> char {
    match ty {
        InstrType::Int => 'i',
        InstrType::Float => 'f',
        InstrType::Bool => 'b',
        other => panic!("no pop encoding for {other:?}"),
    }
}

// ── Arrays ──────────────────────────────────────────────────────────────

pub fn new_array(ty: InstrType, dimensions: usize) -> String {
    format!("{}newa {dimensions}", numeric_or_bool_prefix(ty))
}

pub fn read_array(ty: InstrType) -> String {
    format!("{}loada", numeric_or_bool_prefix(ty))
}

pub fn store_array(ty: InstrType) -> String {
    format!("{}storea", numeric_or_bool_prefix(ty))
}

// ── Casts ───────────────────────────────────────────────────────────────

pub fn int_to_float() -> String {
    "i2f".to_string()
}

pub fn float_to_int() -> String {
    "f2i".to_string()
}

// ── Constant pool ───────────────────────────────────────────────────────

/// Deduplicated constant table, keyed on `(type, literal text)`. The pool is
/// owned by one generator instance; separate compilations cannot interfere.
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<(String, String)>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_int(&mut self, value: i32) -> String {
        // -1 has a dedicated encoding and bypasses the pool.
        if value == -1 {
            return "iloadc_m1".to_string();
        }
        let index = self.index("int", value.to_string());
        format!("iloadc {index}")
    }

    pub fn load_float(&mut self, value: f32) -> String {
        let index = self.index("float", value.to_string());
        format!("floadc {index}")
    }

    pub fn load_bool(value: bool) -> String {
        if value { "bloadc_t" } else { "bloadc_f" }.to_string()
    }

    fn index(&mut self, ty: &str, text: String) -> usize {
        if let Some(found) = self
            .entries
            .iter()
            .position(|(t, v)| t == ty && *v == text)
        {
            return found;
        }
        self.entries.push((ty.to_string(), text));
        self.entries.len() - 1
    }

    /// `.const <type> <value>` directives in pool order.
    pub fn table(&self) -> String {
        let mut out = String::new();
        for (ty, value) in &self.entries {
            out.push_str(&format!(".const {ty} {value}\n"));
        }
        out
    }
}
