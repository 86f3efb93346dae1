//! Reserved descriptor keys

/// Class metadata entry; holds a [`ClassInfo`](crate::ClassInfo) object
pub const CLASS_KEY: &str = "__glue_class";

/// Base class descriptor entry
pub const EXTENDS_KEY: &str = "__glue_extends";

/// Constructor entry
pub const CONSTRUCTOR_KEY: &str = "__new";

/// Operator overload entries
pub mod operators {
    /// `a == b`
    pub const EQ: &str = "__eq";
    /// `-a`
    pub const NEG: &str = "__unm";
    /// `a + b`
    pub const ADD: &str = "__add";
    /// `a - b`
    pub const SUB: &str = "__sub";
    /// `a * b`
    pub const MUL: &str = "__mul";
    /// `a / b`
    pub const DIV: &str = "__div";
    /// `a ^ b`
    pub const POW: &str = "__pow";
    /// `a < b`
    pub const LT: &str = "__lt";
    /// `a <= b`
    pub const LE: &str = "__le";
    /// `a // b`
    pub const IDIV: &str = "__idiv";
    /// `a % b`
    pub const MOD: &str = "__mod";
    /// `tostring(a)`
    pub const TOSTRING: &str = "__tostring";
}

/// Whether `key` is reserved for bridge metadata
pub fn is_reserved(key: &str) -> bool {
    key == CLASS_KEY || key == EXTENDS_KEY
}
