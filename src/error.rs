use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    StackUnderflow,
    TypeMismatch,
    InvalidLocalIndex(u32),
    InvalidGlobalIndex(u32),
    InvalidFunctionIndex(u32),
    InvalidLabelIndex(u32),
    DivisionByZero,
    CallStackExhausted,
    InvalidArgumentCount,
    InstanceBusy,
    Malformed(&'static str),
}

impl Error {
    pub fn message(&self) -> &'static str {
        match self {
            Error::StackUnderflow => STACK_UNDERFLOW,
            Error::TypeMismatch => TYPE_MISMATCH,
            Error::InvalidLocalIndex(_) => UNKNOWN_LOCAL,
            Error::InvalidGlobalIndex(_) => UNKNOWN_GLOBAL,
            Error::InvalidFunctionIndex(_) => UNKNOWN_FUNC,
            Error::InvalidLabelIndex(_) => UNKNOWN_LABEL,
            Error::DivisionByZero => DIVIDE_BY_ZERO,
            Error::CallStackExhausted => STACK_EXHAUSTED,
            Error::InvalidArgumentCount => INVALID_NUM_ARG,
            Error::InstanceBusy => INSTANCE_BUSY,
            Error::Malformed(s) => *s,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidLocalIndex(idx)
            | Error::InvalidGlobalIndex(idx)
            | Error::InvalidFunctionIndex(idx)
            | Error::InvalidLabelIndex(idx) => write!(f, "{} {}", self.message(), idx),
            _ => f.write_str(self.message()),
        }
    }
}

impl std::error::Error for Error {}

#[inline(always)]
pub fn malformed<T>(msg: &'static str) -> Result<T, Error> { Err(Error::Malformed(msg)) }

// Execution errors
pub const STACK_UNDERFLOW: &str = "stack underflow";
pub const TYPE_MISMATCH: &str = "type mismatch";
pub const UNKNOWN_LOCAL: &str = "unknown local";
pub const UNKNOWN_GLOBAL: &str = "unknown global";
pub const UNKNOWN_FUNC: &str = "unknown function";
pub const UNKNOWN_LABEL: &str = "unknown label";
pub const DIVIDE_BY_ZERO: &str = "integer divide by zero";
pub const STACK_EXHAUSTED: &str = "call stack exhausted";
pub const INVALID_NUM_ARG: &str = "invalid number of arguments";
pub const INSTANCE_BUSY: &str = "instance is already executing";
// Malformed program errors
pub const UNKNOWN_INSTRUCTION: &str = "unknown instruction";
pub const ILLEGAL_OP: &str = "illegal opcode";
pub const MISSING_IMMEDIATE: &str = "missing immediate";
pub const UNEXPECTED_IMMEDIATE: &str = "unexpected immediate";
pub const INVALID_IMMEDIATE: &str = "invalid immediate";
pub const INVALID_VALUE_TYPE: &str = "invalid value type";
pub const INVALID_VALUE: &str = "invalid value";
pub const INVALID_BLOCK_TYPE: &str = "invalid block type";
pub const UNKNOWN_FUNC_NAME: &str = "unknown function name";
pub const DUP_EXPORT_NAME: &str = "duplicate export name";
pub const INVALID_JSON: &str = "invalid program document";
