use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::*;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValType {
    I32 = 0x7f,
}

impl ValType {
    #[inline]
    pub fn zero(self) -> Value {
        match self {
            ValType::I32 => Value::I32(0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValType::I32 => "i32",
        }
    }
}

impl Display for ValType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

impl FromStr for ValType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "i32" => Ok(ValType::I32),
            _ => malformed(INVALID_VALUE_TYPE),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    I32(i32),
}

impl Value {
    #[inline] pub fn from_i32(v: i32) -> Self { Value::I32(v) }
    #[inline] pub fn from_bool(v: bool) -> Self { Value::I32(v as i32) }

    #[inline]
    pub fn as_i32(self) -> i32 {
        match self {
            Value::I32(v) => v,
        }
    }

    #[inline]
    pub fn ty(self) -> ValType {
        match self {
            Value::I32(_) => ValType::I32,
        }
    }

    /// Parses `text` as a value of type `ty`.
    pub fn parse(ty: ValType, text: &str) -> Result<Self, Error> {
        match ty {
            ValType::I32 => {
                // Accept the unsigned spelling too, e.g. "4294967295" for -1.
                if let Ok(v) = text.parse::<i32>() { return Ok(Value::I32(v)); }
                text.parse::<u32>().map(|v| Value::I32(v as i32)).map_err(|_| Error::Malformed(INVALID_VALUE))
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self { Value::I32(0) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::I32(v) }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{}:i32", v),
        }
    }
}
