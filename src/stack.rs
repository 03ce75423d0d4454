use crate::error::Error;
use crate::value::{ValType, Value};

/// LIFO of values owned by a single control frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperandStack {
    values: Vec<Value>,
}

impl OperandStack {
    pub fn new() -> Self { Self { values: Vec::new() } }

    #[inline] pub fn len(&self) -> usize { self.values.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.values.is_empty() }
    #[inline] pub fn as_slice(&self) -> &[Value] { &self.values }
    #[inline] pub fn into_vec(self) -> Vec<Value> { self.values }
    #[inline] pub fn push(&mut self, v: Value) { self.values.push(v); }

    #[inline]
    pub fn pop(&mut self) -> Result<Value, Error> {
        self.values.pop().ok_or(Error::StackUnderflow)
    }

    #[inline]
    pub fn peek(&self) -> Result<Value, Error> {
        self.values.last().copied().ok_or(Error::StackUnderflow)
    }

    /// Pops the top value, failing without popping if it is not of type `ty`.
    #[inline]
    pub fn pop_typed(&mut self, ty: ValType) -> Result<Value, Error> {
        if self.peek()?.ty() != ty { return Err(Error::TypeMismatch); }
        self.pop()
    }

    /// Removes the top `n` values, returned bottom to top.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, Error> {
        if n > self.values.len() { return Err(Error::StackUnderflow); }
        Ok(self.values.split_off(self.values.len() - n))
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = Value>) {
        self.values.extend(values);
    }
}

impl From<Vec<Value>> for OperandStack {
    fn from(values: Vec<Value>) -> Self { Self { values } }
}
