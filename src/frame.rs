use std::rc::Rc;

use crate::debug_println;
use crate::error::Error;
use crate::function::Function;
use crate::instruction::BlockType;
use crate::stack::OperandStack;
use crate::value::{ValType, Value};

/// One open block, loop or if scope.
#[derive(Debug, Clone)]
pub struct ControlFrame {
    pub values: OperandStack,
    pub block_type: BlockType,
    /// Where execution resumes when a branch targets this scope.
    pub branch_target: usize,
}

impl ControlFrame {
    pub fn new(block_type: BlockType, branch_target: usize) -> Self {
        Self { values: OperandStack::new(), block_type, branch_target }
    }
}

/// One function activation.
#[derive(Debug, Clone)]
pub struct CallFrame {
    function: Rc<Function>,
    control_frames: Vec<ControlFrame>,
    locals: Vec<Value>,
    pub pc: usize,
}

impl CallFrame {
    pub fn new(function: Rc<Function>) -> Self {
        let locals = function.local_types().map(ValType::zero).collect();
        let body = BlockType::new(function.params().to_vec(), function.results().to_vec());
        let root = ControlFrame::new(body, function.len());
        Self { function, control_frames: vec![root], locals, pc: 0 }
    }

    #[inline] pub fn function(&self) -> &Rc<Function> { &self.function }
    #[inline] pub fn finished(&self) -> bool { self.pc == self.function.len() }
    #[inline] pub fn depth(&self) -> usize { self.control_frames.len() }
    #[inline] pub fn control_frames(&self) -> &[ControlFrame] { &self.control_frames }
    #[inline] pub fn locals(&self) -> &[Value] { &self.locals }

    #[inline]
    pub fn current(&self) -> &ControlFrame {
        // The root frame is never popped.
        &self.control_frames[self.control_frames.len() - 1]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut ControlFrame {
        let last = self.control_frames.len() - 1;
        &mut self.control_frames[last]
    }

    /// Values of the innermost scope, bottom to top.
    #[inline] pub fn stack(&self) -> &[Value] { self.current().values.as_slice() }

    #[inline] pub fn push(&mut self, v: Value) { self.current_mut().values.push(v); }
    #[inline] pub fn pop(&mut self) -> Result<Value, Error> { self.current_mut().values.pop() }
    #[inline] pub fn peek(&self) -> Result<Value, Error> { self.current().values.peek() }
    #[inline] pub fn pop_typed(&mut self, ty: ValType) -> Result<Value, Error> { self.current_mut().values.pop_typed(ty) }

    pub fn push_control(&mut self, block_type: BlockType, branch_target: usize) {
        self.control_frames.push(ControlFrame::new(block_type, branch_target));
    }

    /// Closes the innermost scope. Closing the function body finishes the frame instead.
    pub fn pop_control(&mut self) -> Option<ControlFrame> {
        if self.control_frames.len() == 1 {
            self.pc = self.function.len();
            return None;
        }
        self.control_frames.pop()
    }

    /// Unwinds `label + 1` scopes and jumps to the branch target of the outermost one.
    /// Targeting the function body keeps its values and finishes the frame.
    pub fn branch(&mut self, label: u32) -> Result<(), Error> {
        let depth = label as usize;
        let len = self.control_frames.len();
        if depth >= len { return Err(Error::InvalidLabelIndex(label)); }
        if depth == len - 1 {
            self.control_frames.truncate(1);
            self.pc = self.control_frames[0].branch_target;
        } else {
            let keep = len - depth - 1;
            self.pc = self.control_frames[keep].branch_target;
            self.control_frames.truncate(keep);
        }
        debug_println!("[br] label={} -> pc={} depth={}", label, self.pc, self.control_frames.len());
        Ok(())
    }

    /// Resume point after the `end` closing the scope opened at `opener_pc`.
    pub fn after_end(&self, opener_pc: usize) -> usize {
        (self.function.matching_end(opener_pc) + 1).min(self.function.len())
    }

    pub fn matching_else(&self, opener_pc: usize) -> Option<usize> { self.function.matching_else(opener_pc) }

    #[inline]
    pub fn local(&self, idx: u32) -> Result<Value, Error> {
        self.locals.get(idx as usize).copied().ok_or(Error::InvalidLocalIndex(idx))
    }

    #[inline]
    pub fn local_mut(&mut self, idx: u32) -> Result<&mut Value, Error> {
        self.locals.get_mut(idx as usize).ok_or(Error::InvalidLocalIndex(idx))
    }

    /// Stores call arguments into the leading local slots.
    pub fn bind_args(&mut self, args: &[Value]) -> Result<(), Error> {
        if args.len() != self.function.params().len() { return Err(Error::InvalidArgumentCount); }
        for (slot, (arg, ty)) in self.locals.iter_mut().zip(args.iter().zip(self.function.params())) {
            if arg.ty() != *ty { return Err(Error::TypeMismatch); }
            *slot = *arg;
        }
        Ok(())
    }

    /// Values left on the innermost scope, handed to the caller on return.
    pub fn into_results(mut self) -> Vec<Value> {
        match self.control_frames.pop() {
            Some(frame) => frame.values.into_vec(),
            None => Vec::new(),
        }
    }
}
