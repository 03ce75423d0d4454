use std::collections::HashMap;
use std::rc::Rc;

use paste::paste;

use crate::debug_println;
use crate::error::*;
use crate::frame::CallFrame;
use crate::function::Function;
use crate::instruction::Instruction;
use crate::value::{ValType, Value};

pub type Exports = HashMap<String, u32>;

pub struct Instance {
    call_frames: Vec<CallFrame>,
    functions: Vec<Rc<Function>>,
    globals: Vec<Value>,
    pub exports: Exports,
    results: Vec<Value>,
    max_call_depth: usize,
}

impl Default for Instance {
    fn default() -> Self { Self::new() }
}

impl Instance {
    pub const MAX_CALL_DEPTH: usize = 1000;

    pub fn new() -> Self {
        Self {
            call_frames: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            exports: Exports::new(),
            results: Vec::new(),
            max_call_depth: Self::MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    // ---------------- Registration ----------------

    pub fn add_function(&mut self, function: Function) -> u32 {
        self.functions.push(Rc::new(function));
        (self.functions.len() - 1) as u32
    }

    pub fn add_global(&mut self, value: Value) -> u32 {
        self.globals.push(value);
        (self.globals.len() - 1) as u32
    }

    pub fn export(&mut self, name: impl Into<String>, idx: u32) -> Result<(), Error> {
        if idx as usize >= self.functions.len() { return Err(Error::InvalidFunctionIndex(idx)); }
        let name = name.into();
        if self.exports.contains_key(&name) { return malformed(DUP_EXPORT_NAME); }
        self.exports.insert(name, idx);
        Ok(())
    }

    // ---------------- Inspection ----------------

    #[inline] pub fn functions(&self) -> &[Rc<Function>] { &self.functions }
    #[inline] pub fn globals(&self) -> &[Value] { &self.globals }
    #[inline] pub fn call_frames(&self) -> &[CallFrame] { &self.call_frames }
    #[inline] pub fn active_frame(&self) -> Option<&CallFrame> { self.call_frames.last() }
    #[inline] pub fn is_finished(&self) -> bool { self.call_frames.is_empty() }
    /// Values returned by the outermost call once the instance has finished.
    #[inline] pub fn results(&self) -> &[Value] { &self.results }
    #[inline] pub fn take_results(&mut self) -> Vec<Value> { std::mem::take(&mut self.results) }

    pub fn global(&self, idx: u32) -> Result<Value, Error> {
        self.globals.get(idx as usize).copied().ok_or(Error::InvalidGlobalIndex(idx))
    }

    pub fn function_index(&self, name: &str) -> Option<u32> { self.exports.get(name).copied() }

    // ---------------- Execution ----------------

    /// Pushes a frame for `functions[idx]`, taking its arguments from the active frame.
    pub fn call_function(&mut self, idx: u32) -> Result<(), Error> {
        let function = self.functions.get(idx as usize).cloned().ok_or(Error::InvalidFunctionIndex(idx))?;
        if self.call_frames.len() >= self.max_call_depth { return Err(Error::CallStackExhausted); }
        if self.call_frames.is_empty() { self.results.clear(); }
        let mut frame = CallFrame::new(function);
        let n_params = frame.function().params().len();
        if n_params > 0 {
            let caller = self.call_frames.last_mut().ok_or(Error::StackUnderflow)?;
            let args = caller.current_mut().values.pop_n(n_params)?;
            frame.bind_args(&args)?;
        }
        debug_println!("[call] fn={} depth={}", idx, self.call_frames.len() + 1);
        self.call_frames.push(frame);
        Ok(())
    }

    /// Starts `functions[idx]` on an idle instance with explicit arguments.
    pub fn start(&mut self, idx: u32, args: &[Value]) -> Result<(), Error> {
        if !self.call_frames.is_empty() { return Err(Error::InstanceBusy); }
        let function = self.functions.get(idx as usize).cloned().ok_or(Error::InvalidFunctionIndex(idx))?;
        let mut frame = CallFrame::new(function);
        frame.bind_args(args)?;
        self.results.clear();
        self.call_frames.push(frame);
        Ok(())
    }

    /// Runs `functions[idx]` to completion and returns the values it left behind.
    pub fn invoke(&mut self, idx: u32, args: &[Value]) -> Result<Vec<Value>, Error> {
        self.start(idx, args)?;
        self.run()?;
        Ok(self.take_results())
    }

    /// Abandons any in-flight call, e.g. after a trap. Functions, globals and exports are kept.
    pub fn reset(&mut self) {
        self.call_frames.clear();
        self.results.clear();
    }

    pub fn run(&mut self) -> Result<(), Error> {
        while !self.is_finished() { self.step()?; }
        Ok(())
    }

    /// Steps at most `limit` times. Returns whether the instance finished.
    pub fn run_steps(&mut self, limit: usize) -> Result<bool, Error> {
        for _ in 0..limit {
            if self.is_finished() { break; }
            self.step()?;
        }
        Ok(self.is_finished())
    }

    /// Executes one instruction of the active frame.
    pub fn step(&mut self) -> Result<(), Error> {
        let Some(frame) = self.call_frames.last_mut() else { return Ok(()) };
        if frame.finished() {
            // A caller whose last instruction was the call that just returned.
            self.return_from_frame();
            return Ok(());
        }
        let function = Rc::clone(frame.function());
        let pc = frame.pc;
        let instr = &function.instructions()[pc];
        frame.pc = pc + 1;
        debug_println!("[step] depth={} pc={} {}", self.call_frames.len(), pc, instr);

        self.execute(pc, instr)?;

        if self.call_frames.last().is_some_and(CallFrame::finished) {
            self.return_from_frame();
        }
        Ok(())
    }

    fn return_from_frame(&mut self) {
        let Some(finished) = self.call_frames.pop() else { return };
        let values = finished.into_results();
        debug_println!("[return] values={:?} depth={}", values, self.call_frames.len());
        match self.call_frames.last_mut() {
            Some(caller) => caller.current_mut().values.extend(values),
            None => self.results = values,
        }
    }

    fn execute(&mut self, pc: usize, instr: &Instruction) -> Result<(), Error> {
        let globals = &mut self.globals;
        let Some(frame) = self.call_frames.last_mut() else { return Ok(()) };

        macro_rules! binary {
            ($ty:ident, $method:ident) => {{
                paste! {
                    let b = frame.pop_typed(ValType::[<$ty:upper>])?.[<as_ $ty>]();
                    let a = frame.pop_typed(ValType::[<$ty:upper>])?.[<as_ $ty>]();
                    frame.push(Value::[<from_ $ty>](a.$method(b)));
                }
            }};
        }
        macro_rules! compare {
            ($ty:ident, $op:tt) => {{
                paste! {
                    let b = frame.pop_typed(ValType::[<$ty:upper>])?.[<as_ $ty>]();
                    let a = frame.pop_typed(ValType::[<$ty:upper>])?.[<as_ $ty>]();
                    frame.push(Value::from_bool(a $op b));
                }
            }};
        }
        macro_rules! div_s {
            ($ty:ident) => {{
                paste! {
                    let b = frame.pop_typed(ValType::[<$ty:upper>])?.[<as_ $ty>]();
                    let a = frame.pop_typed(ValType::[<$ty:upper>])?.[<as_ $ty>]();
                    if b == 0 { return Err(Error::DivisionByZero); }
                    frame.push(Value::[<from_ $ty>](a.wrapping_div(b)));
                }
            }};
        }
        macro_rules! condition {
            () => { frame.pop_typed(ValType::I32)?.as_i32() != 0 };
        }

        match instr {
            Instruction::Nop => {}
            Instruction::Block(ty) => {
                let target = frame.after_end(pc);
                frame.push_control(ty.clone(), target);
            }
            Instruction::Loop(ty) => {
                frame.push_control(ty.clone(), pc);
            }
            Instruction::If(ty) => {
                let target = frame.after_end(pc);
                if condition!() {
                    frame.push_control(ty.clone(), target);
                } else if let Some(else_pc) = frame.matching_else(pc) {
                    frame.pc = else_pc + 1;
                    frame.push_control(ty.clone(), target);
                } else {
                    frame.pc = target;
                }
            }
            Instruction::Else => {
                if let Some(scope) = frame.pop_control() { frame.pc = scope.branch_target; }
            }
            Instruction::End => {
                frame.pop_control();
            }
            Instruction::Br(label) => frame.branch(*label)?,
            Instruction::BrIf(label) => {
                if condition!() { frame.branch(*label)?; }
            }
            Instruction::Call(idx) => return self.call_function(*idx),
            Instruction::Drop => { frame.pop()?; }
            Instruction::LocalGet(idx) => {
                let v = frame.local(*idx)?;
                frame.push(v);
            }
            Instruction::LocalSet(idx) => {
                let ty = frame.local(*idx)?.ty();
                let v = frame.pop_typed(ty)?;
                *frame.local_mut(*idx)? = v;
            }
            Instruction::LocalTee(idx) => {
                let ty = frame.local(*idx)?.ty();
                let v = frame.peek()?;
                if v.ty() != ty { return Err(Error::TypeMismatch); }
                *frame.local_mut(*idx)? = v;
            }
            Instruction::GlobalGet(idx) => {
                let v = globals.get(*idx as usize).copied().ok_or(Error::InvalidGlobalIndex(*idx))?;
                frame.push(v);
            }
            Instruction::GlobalSet(idx) => {
                let slot = globals.get_mut(*idx as usize).ok_or(Error::InvalidGlobalIndex(*idx))?;
                let ty = slot.ty();
                *slot = frame.pop_typed(ty)?;
            }
            Instruction::I32Const(v) => frame.push(Value::I32(*v)),
            Instruction::I32Eq => compare!(i32, ==),
            Instruction::I32Ne => compare!(i32, !=),
            Instruction::I32LtS => compare!(i32, <),
            Instruction::I32GtS => compare!(i32, >),
            Instruction::I32LeS => compare!(i32, <=),
            Instruction::I32GeS => compare!(i32, >=),
            Instruction::I32Add => binary!(i32, wrapping_add),
            Instruction::I32Sub => binary!(i32, wrapping_sub),
            Instruction::I32Mul => binary!(i32, wrapping_mul),
            Instruction::I32DivS => div_s!(i32),
        }
        Ok(())
    }
}
