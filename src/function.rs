use nohash_hasher::IntMap;

use crate::debug_println;
use crate::instruction::Instruction;
use crate::value::ValType;

/// Matching boundaries of one `block`, `loop` or `if` opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockJump {
    /// Position of the `else` belonging to an `if`, if any.
    pub else_pc: Option<usize>,
    /// Position of the matching `end`, or the instruction count when the scope is never closed.
    pub end_pc: usize,
}

#[derive(Debug, Clone)]
pub struct Function {
    params: Vec<ValType>,
    results: Vec<ValType>,
    locals: Vec<ValType>,
    instructions: Vec<Instruction>,
    jumps: IntMap<usize, BlockJump>,
}

impl Function {
    pub fn new(params: Vec<ValType>, results: Vec<ValType>, locals: Vec<ValType>, instructions: Vec<Instruction>) -> Self {
        let jumps = resolve_jumps(&instructions);
        Self { params, results, locals, instructions, jumps }
    }

    #[inline] pub fn params(&self) -> &[ValType] { &self.params }
    #[inline] pub fn results(&self) -> &[ValType] { &self.results }
    /// Locals declared beyond the parameters.
    #[inline] pub fn locals(&self) -> &[ValType] { &self.locals }
    #[inline] pub fn instructions(&self) -> &[Instruction] { &self.instructions }
    #[inline] pub fn len(&self) -> usize { self.instructions.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.instructions.is_empty() }

    /// Types of every local slot: parameters first, then declared locals.
    pub fn local_types(&self) -> impl Iterator<Item = ValType> + '_ {
        self.params.iter().chain(self.locals.iter()).copied()
    }

    #[inline]
    pub fn jump(&self, opener_pc: usize) -> Option<BlockJump> { self.jumps.get(&opener_pc).copied() }

    /// Position of the `end` closing the scope opened at `opener_pc`.
    pub fn matching_end(&self, opener_pc: usize) -> usize {
        self.jump(opener_pc).map_or(self.instructions.len(), |j| j.end_pc)
    }

    /// Position of the `else` of the `if` at `opener_pc`.
    pub fn matching_else(&self, opener_pc: usize) -> Option<usize> {
        self.jump(opener_pc).and_then(|j| j.else_pc)
    }
}

fn resolve_jumps(instructions: &[Instruction]) -> IntMap<usize, BlockJump> {
    let mut jumps = IntMap::default();
    let mut open: Vec<usize> = Vec::new();
    for (pc, instr) in instructions.iter().enumerate() {
        match instr {
            Instruction::Block(_) | Instruction::Loop(_) | Instruction::If(_) => {
                open.push(pc);
                jumps.insert(pc, BlockJump { else_pc: None, end_pc: instructions.len() });
            }
            Instruction::Else => {
                let Some(&start) = open.last() else { continue };
                if matches!(instructions[start], Instruction::If(_)) {
                    if let Some(j) = jumps.get_mut(&start) { j.else_pc = Some(pc); }
                }
            }
            Instruction::End => {
                let Some(start) = open.pop() else { continue };
                debug_println!("[jump] {} at {} -> end={}", instructions[start].name(), start, pc);
                if let Some(j) = jumps.get_mut(&start) { j.end_pc = pc; }
            }
            _ => {}
        }
    }
    jumps
}
