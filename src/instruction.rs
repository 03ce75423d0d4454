use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::*;
use crate::value::{ValType, Value};

pub mod opcode {
    pub const NOP: u8 = 0x01;
    pub const BLOCK: u8 = 0x02;
    pub const LOOP: u8 = 0x03;
    pub const IF: u8 = 0x04;
    pub const ELSE: u8 = 0x05;
    pub const END: u8 = 0x0b;
    pub const BR: u8 = 0x0c;
    pub const BR_IF: u8 = 0x0d;
    pub const CALL: u8 = 0x10;
    pub const DROP: u8 = 0x1a;
    pub const LOCAL_GET: u8 = 0x20;
    pub const LOCAL_SET: u8 = 0x21;
    pub const LOCAL_TEE: u8 = 0x22;
    pub const GLOBAL_GET: u8 = 0x23;
    pub const GLOBAL_SET: u8 = 0x24;
    pub const I32_CONST: u8 = 0x41;
    pub const I32_EQ: u8 = 0x46;
    pub const I32_NE: u8 = 0x47;
    pub const I32_LT_S: u8 = 0x48;
    pub const I32_GT_S: u8 = 0x4a;
    pub const I32_LE_S: u8 = 0x4c;
    pub const I32_GE_S: u8 = 0x4e;
    pub const I32_ADD: u8 = 0x6a;
    pub const I32_SUB: u8 = 0x6b;
    pub const I32_MUL: u8 = 0x6c;
    pub const I32_DIV_S: u8 = 0x6d;
}

/// Parameter and result types of a structured scope.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct BlockType {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

impl BlockType {
    pub fn new(params: Vec<ValType>, results: Vec<ValType>) -> Self { Self { params, results } }
    pub fn empty() -> Self { Self::default() }
    pub fn is_empty(&self) -> bool { self.params.is_empty() && self.results.is_empty() }

    fn parse(tokens: &[&str]) -> Result<Self, Error> {
        enum Section { None, Params, Results }
        let mut section = Section::None;
        let mut ty = BlockType::empty();
        for tok in tokens {
            match *tok {
                "param" => section = Section::Params,
                "result" => section = Section::Results,
                t => {
                    let vt = t.parse::<ValType>()?;
                    match section {
                        Section::Params => ty.params.push(vt),
                        Section::Results => ty.results.push(vt),
                        Section::None => return malformed(INVALID_BLOCK_TYPE),
                    }
                }
            }
        }
        Ok(ty)
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        for (label, types) in [("param", &self.params), ("result", &self.results)] {
            if types.is_empty() { continue; }
            write!(f, "{}({}", sep, label)?;
            for t in types { write!(f, " {}", t)?; }
            f.write_str(")")?;
            sep = " ";
        }
        Ok(())
    }
}

/// Static operand baked into an instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Immediate {
    I32(i32),
    Index(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Block(BlockType),
    Loop(BlockType),
    If(BlockType),
    Else,
    End,
    Br(u32),
    BrIf(u32),
    Call(u32),
    Drop,
    LocalGet(u32),
    LocalSet(u32),
    LocalTee(u32),
    GlobalGet(u32),
    GlobalSet(u32),
    I32Const(i32),
    I32Eq,
    I32Ne,
    I32LtS,
    I32GtS,
    I32LeS,
    I32GeS,
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        use opcode::*;
        match self {
            Instruction::Nop => NOP,
            Instruction::Block(_) => BLOCK,
            Instruction::Loop(_) => LOOP,
            Instruction::If(_) => IF,
            Instruction::Else => ELSE,
            Instruction::End => END,
            Instruction::Br(_) => BR,
            Instruction::BrIf(_) => BR_IF,
            Instruction::Call(_) => CALL,
            Instruction::Drop => DROP,
            Instruction::LocalGet(_) => LOCAL_GET,
            Instruction::LocalSet(_) => LOCAL_SET,
            Instruction::LocalTee(_) => LOCAL_TEE,
            Instruction::GlobalGet(_) => GLOBAL_GET,
            Instruction::GlobalSet(_) => GLOBAL_SET,
            Instruction::I32Const(_) => I32_CONST,
            Instruction::I32Eq => I32_EQ,
            Instruction::I32Ne => I32_NE,
            Instruction::I32LtS => I32_LT_S,
            Instruction::I32GtS => I32_GT_S,
            Instruction::I32LeS => I32_LE_S,
            Instruction::I32GeS => I32_GE_S,
            Instruction::I32Add => I32_ADD,
            Instruction::I32Sub => I32_SUB,
            Instruction::I32Mul => I32_MUL,
            Instruction::I32DivS => I32_DIV_S,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Nop => "nop",
            Instruction::Block(_) => "block",
            Instruction::Loop(_) => "loop",
            Instruction::If(_) => "if",
            Instruction::Else => "else",
            Instruction::End => "end",
            Instruction::Br(_) => "br",
            Instruction::BrIf(_) => "br_if",
            Instruction::Call(_) => "call",
            Instruction::Drop => "drop",
            Instruction::LocalGet(_) => "local.get",
            Instruction::LocalSet(_) => "local.set",
            Instruction::LocalTee(_) => "local.tee",
            Instruction::GlobalGet(_) => "global.get",
            Instruction::GlobalSet(_) => "global.set",
            Instruction::I32Const(_) => "i32.const",
            Instruction::I32Eq => "i32.eq",
            Instruction::I32Ne => "i32.ne",
            Instruction::I32LtS => "i32.lt_s",
            Instruction::I32GtS => "i32.gt_s",
            Instruction::I32LeS => "i32.le_s",
            Instruction::I32GeS => "i32.ge_s",
            Instruction::I32Add => "i32.add",
            Instruction::I32Sub => "i32.sub",
            Instruction::I32Mul => "i32.mul",
            Instruction::I32DivS => "i32.div_s",
        }
    }

    pub fn immediate(&self) -> Option<Immediate> {
        match self {
            Instruction::I32Const(v) => Some(Immediate::I32(*v)),
            Instruction::Br(i)
            | Instruction::BrIf(i)
            | Instruction::Call(i)
            | Instruction::LocalGet(i)
            | Instruction::LocalSet(i)
            | Instruction::LocalTee(i)
            | Instruction::GlobalGet(i)
            | Instruction::GlobalSet(i) => Some(Immediate::Index(*i)),
            _ => None,
        }
    }

    pub fn block_type(&self) -> Option<&BlockType> {
        match self {
            Instruction::Block(ty) | Instruction::Loop(ty) | Instruction::If(ty) => Some(ty),
            _ => None,
        }
    }

    #[inline]
    pub fn opens_scope(&self) -> bool {
        matches!(self, Instruction::Block(_) | Instruction::Loop(_) | Instruction::If(_))
    }

    /// Builds an instruction from its opcode byte. Scope openers get an empty block type.
    pub fn from_opcode(op: u8, immediate: Option<Immediate>) -> Result<Self, Error> {
        use opcode::*;
        let index = || match immediate {
            Some(Immediate::Index(i)) => Ok(i),
            Some(Immediate::I32(v)) => u32::try_from(v).map_err(|_| Error::Malformed(INVALID_IMMEDIATE)),
            None => malformed(MISSING_IMMEDIATE),
        };
        let instr = match op {
            BR => return Ok(Instruction::Br(index()?)),
            BR_IF => return Ok(Instruction::BrIf(index()?)),
            CALL => return Ok(Instruction::Call(index()?)),
            LOCAL_GET => return Ok(Instruction::LocalGet(index()?)),
            LOCAL_SET => return Ok(Instruction::LocalSet(index()?)),
            LOCAL_TEE => return Ok(Instruction::LocalTee(index()?)),
            GLOBAL_GET => return Ok(Instruction::GlobalGet(index()?)),
            GLOBAL_SET => return Ok(Instruction::GlobalSet(index()?)),
            I32_CONST => return match immediate {
                Some(Immediate::I32(v)) => Ok(Instruction::I32Const(v)),
                Some(Immediate::Index(i)) => Ok(Instruction::I32Const(i as i32)),
                None => malformed(MISSING_IMMEDIATE),
            },
            NOP => Instruction::Nop,
            BLOCK => Instruction::Block(BlockType::empty()),
            LOOP => Instruction::Loop(BlockType::empty()),
            IF => Instruction::If(BlockType::empty()),
            ELSE => Instruction::Else,
            END => Instruction::End,
            DROP => Instruction::Drop,
            I32_EQ => Instruction::I32Eq,
            I32_NE => Instruction::I32Ne,
            I32_LT_S => Instruction::I32LtS,
            I32_GT_S => Instruction::I32GtS,
            I32_LE_S => Instruction::I32LeS,
            I32_GE_S => Instruction::I32GeS,
            I32_ADD => Instruction::I32Add,
            I32_SUB => Instruction::I32Sub,
            I32_MUL => Instruction::I32Mul,
            I32_DIV_S => Instruction::I32DivS,
            _ => return malformed(ILLEGAL_OP),
        };
        if immediate.is_some() { return malformed(UNEXPECTED_IMMEDIATE); }
        Ok(instr)
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())?;
        match (self.immediate(), self.block_type()) {
            (Some(Immediate::I32(v)), _) => write!(f, " {}", v),
            (Some(Immediate::Index(i)), _) => write!(f, " {}", i),
            (None, Some(ty)) if !ty.is_empty() => write!(f, " {}", ty),
            _ => Ok(()),
        }
    }
}

impl FromStr for Instruction {
    type Err = Error;

    /// Parses the text form, e.g. `i32.const -3`, `br_if 1` or `block (param i32) (result i32)`.
    fn from_str(s: &str) -> Result<Self, Error> {
        let spaced = s.replace(['(', ')'], " ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        let Some((&name, rest)) = tokens.split_first() else { return malformed(UNKNOWN_INSTRUCTION); };

        let index = |rest: &[&str]| -> Result<u32, Error> {
            match rest {
                [tok] => tok.parse::<u32>().map_err(|_| Error::Malformed(INVALID_IMMEDIATE)),
                [] => malformed(MISSING_IMMEDIATE),
                _ => malformed(UNEXPECTED_IMMEDIATE),
            }
        };
        let block = |rest: &[&str]| BlockType::parse(rest);

        let instr = match name {
            "block" => return Ok(Instruction::Block(block(rest)?)),
            "loop" => return Ok(Instruction::Loop(block(rest)?)),
            "if" => return Ok(Instruction::If(block(rest)?)),
            "br" => return Ok(Instruction::Br(index(rest)?)),
            "br_if" => return Ok(Instruction::BrIf(index(rest)?)),
            "call" => return Ok(Instruction::Call(index(rest)?)),
            "local.get" => return Ok(Instruction::LocalGet(index(rest)?)),
            "local.set" => return Ok(Instruction::LocalSet(index(rest)?)),
            "local.tee" => return Ok(Instruction::LocalTee(index(rest)?)),
            "global.get" => return Ok(Instruction::GlobalGet(index(rest)?)),
            "global.set" => return Ok(Instruction::GlobalSet(index(rest)?)),
            "i32.const" => {
                return match rest {
                    [tok] => Value::parse(ValType::I32, tok).map(|v| Instruction::I32Const(v.as_i32())),
                    [] => malformed(MISSING_IMMEDIATE),
                    _ => malformed(UNEXPECTED_IMMEDIATE),
                };
            }
            "nop" => Instruction::Nop,
            "else" => Instruction::Else,
            "end" => Instruction::End,
            "drop" => Instruction::Drop,
            "i32.eq" => Instruction::I32Eq,
            "i32.ne" => Instruction::I32Ne,
            "i32.lt_s" => Instruction::I32LtS,
            "i32.gt_s" => Instruction::I32GtS,
            "i32.le_s" => Instruction::I32LeS,
            "i32.ge_s" => Instruction::I32GeS,
            "i32.add" => Instruction::I32Add,
            "i32.sub" => Instruction::I32Sub,
            "i32.mul" => Instruction::I32Mul,
            "i32.div_s" => Instruction::I32DivS,
            _ => return malformed(UNKNOWN_INSTRUCTION),
        };
        if !rest.is_empty() { return malformed(UNEXPECTED_IMMEDIATE); }
        Ok(instr)
    }
}
