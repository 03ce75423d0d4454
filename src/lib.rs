#![deny(unsafe_code)]

pub mod error;
mod value;
mod stack;
mod function;
mod frame;
mod instance;
pub mod instruction;
pub mod program;

// Debug macro that only prints when vm_debug feature is enabled
#[cfg(feature = "vm_debug")]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

#[cfg(not(feature = "vm_debug"))]
macro_rules! debug_println {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_println;

pub use error::Error;
pub use value::{ValType, Value};
pub use stack::OperandStack;
pub use function::{BlockJump, Function};
pub use frame::{CallFrame, ControlFrame};
pub use instance::{Exports, Instance};
pub use instruction::{BlockType, Immediate, Instruction};
pub use program::Program;
