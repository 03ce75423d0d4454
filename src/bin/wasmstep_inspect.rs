use clap::Parser;
use std::path::PathBuf;
use wasmstep::{Instance, ValType};

mod utils;
use utils::load_program;

#[derive(Parser, Debug)]
#[command(name = "wasmstep-inspect")]
#[command(about = "Inspect wasmstep programs to understand their structure")]
#[command(long_about = "
wasmstep Inspect - program inspector

Displays the globals, exported functions and instruction listings of a
JSON program document. With --verbose every block, loop and if is annotated
with the positions of its matching else and end.

Examples:
  # Basic inspection
  wasmstep-inspect program.json

  # Show only exports
  wasmstep-inspect program.json --exports-only

  # Listing with resolved block targets and opcodes
  wasmstep-inspect program.json --verbose
")]
struct Args {
    /// Path to the JSON program document
    program: PathBuf,

    /// Show only exports
    #[arg(long)]
    exports_only: bool,

    /// Show verbose output with opcodes and block targets
    #[arg(short, long)]
    verbose: bool,
}

fn format_types(types: &[ValType]) -> String {
    types.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
}

fn export_name(instance: &Instance, idx: usize) -> Option<&str> {
    instance.exports.iter().find(|(_, i)| **i as usize == idx).map(|(n, _)| n.as_str())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let instance = load_program(&args.program)?;

    println!("Program: {}", args.program.display());
    println!();

    if !args.exports_only {
        println!("Globals ({}):", instance.globals().len());
        for (i, g) in instance.globals().iter().enumerate() {
            println!("  [{}] {}", i, g);
        }
        println!();
    }

    println!("Functions ({}):", instance.functions().len());
    for (i, func) in instance.functions().iter().enumerate() {
        let name = export_name(&instance, i);
        if args.exports_only && name.is_none() { continue; }
        println!(
            "  [{}] {} ({}) -> ({}) locals: ({})",
            i,
            name.unwrap_or("<anonymous>"),
            format_types(func.params()),
            format_types(func.results()),
            format_types(func.locals()),
        );
        if args.exports_only { continue; }

        let mut depth = 1usize;
        for (pc, instr) in func.instructions().iter().enumerate() {
            if matches!(instr, wasmstep::Instruction::End | wasmstep::Instruction::Else) {
                depth = depth.saturating_sub(1).max(1);
            }
            let mut line = format!("{:>6}  {:indent$}{}", pc, "", instr, indent = depth * 2);
            if args.verbose {
                line = format!("{:<48} ; 0x{:02x}", line, instr.opcode());
                if let Some(jump) = func.jump(pc) {
                    line.push_str(&format!(" end={}", jump.end_pc));
                    if let Some(else_pc) = jump.else_pc {
                        line.push_str(&format!(" else={}", else_pc));
                    }
                }
            }
            println!("{}", line);
            if instr.opens_scope() || matches!(instr, wasmstep::Instruction::Else) {
                depth += 1;
            }
        }
    }

    Ok(())
}
