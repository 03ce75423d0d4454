use clap::Parser;
use std::path::PathBuf;
use wasmstep::{Instance, ValType, Value};

mod utils;
use utils::load_program;

#[derive(Parser, Debug)]
#[command(name = "wasmstep-run")]
#[command(about = "Execute wasmstep programs one instruction at a time")]
#[command(long_about = "
wasmstep Run - stack machine program runner

Loads a JSON program document, invokes one of its named functions with the
given arguments and prints the values it returns.

Examples:
  # Run the default main function (if exists)
  wasmstep-run program.json

  # Invoke a specific function with arguments (i32 only)
  wasmstep-run program.json --invoke add --args 10 20

  # Print every executed instruction
  wasmstep-run program.json --invoke factorial --args 5 --trace

  # Give up after one million steps
  wasmstep-run program.json --invoke spin --max-steps 1000000
")]
struct Args {
    /// Path to the JSON program document
    program: PathBuf,

    /// Function to invoke (defaults to main if available)
    #[arg(short, long)]
    invoke: Option<String>,

    /// Arguments to pass to the function (value or value:i32)
    #[arg(short, long, value_delimiter = ' ', num_args = 0.., allow_negative_numbers = true)]
    args: Vec<String>,

    /// Stop after this many steps
    #[arg(long)]
    max_steps: Option<usize>,

    /// Print each instruction before it executes
    #[arg(short, long)]
    trace: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// List all exports instead of running
    #[arg(short, long)]
    list_exports: bool,
}

fn parse_value(arg: &str) -> Result<Value, String> {
    let (value_str, type_str) = arg.split_once(':').unwrap_or((arg, "i32"));
    let ty: ValType = type_str.parse()
        .map_err(|_| format!("Unknown type '{}'. Supported types: i32", type_str))?;
    Value::parse(ty, value_str)
        .map_err(|_| format!("Failed to parse '{}' as {}", value_str, ty))
}

fn trace_step(instance: &Instance) {
    let Some(frame) = instance.active_frame() else { return };
    let depth = instance.call_frames().len();
    match frame.function().instructions().get(frame.pc) {
        Some(instr) => eprintln!("{:>4} {:indent$}{}", frame.pc, "", instr, indent = (depth - 1) * 2 + (frame.depth() - 1) * 2),
        None => eprintln!("{:>4} {:indent$}<return {:?}>", frame.pc, "", frame.stack(), indent = (depth - 1) * 2),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.debug {
        eprintln!("Loading program from: {:?}", args.program);
    }

    let mut instance = load_program(&args.program)?;

    if args.debug {
        eprintln!("Program has {} functions and {} globals", instance.functions().len(), instance.globals().len());
    }

    if args.list_exports {
        println!("Exported functions:");
        let mut exports: Vec<_> = instance.exports.iter().collect();
        exports.sort_by_key(|(_, idx)| **idx);
        for (name, idx) in exports {
            let func = &instance.functions()[*idx as usize];
            let params = func.params().iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ");
            let results = func.results().iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ");
            if results.is_empty() {
                println!("  [{}] {} ({})", idx, name, params);
            } else {
                println!("  [{}] {} ({}) -> {}", idx, name, params, results);
            }
        }
        return Ok(());
    }

    let func_name = args.invoke.as_deref().unwrap_or("main");

    if args.debug {
        eprintln!("Looking for function: {}", func_name);
    }

    let idx = instance.function_index(func_name)
        .ok_or_else(|| format!("Function '{}' not found in exports", func_name))?;

    let mut call_args = Vec::new();
    for arg_str in &args.args {
        call_args.push(parse_value(arg_str)?);
    }

    let n_params = instance.functions()[idx as usize].params().len();
    if call_args.len() != n_params {
        return Err(format!(
            "Function '{}' expects {} arguments, but {} provided",
            func_name,
            n_params,
            call_args.len()
        ).into());
    }

    if args.debug {
        eprintln!("Invoking function with {} arguments", call_args.len());
    }

    instance.start(idx, &call_args)
        .map_err(|e| format!("Execution failed: {}", e))?;

    let limit = args.max_steps.unwrap_or(usize::MAX);
    let mut steps = 0usize;
    while !instance.is_finished() {
        if steps == limit {
            return Err(format!("Step limit of {} reached without finishing", limit).into());
        }
        if args.trace { trace_step(&instance); }
        instance.step().map_err(|e| format!("Execution failed after {} steps: {}", steps, e))?;
        steps += 1;
    }

    if args.debug {
        eprintln!("Finished after {} steps", steps);
    }

    let results = instance.take_results();
    if results.is_empty() {
        if args.debug {
            eprintln!("Function completed successfully (no return value)");
        }
    } else {
        println!("Result:");
        for (i, result) in results.iter().enumerate() {
            println!("  [{}] {}", i, result);
        }
    }

    Ok(())
}
