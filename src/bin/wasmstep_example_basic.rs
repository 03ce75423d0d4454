use wasmstep::{Function, Instance, Instruction, ValType, Value};

mod utils;
use utils::load_resource_program;

fn invoke_named(instance: &mut Instance, name: &str, args: &[i32]) -> Result<i32, Box<dyn std::error::Error>> {
    let idx = instance.function_index(name).ok_or_else(|| format!("no function named {}", name))?;
    let args: Vec<Value> = args.iter().copied().map(Value::from_i32).collect();
    let results = instance.invoke(idx, &args)?;
    let first = results.first().ok_or_else(|| format!("{} returned nothing", name))?;
    Ok(first.as_i32())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Built directly through the API: (3 * 2 + 4) == 10
    let mut instance = Instance::new();
    let expr = instance.add_function(Function::new(vec![], vec![ValType::I32], vec![], vec![
        Instruction::I32Const(3),
        Instruction::I32Const(2),
        Instruction::I32Mul,
        Instruction::I32Const(4),
        Instruction::I32Add,
        Instruction::I32Const(10),
        Instruction::I32Eq,
    ]));
    instance.start(expr, &[])?;
    let mut steps = 0;
    while !instance.is_finished() {
        if let Some(top) = instance.active_frame().and_then(|f| f.stack().last()) {
            println!("  step {}: top = {}", steps, top);
        }
        instance.step()?;
        steps += 1;
    }
    println!("(3 * 2 + 4) == 10 -> {:?}", instance.results());

    // Nested call: fn1 pushes 10 and calls fn2, which adds 5 to its argument
    let mut instance = Instance::new();
    let fn2 = instance.add_function(Function::new(vec![ValType::I32], vec![ValType::I32], vec![], vec![
        Instruction::LocalGet(0),
        Instruction::I32Const(5),
        Instruction::I32Add,
    ]));
    let fn1 = instance.add_function(Function::new(vec![], vec![ValType::I32], vec![], vec![
        Instruction::I32Const(10),
        Instruction::Call(fn2),
    ]));
    println!("fn1() = {:?}", instance.invoke(fn1, &[])?);

    let mut arithmetic = load_resource_program("arithmetic")?;
    println!("add(10, 32) = {}", invoke_named(&mut arithmetic, "add", &[10, 32])?);
    println!("subtract(100, 58) = {}", invoke_named(&mut arithmetic, "subtract", &[100, 58])?);
    println!("multiply(6, 7) = {}", invoke_named(&mut arithmetic, "multiply", &[6, 7])?);
    println!("divide(84, 2) = {}", invoke_named(&mut arithmetic, "divide", &[84, 2])?);
    match invoke_named(&mut arithmetic, "divide", &[1, 0]) {
        Ok(v) => println!("divide(1, 0) = {}", v),
        Err(e) => println!("divide(1, 0) failed: {}", e),
    }

    let mut factorial = load_resource_program("factorial")?;
    for n in [0, 1, 5, 10] {
        println!("factorial({}) = {}", n, invoke_named(&mut factorial, "factorial", &[n])?);
    }

    let mut control = load_resource_program("control_flow")?;
    for n in [0, 1, 2, 5, 10] {
        println!("fibonacci({}) = {}", n, invoke_named(&mut control, "fibonacci", &[n])?);
    }
    println!("max(42, 17) = {}", invoke_named(&mut control, "max", &[42, 17])?);
    println!("min(42, 17) = {}", invoke_named(&mut control, "min", &[42, 17])?);
    println!("abs(-42) = {}", invoke_named(&mut control, "abs", &[-42])?);
    for n in [-42, 0, 42] {
        println!("sign({}) = {}", n, invoke_named(&mut control, "sign", &[n])?);
    }
    for _ in 0..3 {
        println!("tick() = {}", invoke_named(&mut control, "tick", &[])?);
    }

    Ok(())
}
