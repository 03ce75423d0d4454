use std::{env, fs, path::Path};
use serde::Deserialize;
use wasmstep::program::ValueJSON;
use wasmstep::{Error, Instance, Program, Value};

#[allow(dead_code)]
#[derive(Deserialize, Clone)]
#[serde(tag = "type")]
enum TestCmd {
    #[serde(rename = "assert_return")]
    AssertReturn { line: i32, invoke: String, #[serde(default)] args: Vec<ValueJSON>, expected: Vec<ValueJSON> },
    #[serde(rename = "assert_trap")]
    AssertTrap { line: i32, invoke: String, #[serde(default)] args: Vec<ValueJSON>, text: String },
    #[serde(rename = "assert_exhaustion")]
    AssertExhaustion { line: i32, invoke: String, #[serde(default)] args: Vec<ValueJSON>, max_steps: usize },
    #[serde(rename = "assert_global")]
    AssertGlobal { line: i32, index: u32, expected: ValueJSON },
}

#[derive(Deserialize)]
struct ScenarioJSON {
    program: Program,
    commands: Vec<TestCmd>,
}

fn to_values(values: &[ValueJSON]) -> Vec<Value> {
    values.iter().map(|v| v.to_value().expect("scenario value")).collect()
}

fn start(inst: &mut Instance, field: &str, args: &[ValueJSON]) -> Result<(), Error> {
    let idx = inst.function_index(field).ok_or(Error::Malformed("export not found"))?;
    inst.start(idx, &to_values(args))
}

fn run_command(inst: &mut Instance, cmd: &TestCmd) -> Result<(), String> {
    match cmd {
        TestCmd::AssertReturn { invoke, args, expected, .. } => {
            start(inst, invoke, args).map_err(|e| format!("start failed: {}", e))?;
            inst.run().map_err(|e| format!("unexpected trap: {}", e))?;
            let results = inst.take_results();
            let expected = to_values(expected);
            if results != expected {
                return Err(format!("expected {:?}, got {:?}", expected, results));
            }
            Ok(())
        }
        TestCmd::AssertTrap { invoke, args, text, .. } => {
            let outcome = start(inst, invoke, args).and_then(|_| inst.run());
            inst.reset();
            match outcome {
                Ok(()) => Err(format!("expected trap '{}', but execution finished", text)),
                Err(e) if e.message() == text => Ok(()),
                Err(e) => Err(format!("expected trap '{}', got '{}'", text, e)),
            }
        }
        TestCmd::AssertExhaustion { invoke, args, max_steps, .. } => {
            start(inst, invoke, args).map_err(|e| format!("start failed: {}", e))?;
            let finished = inst.run_steps(*max_steps).map_err(|e| format!("unexpected trap: {}", e))?;
            inst.reset();
            if finished { Err(format!("finished within {} steps", max_steps)) } else { Ok(()) }
        }
        TestCmd::AssertGlobal { index, expected, .. } => {
            let actual = inst.global(*index).map_err(|e| e.to_string())?;
            let expected = expected.to_value().map_err(|e| e.to_string())?;
            if actual != expected {
                return Err(format!("global {}: expected {}, got {}", index, expected, actual));
            }
            Ok(())
        }
    }
}

fn line_of(cmd: &TestCmd) -> i32 {
    match cmd {
        TestCmd::AssertReturn { line, .. }
        | TestCmd::AssertTrap { line, .. }
        | TestCmd::AssertExhaustion { line, .. }
        | TestCmd::AssertGlobal { line, .. } => *line,
    }
}

fn run_scenario_file(path: &Path) -> Result<(u32, u32), String> {
    let text = fs::read_to_string(path).map_err(|e| format!("failed to read json: {}", e))?;
    let scenario: ScenarioJSON = serde_json::from_str(&text).map_err(|e| format!("failed to parse json: {}", e))?;

    let mut inst = scenario.program.instantiate().map_err(|e| format!("instantiate failed: {}", e))?;
    let mut passes = 0u32;
    let mut failures = 0u32;

    for cmd in &scenario.commands {
        match run_command(&mut inst, cmd) {
            Ok(()) => passes += 1,
            Err(e) => {
                eprintln!("  line {}: {}", line_of(cmd), e);
                failures += 1;
            }
        }
    }
    Ok((passes, failures))
}

#[test]
fn run_scenarios() {
    let filter = env::var("SCENARIO_FILTER").ok();
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scenarios");

    let mut total_passes = 0u32;
    let mut total_failures = 0u32;

    let mut paths: Vec<_> = fs::read_dir(&dir).expect("failed to read scenario directory")
        .map(|entry| entry.expect("failed to read entry").path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();

    for path in paths {
        let stem = path.file_stem().unwrap().to_str().unwrap().to_string();
        if let Some(ref f) = filter {
            if !stem.contains(f) { continue; }
        }
        println!("Running {}", stem);
        match run_scenario_file(&path) {
            Ok((passes, failures)) => {
                total_passes += passes;
                total_failures += failures;
                println!("  {} passed, {} failed", passes, failures);
            }
            Err(e) => {
                eprintln!("  Error: {}", e);
                total_failures += 1;
            }
        }
    }

    println!("\nTotal: {} passed, {} failed", total_passes, total_failures);
    assert!(total_passes > 0, "no scenarios ran");
    if total_failures > 0 {
        panic!("{} scenario commands failed", total_failures);
    }
}
