use std::fs;
use std::path::{Path, PathBuf};
use wasmstep::{Instance, Program};

/// Loads a JSON program document and instantiates it.
pub fn load_program(path: &Path) -> Result<Instance, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read program file {}: {}", path.display(), e))?;
    let program = Program::from_json(&text)
        .map_err(|e| format!("Failed to parse program {}: {}", path.display(), e))?;
    let instance = program.instantiate()
        .map_err(|e| format!("Failed to instantiate program {}: {}", path.display(), e))?;
    Ok(instance)
}

/// Loads a program shipped under src/bin/resources
#[allow(dead_code)]
pub fn load_resource_program(name: &str) -> Result<Instance, Box<dyn std::error::Error>> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("src/bin/resources")
        .join(format!("{}.json", name));
    load_program(&path)
}
