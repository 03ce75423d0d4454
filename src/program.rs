use std::collections::HashMap;

use serde::Deserialize;

use crate::debug_println;
use crate::error::*;
use crate::function::Function;
use crate::instance::Instance;
use crate::instruction::Instruction;
use crate::value::{ValType, Value};

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValueJSON {
    pub r#type: String,
    pub value: String,
}

impl ValueJSON {
    pub fn to_value(&self) -> Result<Value, Error> {
        Value::parse(self.r#type.parse::<ValType>()?, &self.value)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct FunctionJSON {
    pub name: Option<String>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub locals: Vec<String>,
    pub body: Vec<String>,
}

/// Program document: globals plus functions with textual bodies.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Program {
    #[serde(default)]
    pub globals: Vec<ValueJSON>,
    #[serde(default)]
    pub functions: Vec<FunctionJSON>,
}

fn types(names: &[String]) -> Result<Vec<ValType>, Error> {
    names.iter().map(|n| n.parse::<ValType>()).collect()
}

impl Program {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|_e| {
            debug_println!("[program] {}", _e);
            Error::Malformed(INVALID_JSON)
        })
    }

    /// Builds an instance holding every global and function, exporting named functions.
    pub fn instantiate(&self) -> Result<Instance, Error> {
        let names: HashMap<&str, u32> = self.functions.iter().enumerate()
            .filter_map(|(i, f)| f.name.as_deref().map(|n| (n, i as u32)))
            .collect();

        let mut inst = Instance::new();
        for g in &self.globals {
            inst.add_global(g.to_value()?);
        }
        for f in &self.functions {
            let body = f.body.iter()
                .map(|line| parse_line(line, &names))
                .collect::<Result<Vec<_>, _>>()?;
            let idx = inst.add_function(Function::new(types(&f.params)?, types(&f.results)?, types(&f.locals)?, body));
            if let Some(name) = &f.name {
                inst.export(name.clone(), idx)?;
            }
        }
        Ok(inst)
    }
}

/// Parses one body line; `call` also accepts a function name.
fn parse_line(line: &str, names: &HashMap<&str, u32>) -> Result<Instruction, Error> {
    let mut tokens = line.split_whitespace();
    if let (Some("call"), Some(target), None) = (tokens.next(), tokens.next(), tokens.next()) {
        if target.parse::<u32>().is_err() {
            let target = target.trim_start_matches('$');
            return names.get(target).map(|&i| Instruction::Call(i)).ok_or(Error::Malformed(UNKNOWN_FUNC_NAME));
        }
    }
    line.parse()
}
