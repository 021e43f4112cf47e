//! Parsing logic for a separate runner config file
//!
//! Each top-level TOML key becomes a `--key` flag, e.g.
//! `mcastport = 5405` becomes `--mcastport 5405`

use std::fs;

use toml::{Value, map::Map};
use tracing::debug;
use util::err_str;

/// The CLI argument name for the config file
const CONFIG_FILE_ARG: &str = "--config-file";

/// Parse args from a config file, if one is given on the command line
pub(crate) fn config_file_args(cli_args: &[String]) -> Result<Vec<String>, String> {
    let Some(index) = cli_args.iter().position(|arg| arg == CONFIG_FILE_ARG) else {
        return Ok(vec![]);
    };

    let path = cli_args
        .get(index + 1)
        .ok_or_else(|| format!("{CONFIG_FILE_ARG} requires a path"))?;
    read_config_file(path)
}

/// Parse a config file into CLI-style args
fn read_config_file(path: &str) -> Result<Vec<String>, String> {
    debug!(path, "reading config file");
    let file_contents = fs::read_to_string(path).map_err(err_str!(String::from))?;
    let config_kv_pairs: Map<_, _> = toml::from_str(&file_contents).map_err(err_str!(String::from))?;

    let mut config_file_args: Vec<String> = Vec::with_capacity(config_kv_pairs.len());
    for (toml_key, value) in config_kv_pairs.iter() {
        let cli_arg = format!("--{toml_key}");
        config_file_args.extend(parse_toml_value(cli_arg, value)?);
    }

    Ok(config_file_args)
}

// ----------------
// | TOML Parsing |
// ----------------

/// Parse a toml value into a list of strings to append to the CLI args
fn parse_toml_value(cli_arg: String, val: &Value) -> Result<Vec<String>, String> {
    match val {
        Value::Boolean(b) => Ok(toml_boolean_to_args(cli_arg, *b)),
        Value::Array(arr) => toml_array_to_args(&cli_arg, arr),
        x => Ok(vec![cli_arg, toml_value_to_string(x)?]),
    }
}

/// Parse a toml boolean into CLI args
///
/// This will be "--key" if the boolean is true, otherwise it will be empty
fn toml_boolean_to_args(cli_arg: String, b: bool) -> Vec<String> {
    if b { vec![cli_arg] } else { vec![] }
}

/// Parse a toml array into CLI args, i.e. "--arg val1 --arg val2"
fn toml_array_to_args(cli_arg: &str, arr: &[Value]) -> Result<Vec<String>, String> {
    let mut res: Vec<String> = Vec::with_capacity(arr.len() * 2);
    for val in arr.iter() {
        res.push(cli_arg.to_string());
        res.push(toml_value_to_string(val)?);
    }

    Ok(res)
}

/// Convert a scalar toml value to a string
fn toml_value_to_string(val: &Value) -> Result<String, String> {
    Ok(match val {
        Value::String(val) => val.clone(),
        Value::Integer(val) => val.to_string(),
        Value::Float(val) => val.to_string(),
        Value::Boolean(val) => val.to_string(),
        other => return Err(format!("unsupported config value: {other}")),
    })
}
