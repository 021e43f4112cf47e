//! Runs a single hacluster relation operation from within a Juju hook
//!
//! The binary is invoked once per hook or principal action; all state that
//! must survive between invocations is kept in a unit-local state file

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

use config::parse_command_line_args;
use hook_runner::run_command;
use relation::{HaClusterRequires, hook_tools::HookToolStore};
use state::FileKv;
use tracing::{debug, error};
use util::{err_str, logging::setup_system_logger};

fn main() -> Result<(), String> {
    let config = parse_command_line_args()?;
    setup_system_logger(config.log_level, config.json_logs);
    debug!(command = ?config.command, state_path = %config.state_path.display(), "starting hook runner");

    let kv = FileKv::open(&config.state_path).map_err(err_str!(String::from))?;
    let store = HookToolStore::new(&config.relation_name, kv);
    let mut adapter = HaClusterRequires::new(store)?;

    let outcome = run_command(&mut adapter, &config).inspect_err(|e| error!("{e}"))?;
    std::process::exit(outcome.exit_code())
}
