//! Parsing logic for the hook runner config

use std::{env, str::FromStr};

use clap::Parser;
use util::{err_str, logging::LevelFilter};

use crate::{AdapterConfig, Cli, parsing::config_file::config_file_args};

pub mod config_file;

/// Parses command line args into the runner config
///
/// Options may come from both a config file and the command line. The config
/// file args are placed before the command line args and the CLI is parsed
/// with `args_override_self`, so that explicit flags take precedence
pub fn parse_command_line_args() -> Result<AdapterConfig, String> {
    // The first argument is the executable name and must stay first
    let mut command_line_args: Vec<String> = env::args().collect();
    let config_file_args = config_file_args(&command_line_args)?;

    let mut full_args = vec![command_line_args.remove(0)];
    full_args.extend(config_file_args);
    full_args.extend(command_line_args);

    let cli = Cli::parse_from(full_args);
    parse_config_from_args(cli)
}

/// Parse the config from a set of command line arguments
///
/// Separating out this functionality allows us to easily inject custom args
/// apart from what is specified on the command line
pub fn parse_config_from_args(cli_args: Cli) -> Result<AdapterConfig, String> {
    let log_level = LevelFilter::from_str(&cli_args.log_level).map_err(err_str!(String::from))?;
    if cli_args.relation_name.is_empty() {
        return Err("relation name must not be empty".to_string());
    }

    Ok(AdapterConfig {
        relation_name: cli_args.relation_name,
        state_path: cli_args.state_path,
        bind_iface: cli_args.bind_iface.filter(|iface| !iface.is_empty()),
        mcastport: cli_args.mcastport,
        log_level,
        json_logs: cli_args.json_logs,
        command: cli_args.command,
    })
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;
    use common::types::DEFAULT_MCASTPORT;

    use crate::Command;

    /// Parse a config from the given args
    fn parse(args: &[&str]) -> Result<AdapterConfig, String> {
        let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
        parse_config_from_args(cli)
    }

    /// Tests the defaults of a minimal invocation
    #[test]
    fn test_defaults() {
        let config = parse(&["hacluster-hooks", "bind-resources"]).unwrap();
        assert_eq!(config.relation_name, "ha");
        assert_eq!(config.state_path, PathBuf::from(".hacluster-state.json"));
        assert_eq!(config.bind_iface, None);
        assert_eq!(config.mcastport, DEFAULT_MCASTPORT);
        assert_eq!(config.log_level, LevelFilter::INFO);
        assert!(!config.json_logs);
        assert_eq!(config.command, Command::BindResources);
    }

    /// Tests parsing the subcommands and their flags
    #[test]
    fn test_subcommands() {
        let config = parse(&[
            "hacluster-hooks",
            "add-vip",
            "nova",
            "10.0.0.10",
            "--iface",
            "eth0",
            "--netmask",
            "24",
        ])
        .unwrap();
        assert_eq!(
            config.command,
            Command::AddVip {
                name: "nova".to_string(),
                vip: "10.0.0.10".to_string(),
                iface: Some("eth0".to_string()),
                netmask: Some("24".to_string()),
            }
        );

        let config =
            parse(&["hacluster-hooks", "add-init-service", "nova", "nova-api", "--no-clone"]).unwrap();
        assert_eq!(
            config.command,
            Command::AddInitService {
                name: "nova".to_string(),
                service: "nova-api".to_string(),
                no_clone: true,
            }
        );

        let config = parse(&["hacluster-hooks", "hook", "ha-relation-joined"]).unwrap();
        assert_eq!(config.command, Command::Hook { hook_name: "ha-relation-joined".to_string() });
    }

    /// Tests that an unknown log level is rejected
    #[test]
    fn test_invalid_log_level() {
        let res = parse(&["hacluster-hooks", "--log-level", "chatty", "is-clustered"]);
        assert!(res.is_err());
    }

    /// Tests that an empty bind interface is treated as unset
    #[test]
    fn test_empty_bind_iface() {
        let config = parse(&["hacluster-hooks", "--bind-iface", "", "bind-resources"]).unwrap();
        assert_eq!(config.bind_iface, None);
    }
}
