//! Shared argument builders for CLI commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Schema document (positional).
pub fn schema_path_arg() -> Arg {
    Arg::new("schema_path")
        .value_name("SCHEMA")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Schema JSON with collections, attributes, joins and scopes")
}

/// Plan document (positional).
pub fn plan_path_arg() -> Arg {
    Arg::new("plan_path")
        .value_name("PLAN")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Plan JSON: a list of chainer steps")
}

/// Config document (--config).
pub fn config_path_arg() -> Arg {
    Arg::new("config_path")
        .long("config")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Config JSON (environment overrides still apply)")
}

/// Target collection (-c/--collection).
pub fn collection_arg() -> Arg {
    Arg::new("collection")
        .short('c')
        .long("collection")
        .value_name("NAME")
        .help("Collection to query (overrides the plan's `collection`)")
}

/// Keep diagnostic keys (--diagnostics).
pub fn diagnostics_arg() -> Arg {
    Arg::new("diagnostics")
        .long("diagnostics")
        .action(ArgAction::SetTrue)
        .help("Keep diagnostic `_` keys in the output")
}

/// Output format (--format).
pub fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .value_name("FORMAT")
        .default_value("json")
        .value_parser(["json", "dump"])
        .help("Output format")
}

/// Debug logging (-v/--verbose).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Log compile activity to stderr")
}
