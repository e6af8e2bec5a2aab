//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("quarry")
        .about("Compile and check search query plans offline")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_arg())
        .subcommand(compile_command())
        .subcommand(check_command())
}

/// Compile a plan and print the parameter map.
pub fn compile_command() -> Command {
    Command::new("compile")
        .about("Compile a query plan into backend parameters")
        .override_usage(
            "\
  quarry compile <SCHEMA> <PLAN>
  quarry compile <SCHEMA> <PLAN> -c <NAME> [--diagnostics] [--format dump]",
        )
        .after_help(
            r#"EXAMPLES:
  quarry compile schema.json plan.json               # wire parameters as JSON
  quarry compile schema.json plan.json --format dump # key=value lines
  quarry compile schema.json plan.json --diagnostics # include `_` keys
  quarry compile schema.json plan.json -c brands     # override collection"#,
        )
        .arg(schema_path_arg())
        .arg(plan_path_arg())
        .arg(config_path_arg())
        .arg(collection_arg())
        .arg(diagnostics_arg())
        .arg(format_arg())
}

/// Validate a plan without printing anything.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Validate a query plan against a schema")
        .override_usage(
            "\
  quarry check <SCHEMA> <PLAN>
  quarry check <SCHEMA> <PLAN> -c <NAME>",
        )
        .arg(schema_path_arg())
        .arg(plan_path_arg())
        .arg(config_path_arg())
        .arg(collection_arg())
}
