//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;

use crate::commands::check::CheckArgs;
use crate::commands::compile::{CompileArgs, OutputFormat};

pub struct CompileParams {
    pub schema_path: PathBuf,
    pub plan_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub collection: Option<String>,
    pub diagnostics: bool,
    pub format: OutputFormat,
}

impl CompileParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            schema_path: required_path(m, "schema_path"),
            plan_path: required_path(m, "plan_path"),
            config_path: m.get_one::<PathBuf>("config_path").cloned(),
            collection: m.get_one::<String>("collection").cloned(),
            diagnostics: m.get_flag("diagnostics"),
            format: parse_format(m),
        }
    }
}

impl From<CompileParams> for CompileArgs {
    fn from(p: CompileParams) -> Self {
        Self {
            schema_path: p.schema_path,
            plan_path: p.plan_path,
            config_path: p.config_path,
            collection: p.collection,
            diagnostics: p.diagnostics,
            format: p.format,
        }
    }
}

pub struct CheckParams {
    pub schema_path: PathBuf,
    pub plan_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub collection: Option<String>,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            schema_path: required_path(m, "schema_path"),
            plan_path: required_path(m, "plan_path"),
            config_path: m.get_one::<PathBuf>("config_path").cloned(),
            collection: m.get_one::<String>("collection").cloned(),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            schema_path: p.schema_path,
            plan_path: p.plan_path,
            config_path: p.config_path,
            collection: p.collection,
        }
    }
}

fn required_path(m: &ArgMatches, id: &str) -> PathBuf {
    m.get_one::<PathBuf>(id)
        .cloned()
        .unwrap_or_else(|| unreachable!("clap enforces required `{id}`"))
}

fn parse_format(m: &ArgMatches) -> OutputFormat {
    match m.get_one::<String>("format").map(|s| s.as_str()) {
        Some("dump") => OutputFormat::Dump,
        _ => OutputFormat::Json,
    }
}
