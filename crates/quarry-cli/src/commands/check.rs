use std::path::PathBuf;

use super::loader::LoadError;
use super::run_common::Workspace;

pub struct CheckArgs {
    pub schema_path: PathBuf,
    pub plan_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub collection: Option<String>,
}

pub fn run(args: CheckArgs) {
    if let Err(e) = check(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    // Silent on success (like cargo check)
}

/// Load the schema, replay the plan and compile, discarding the output.
pub fn check(args: &CheckArgs) -> Result<(), LoadError> {
    let workspace = Workspace::load(
        &args.schema_path,
        &args.plan_path,
        args.config_path.as_deref(),
        args.collection.as_deref(),
    )?;
    workspace.compile()?;
    Ok(())
}
