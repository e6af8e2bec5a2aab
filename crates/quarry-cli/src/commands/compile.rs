use std::path::PathBuf;

use super::loader::LoadError;
use super::run_common::Workspace;

/// How compiled parameters are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Dump,
}

pub struct CompileArgs {
    pub schema_path: PathBuf,
    pub plan_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub collection: Option<String>,
    pub diagnostics: bool,
    pub format: OutputFormat,
}

pub fn run(args: CompileArgs) {
    match render(&args) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// Compile the plan and render the parameter map.
pub fn render(args: &CompileArgs) -> Result<String, LoadError> {
    let workspace = Workspace::load(
        &args.schema_path,
        &args.plan_path,
        args.config_path.as_deref(),
        args.collection.as_deref(),
    )?;
    let mut params = workspace.compile()?;
    if !args.diagnostics {
        let keys: Vec<String> = params.diagnostics().keys().map(|k| k.to_string()).collect();
        for key in keys {
            params.remove(&key);
        }
    }
    match args.format {
        OutputFormat::Dump => Ok(params.dump()),
        OutputFormat::Json => serde_json::to_string_pretty(&params).map_err(LoadError::Render),
    }
}
