mod cli;
mod commands;
mod tracing_setup;

use cli::{CheckParams, CompileParams, build_cli};

fn main() {
    let matches = build_cli().get_matches();
    tracing_setup::init_subscriber(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("compile", m)) => {
            let params = CompileParams::from_matches(m);
            commands::compile::run(params.into());
        }
        Some(("check", m)) => {
            let params = CheckParams::from_matches(m);
            commands::check::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
