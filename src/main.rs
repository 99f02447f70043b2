use std::process::ExitCode;

use anyhow::Result;

use engine::{Engine, EngineConfig};

fn run() -> Result<()> {
    let engine = Engine::new(EngineConfig::default())?;
    engine.run()
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
