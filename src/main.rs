use clap::Parser;
use mkcert::utils::{logger, validation::Validate};
use mkcert::{CliConfig, MkcertEngine};

fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    let mut engine = match MkcertEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("initialization failed: {}", e);
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = engine.run() {
        tracing::error!("{}", e);
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
