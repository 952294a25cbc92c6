mod cli;
mod gui;

fn main() -> Result<(), eframe::Error> {
    // Check if CLI mode is requested via command line argument
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--cli" {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
        if let Err(e) = cli::run_cli_scenarios() {
            log::error!("CLI scenarios failed: {:#}", e);
            std::process::exit(1);
        }
        Ok(())
    } else {
        gui::run()
    }
}
