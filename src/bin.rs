use clap::Parser;
use log::error;

use acme::cli::Cli;
use acme::dispatch;
use acme::error::Error;
use acme::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match dispatch::run(cli) {
        Ok(()) => {}
        Err(Error::PrecheckSkip) => {}
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
