use std::process;
use clap::Parser;

#[macro_use]
extern crate log;

use anyhow::Result;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;


/// Parse command line arguments and run `pedselect_rs::run()`
fn main() -> Result<()> {
    // ----------------------------- Run CLI Parser
    let cli = parser::Cli::parse();

    // ----------------------------- Init logger.
    let verbosity = if cli.quiet {0} else {cli.verbose + 1};
    logger::Logger::init(verbosity);

    // ----------------------------- Serialize command line arguments
    match cli.serialize() {
        Ok(Some(yaml)) => debug!("Command line arguments serialized into {}", yaml.display()),
        Ok(None)       => (),
        Err(e)         => {
            error!("{:?}", e);
            process::exit(1);
        }
    };

    // ----------------------------- unpack Cli and run the appropriate pipeline stage(s).
    if let Err(e) = pedselect_rs::run(cli) {
        error!("{:?}", e);
        process::exit(1);
    };

    Ok(())
}
