use anyhow::Result;
use cambrium_core::init_env_logging;
use cambrium_lib::cli::{self, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_env_logging("warn");

    let mut stdout = std::io::stdout().lock();
    cli::run(args, &mut stdout).await
}
