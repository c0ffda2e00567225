use clap::Parser;
use pegwatch::adapter::inbound::cli::{self, command::Cli};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = cli::execute(cli).await {
        cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
