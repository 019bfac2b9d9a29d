// estateql - ask about dubai properties in plain english

use estateql::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        // debug format renders the miette report with help text
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
