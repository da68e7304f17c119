use std::process::exit;

use colored::Colorize;

#[tokio::main]
async fn main() {
    if let Err(error) = cardsift::app::run().await {
        eprintln!("{} {error}", "error:".bold().red());
        exit(1);
    }
}
