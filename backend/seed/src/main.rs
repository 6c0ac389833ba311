use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON array of recipes
    file: PathBuf,

    /// Author of the loaded recipes, created when missing
    username: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    seed::load_recipes(&args.file, &args.username).await
}
