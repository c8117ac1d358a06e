use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use eagerlink::Options;

#[derive(Parser)]
#[command(name = "eagerlink")]
#[command(about = "Patch a class's initializer to eagerly resolve external references")]
#[command(version)]
struct Cli {
    /// Directory containing the compiled .class files
    #[arg(value_name = "CLASS_ROOT")]
    class_root: PathBuf,

    /// Entry class, dotted or internal form (com.example.Main or com/example/Main)
    #[arg(value_name = "ENTRY_CLASS")]
    entry: String,

    /// Suppress per-class progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet { Level::ERROR } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    eagerlink::run(&Options { class_root: cli.class_root, entry: cli.entry })?;
    Ok(())
}
