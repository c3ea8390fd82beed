use clap::Parser;
use console::style;

use filingrag::RagError;
use filingrag::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli::run(cli) {
        eprintln!("{} {err:#}", style("error:").red().bold());
        if let Some(rag) = err.chain().find_map(|e| e.downcast_ref::<RagError>()) {
            eprintln!("  {}", style(rag.remedy()).dim());
        }
        std::process::exit(1);
    }
}
