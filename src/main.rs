use clap::Parser;
use mutspec::{cli, commands};

fn main() {
    let args = cli::Args::parse();

    let result = match args.command {
        cli::Commands::Extract(args) => commands::extract::run(args),
        cli::Commands::Cluster(args) => commands::cluster::run(args),
        cli::Commands::LabelTree(args) => commands::label_tree::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
