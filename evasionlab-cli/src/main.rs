mod cli;
mod logger;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logging(cli.log_json);

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => cli::demo_command(),
        Commands::Encode {
            payload,
            method,
            decode,
            key,
            chain,
        } => cli::encode_command(&payload, &method, decode, key, &chain),
        Commands::Obfuscate {
            payload,
            methods,
            seed,
            concat,
        } => cli::obfuscate_command(&payload, &methods, seed, concat),
        Commands::Detect { payload } => cli::detect_command(&payload),
        Commands::Compare {
            original,
            transformed,
        } => cli::compare_command(&original, &transformed),
        Commands::Analyze {
            payload,
            config,
            output,
            format,
        } => cli::analyze_command(&payload, config, output, format),
    }
}
