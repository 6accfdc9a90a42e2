use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "pokedex-api", about = "REST API over a collection of Pokémon records")]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000", env = "POKEDEX_ADDR")]
    pub addr: String,

    /// JSON data file backing the collection. Loaded at startup, rewritten on shutdown.
    /// Without it the collection lives in memory only.
    #[arg(long, env = "POKEDEX_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// JSON array of records inserted when the collection starts empty
    #[arg(long, env = "POKEDEX_SEED")]
    pub seed: Option<PathBuf>,
}
