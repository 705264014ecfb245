use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file listing the optimizer settings
    /// and the available cases.
    #[arg(long, default_value = "configs.toml")]
    pub config: PathBuf,

    /// Index into the configuration's `[[cases]]` array to run.
    #[arg(long, default_value_t = 0)]
    pub case: usize,
}
