use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stashbot")]
#[command(author, version, about = "Telegram bots for group file storage and Terabox relays", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the group file-storage bot (default)
    Storage,

    /// Run the Terabox relay bot
    Terabox,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
