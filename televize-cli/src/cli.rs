use clap::{Parser, Subcommand, ValueEnum};
use ct_platforms::QualitySelector;

#[derive(Parser, Debug)]
#[command(
    name = "televize",
    author,
    version,
    about = "Watch Czech Television live channels and archive in your own player",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Player command line; the media is piped to its standard input
    #[arg(
        short,
        long,
        global = true,
        env = "TELEVIZE_PLAYER",
        default_value = "mpv -"
    )]
    pub player: String,

    /// Stream quality: min, max, a variant index, or a resolution such as 720p
    #[arg(long, global = true, env = "TELEVIZE_QUALITY", default_value = "max")]
    pub quality: QualitySelector,

    /// How segments reach the player
    #[arg(long, value_enum, global = true, default_value_t = OutputMode::Feed)]
    pub output: OutputMode,

    /// Reject manifests carrying unknown directives
    #[arg(long, global = true)]
    pub strict: bool,

    /// Request timeout in seconds (0 disables it)
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List live channels
    Channels,

    /// Play a live channel
    Live {
        /// Channel slug, see `televize channels`
        channel: String,
    },

    /// Play an archived programme
    Episode {
        /// Programme page URL or numeric item id
        target: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Download segments and feed their bytes to the player's standard input
    Feed,
    /// Print segment URLs to standard output
    Print,
    /// Hand the manifest URL to the player as its last argument
    Direct,
}
