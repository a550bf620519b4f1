use clap::{Args, Parser, Subcommand};
use encinit::engine::{ConfigOverrides, Rational, UsageProfile};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "encinit")]
#[command(
    about = "Resolve a codec, derive its config, then init and destroy an encoder session",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Log engine activity to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Options for the default lifecycle run
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Codec kind to resolve (e.g., baseline, vp8, vp9)
    #[arg(long, value_name = "KIND")]
    pub codec: Option<String>,

    /// Usage profile: good, realtime or best
    #[arg(long, value_name = "PROFILE")]
    pub usage: Option<UsageProfile>,

    /// Frame width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Frame rate; sets the timebase to 1/FPS
    #[arg(long, conflicts_with = "timebase")]
    pub fps: Option<u32>,

    /// Explicit timebase as NUM/DEN
    #[arg(long, value_name = "NUM/DEN")]
    pub timebase: Option<Rational>,

    /// Target bitrate in kbps
    #[arg(long, value_name = "KBPS")]
    pub bitrate: Option<u32>,

    /// Look-ahead depth in frames
    #[arg(long)]
    pub lag_in_frames: Option<u32>,

    /// Encoder worker threads
    #[arg(long)]
    pub threads: Option<u32>,

    /// Cap on the encoder frame pool, in MiB
    #[arg(long, value_name = "MIB")]
    pub memory_limit_mb: Option<u64>,

    /// Submit this many placeholder frames between init and destroy
    #[arg(long, default_value_t = 0)]
    pub frames: u64,

    /// TOML config file layered under the command-line flags
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Overrides given on the command line
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            width: self.width,
            height: self.height,
            timebase: self.timebase.or(self.fps.map(Rational::per_second)),
            target_bitrate_kbps: self.bitrate,
            usage: self.usage,
            lag_in_frames: self.lag_in_frames,
            threads: self.threads,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every codec in the capability table
    ListCodecs,

    /// Show the baseline config for a codec and usage profile
    ShowDefaults {
        /// Codec kind to resolve
        #[arg(long, default_value = "baseline")]
        codec: String,

        /// Usage profile: good, realtime or best
        #[arg(long, default_value = "realtime")]
        usage: UsageProfile,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in config as TOML (redirect to create a config file)
    PrintConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_becomes_timebase() {
        let cli = Cli::try_parse_from(["encinit", "--fps", "25", "--width", "0"]).unwrap();
        let overrides = cli.run.overrides();
        assert_eq!(overrides.timebase, Some(Rational::new(1, 25)));
        assert_eq!(overrides.width, Some(0));
        assert_eq!(overrides.height, None);
    }

    #[test]
    fn test_fps_conflicts_with_timebase() {
        assert!(Cli::try_parse_from(["encinit", "--fps", "25", "--timebase", "1/30"]).is_err());
    }

    #[test]
    fn test_usage_is_parsed() {
        let cli = Cli::try_parse_from(["encinit", "--usage", "best"]).unwrap();
        assert_eq!(cli.run.usage, Some(UsageProfile::BestQuality));
        assert_eq!(cli.run.overrides().usage, Some(UsageProfile::BestQuality));
        assert!(Cli::try_parse_from(["encinit", "--usage", "fastest"]).is_err());
    }

    #[test]
    fn test_subcommand_with_verbose() {
        let cli = Cli::try_parse_from(["encinit", "show-defaults", "--codec", "vp9", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Some(Commands::ShowDefaults { ref codec, json: false, .. }) if codec == "vp9"
        ));
    }
}
