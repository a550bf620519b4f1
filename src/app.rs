use crate::cli::{Cli, Commands, RunArgs};
use anyhow::Result;
use encinit::config::Config;
use encinit::engine::report::{self, Stage};
use encinit::engine::{
    self, Availability, ConfigOverrides, EncoderError, EncoderSession, RawFrame, SoftwareBackend,
    Teardown, UsageProfile,
};
use std::process;
use tracing::Level;

/// Install the stderr log subscriber; silent unless `-v` was given
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => return,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) {
    // Handle subcommands first
    if let Some(command) = cli.command {
        match command {
            Commands::ListCodecs => handle_list_codecs(),
            Commands::ShowDefaults { codec, usage, json } => {
                handle_show_defaults(&codec, usage, json)
            }
            Commands::PrintConfig => handle_print_config(),
        }
        return;
    }

    handle_lifecycle(&cli.run);
}

/// Everything one lifecycle run needs, after layering config sources
#[derive(Debug, Clone, PartialEq)]
struct RunPlan {
    codec: String,
    usage: UsageProfile,
    overrides: ConfigOverrides,
    memory_limit_bytes: Option<u64>,
    frames: u64,
}

impl RunPlan {
    /// Built-in reference values < config file < command-line flags
    fn new(args: &RunArgs, file: Config) -> Self {
        let overrides = Config::reference()
            .encoder
            .merge(file.encoder)
            .merge(args.overrides());
        let memory_limit_bytes = match args.memory_limit_mb {
            Some(mb) => Some(mb.saturating_mul(1024 * 1024)),
            None => file.limits.memory_limit_bytes(),
        };

        // One profile drives both the baseline lookup and the final config
        let usage = overrides.usage.unwrap_or(file.defaults.usage);

        Self {
            codec: args.codec.clone().unwrap_or(file.defaults.codec),
            usage,
            overrides,
            memory_limit_bytes,
            frames: args.frames,
        }
    }

    fn backend(&self) -> SoftwareBackend {
        match self.memory_limit_bytes {
            Some(bytes) => SoftwareBackend::with_memory_limit(bytes),
            None => SoftwareBackend::new(),
        }
    }
}

/// A failed run: where it stopped and why
#[derive(Debug)]
struct Failure {
    stage: Stage,
    error: EncoderError,
}

fn at(stage: Stage) -> impl FnOnce(EncoderError) -> Failure {
    move |error| Failure { stage, error }
}

fn load_config(args: &RunArgs) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load_from(path),
        None => Ok(Config::default()),
    }
}

fn handle_lifecycle(args: &RunArgs) {
    let file = match load_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let plan = RunPlan::new(args, file);
    if let Err(failure) = run_lifecycle(&plan) {
        for line in report::diagnostics(failure.stage, &failure.error) {
            eprintln!("{}", line);
        }
        process::exit(failure.error.code().exit_status());
    }
}

/// resolve -> default config -> overrides -> init -> (frames) -> destroy.
///
/// The session is dropped before this returns, so every early exit after a
/// successful init still releases the encoder.
fn run_lifecycle(plan: &RunPlan) -> Result<(), Failure> {
    let interface = engine::resolve(&plan.codec).map_err(at(Stage::Resolve))?;
    let base = engine::get_default(&interface, plan.usage).map_err(at(Stage::Configure))?;
    let config = engine::apply_overrides(base, &plan.overrides);
    println!("{}", config.summary_line());

    let mut session = EncoderSession::with_backend(plan.backend());
    session.init(&interface, config).map_err(at(Stage::Init))?;
    println!("Encoder initialized successfully!");

    if plan.frames > 0 {
        for pts in 0..plan.frames {
            let frame = RawFrame {
                width: config.width,
                height: config.height,
                pts,
            };
            session.encode(&frame).map_err(at(Stage::Encode))?;
        }
        println!("Submitted {} frames.", session.frames_submitted());
    }

    match session.destroy() {
        Teardown::Released => {
            println!("Encoder destroyed.");
            Ok(())
        }
        Teardown::NoOp => Err(Failure {
            stage: Stage::Destroy,
            error: EncoderError::IllegalState {
                operation: "destroy",
                state: session.state(),
            },
        }),
    }
}

fn handle_list_codecs() {
    println!(
        "{:<10} {:<6} {:<4} {:>9} {:>12}  {:<20} STATUS",
        "KIND", "FAMILY", "ABI", "MAX DIM", "MAX KBPS", "USAGES"
    );
    for caps in engine::capability_table() {
        let usages = caps
            .usages
            .iter()
            .map(|u| u.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let status = match caps.availability {
            Availability::Full => "available".to_string(),
            Availability::Partial(reason) => format!("partial: {}", reason),
        };
        println!(
            "{:<10} {:<6} {:<4} {:>9} {:>12}  {:<20} {}",
            caps.kind,
            caps.family.display_name(),
            caps.abi_version,
            caps.max_dimension,
            caps.max_bitrate_kbps,
            usages,
            status
        );
    }
}

fn handle_show_defaults(codec: &str, usage: UsageProfile, json: bool) {
    let defaults = engine::resolve(codec)
        .map_err(at(Stage::Resolve))
        .and_then(|iface| engine::get_default(&iface, usage).map_err(at(Stage::Configure)));

    let config = match defaults {
        Ok(config) => config,
        Err(failure) => {
            for line in report::diagnostics(failure.stage, &failure.error) {
                eprintln!("{}", line);
            }
            process::exit(failure.error.code().exit_status());
        }
    };

    if json {
        match serde_json::to_string_pretty(&config) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", config.summary_line());
        println!(
            "Usage={}, LagInFrames={}, Threads={}",
            config.usage, config.lag_in_frames, config.threads
        );
    }
}

fn handle_print_config() {
    match Config::reference().to_toml_string() {
        Ok(text) => print!("{}", text),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use encinit::engine::{ErrorCode, Rational};

    fn args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["encinit"];
        full.extend_from_slice(argv);
        Cli::try_parse_from(full).unwrap().run
    }

    #[test]
    fn test_plan_defaults_to_reference_run() {
        let plan = RunPlan::new(&args(&[]), Config::default());
        assert_eq!(plan.codec, "baseline");
        assert_eq!(plan.usage, UsageProfile::Realtime);
        assert_eq!(plan.overrides.width, Some(640));
        assert_eq!(plan.overrides.height, Some(480));
        assert_eq!(plan.overrides.timebase, Some(Rational::new(1, 30)));
        assert_eq!(plan.overrides.target_bitrate_kbps, Some(1000));
        assert_eq!(plan.memory_limit_bytes, None);
        assert_eq!(plan.frames, 0);
    }

    #[test]
    fn test_plan_layers_file_under_flags() {
        let mut file = Config::default();
        file.defaults.codec = "vp9".to_string();
        file.encoder.width = Some(1280);
        file.encoder.height = Some(720);
        file.limits.memory_limit_mb = Some(256);

        let plan = RunPlan::new(&args(&["--width", "1920", "--memory-limit-mb", "1"]), file);
        assert_eq!(plan.codec, "vp9");
        assert_eq!(plan.overrides.width, Some(1920));
        assert_eq!(plan.overrides.height, Some(720));
        assert_eq!(plan.overrides.target_bitrate_kbps, Some(1000));
        assert_eq!(plan.memory_limit_bytes, Some(1024 * 1024));
    }

    #[test]
    fn test_plan_usage_precedence() {
        let mut file = Config::default();
        file.defaults.usage = UsageProfile::BestQuality;
        let plan = RunPlan::new(&args(&[]), file.clone());
        assert_eq!(plan.usage, UsageProfile::BestQuality);

        // [encoder] usage is the more specific file setting
        file.encoder.usage = Some(UsageProfile::Realtime);
        let plan = RunPlan::new(&args(&[]), file.clone());
        assert_eq!(plan.usage, UsageProfile::Realtime);
        assert_eq!(plan.overrides.usage, Some(UsageProfile::Realtime));

        let plan = RunPlan::new(&args(&["--usage", "good"]), file);
        assert_eq!(plan.usage, UsageProfile::GoodQuality);
        assert_eq!(plan.overrides.usage, Some(UsageProfile::GoodQuality));
    }

    #[test]
    fn test_usage_flag_beats_file_encoder_usage() {
        let mut file = Config::default();
        file.encoder.usage = Some(UsageProfile::Realtime);
        let plan = RunPlan::new(&args(&["--usage", "good"]), file);
        assert!(run_lifecycle(&plan).is_ok());
    }

    #[test]
    fn test_reference_run_succeeds() {
        let plan = RunPlan::new(&args(&["--frames", "3"]), Config::default());
        assert!(run_lifecycle(&plan).is_ok());
    }

    #[test]
    fn test_zero_width_fails_at_init() {
        let plan = RunPlan::new(&args(&["--width", "0"]), Config::default());
        let failure = run_lifecycle(&plan).unwrap_err();
        assert_eq!(failure.stage, Stage::Init);
        assert_eq!(failure.error.code(), ErrorCode::InvalidParam);
    }

    #[test]
    fn test_unknown_codec_fails_at_resolve() {
        let plan = RunPlan::new(&args(&["--codec", "nonexistent"]), Config::default());
        let failure = run_lifecycle(&plan).unwrap_err();
        assert_eq!(failure.stage, Stage::Resolve);
        assert_eq!(failure.error.code(), ErrorCode::NotSupported);
    }

    #[test]
    fn test_memory_limit_fails_at_init() {
        let plan = RunPlan::new(&args(&["--memory-limit-mb", "0"]), Config::default());
        let failure = run_lifecycle(&plan).unwrap_err();
        assert_eq!(failure.stage, Stage::Init);
        assert_eq!(failure.error.code(), ErrorCode::MemoryAllocationFailure);
    }
}
