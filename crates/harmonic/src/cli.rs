use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use settings::{ColorSpaceSetting, HapticsMode};

#[derive(Parser, Debug)]
#[command(
    name = "harmonic",
    author,
    version,
    about = "Full-screen harmonic color effect that reacts to press and hold",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Configuration file to load instead of `<config dir>/harmonic.toml`.
    #[arg(long, value_name = "FILE", env = "HARMONIC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// GLSL file defining `harmonicColorEffect`; defaults to the bundled effect.
    #[arg(long, value_name = "FILE")]
    pub shader: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Open a borderless fullscreen window.
    #[arg(long)]
    pub fullscreen: bool,

    /// Pin the animation clock at SECONDS; presses still animate amplitude.
    #[arg(long, value_name = "SECONDS", value_parser = parse_still_time)]
    pub still: Option<f32>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceSetting>,

    /// Feedback on press start: `log`, `bell`, or `off`.
    #[arg(long, value_name = "MODE", value_parser = parse_haptics_mode)]
    pub haptics: Option<HapticsMode>,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    pub no_vsync: bool,

    /// Length of the press/release transition (e.g. `300ms`, `0.5s`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub transition: Option<Duration>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect and validate the configuration file.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved config directory and file.
    Where,
    /// Print the effective settings as JSON.
    Show,
    /// Validate a configuration file (defaults to the active one).
    Check {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_still_time(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid still time '{value}'; expected seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err("still time must be a non-negative number of seconds".into());
    }
    Ok(seconds)
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceSetting, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "auto" => Ok(ColorSpaceSetting::Auto),
        "gamma" | "srgb-off" => Ok(ColorSpaceSetting::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceSetting::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

pub fn parse_haptics_mode(value: &str) -> Result<HapticsMode, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "log" => Ok(HapticsMode::Log),
        "bell" => Ok(HapticsMode::Bell),
        "off" | "none" => Ok(HapticsMode::Off),
        other => Err(format!(
            "unknown haptics mode '{other}'; expected log, bell, or off"
        )),
    }
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err("duration must be non-negative".into());
        }
        return Duration::try_from_secs_f64(seconds)
            .map_err(|err| format!("invalid duration '{trimmed}': {err}"));
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{trimmed}': {err}"))
}
