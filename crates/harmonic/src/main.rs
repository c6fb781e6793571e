mod cli;
mod haptics;
mod paths;
mod run;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cli::{Command, ConfigAction};
use paths::AppPaths;
use renderer::EffectSource;
use run::LoadedSettings;
use serde::Serialize;
use settings::HarmonicConfig;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => {
            handle_config_command(config_cmd.action, cli.config.as_deref())
        }
        None => run::run(cli.config.as_deref(), cli.run),
    }
}

fn handle_config_command(action: ConfigAction, config_override: Option<&Path>) -> Result<()> {
    let paths = AppPaths::discover()?;

    match action {
        ConfigAction::Where => run_config_where(&paths, config_override),
        ConfigAction::Show => run_config_show(&paths, config_override),
        ConfigAction::Check { file } => {
            let target = file
                .or_else(|| config_override.map(Path::to_path_buf))
                .unwrap_or_else(|| paths.config_file());
            run_config_check(&paths, &target)
        }
    }
}

fn run_config_where(paths: &AppPaths, config_override: Option<&Path>) -> Result<()> {
    let active = config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file());
    println!("Configuration:");
    println!("  config dir:  {}", paths.config_dir().display());
    println!(
        "  config file: {} ({})",
        active.display(),
        if active.exists() {
            "present"
        } else {
            "missing, using defaults"
        }
    );
    Ok(())
}

#[derive(Serialize)]
struct ShowReport<'a> {
    source: Option<&'a PathBuf>,
    settings: &'a HarmonicConfig,
}

fn run_config_show(paths: &AppPaths, config_override: Option<&Path>) -> Result<()> {
    let LoadedSettings { settings, source } = run::load_settings(paths, config_override)?;
    let report = ShowReport {
        source: source.as_ref(),
        settings: &settings,
    };
    let json = serde_json::to_string_pretty(&report).context("failed to encode settings")?;
    println!("{json}");
    Ok(())
}

fn run_config_check(paths: &AppPaths, target: &Path) -> Result<()> {
    if !target.exists() {
        bail!("configuration file {} does not exist", target.display());
    }
    let LoadedSettings { settings, .. } = run::load_settings(paths, Some(target))?;

    if let Some(shader) = &settings.shader.path {
        renderer::load_effect(&EffectSource::File(shader.clone()))
            .with_context(|| format!("shader {} is not a usable color effect", shader.display()))?;
    }

    println!("{}: configuration OK", target.display());
    Ok(())
}
