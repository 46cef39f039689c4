use clap::{Parser, ValueEnum};
use log::LevelFilter;
use raytracer::config::RenderConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "raytracer")]
#[command(about = "Renders a demo scene with a recursive ray tracer")]
pub struct Args {
    /// TOML render settings, every field falls back to its default
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output PNG path, overrides the config
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Image width in pixels, overrides the config
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: Option<u32>,

    /// Image height in pixels, overrides the config
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: Option<u32>,

    #[arg(long, value_enum, default_value = "info", help = "Set the logging level")]
    pub log_level: LogLevel,
}

impl Args {
    /// Applies the command line overrides on top of a loaded config
    pub fn apply(&self, config: &mut RenderConfig) {
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(width) = self.width {
            config.output.width = width;
        }
        if let Some(height) = self.height {
            config.output.height = height;
        }
    }
}
