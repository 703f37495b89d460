//! Applause CLI - headless clap button host
//!
//! Mounts a clap button, presses it, optionally resets it, then runs the
//! frame loop on a virtual clock and prints the final status as one JSON
//! line on stdout. Logs go to stderr; use `RUST_LOG=debug` to follow the
//! effect and timer traffic.

use std::path::PathBuf;

use anyhow::{Context, Result};
use applause_animation::{AnimationTarget, Particle, Property, Shape};
use applause_core::{roles, ElementHandle};
use applause_widgets::{ClapButton, ClapConfig};
use clap::Parser;
use serde::Serialize;
use slotmap::SlotMap;

/// Length of one host frame
const FRAME_MS: u64 = 16;

/// Headless clap button host
#[derive(Parser, Debug)]
#[command(name = "applause")]
#[command(about = "Drive a clap button headlessly and report its state")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of clicks on the trigger
    #[arg(long, default_value = "3")]
    claps: u32,

    /// Veto claps after this many clicks, overriding the config
    #[arg(long)]
    limit: Option<u32>,

    /// Reset after clapping
    #[arg(long)]
    reset: bool,

    /// Frames to run after the last interaction
    #[arg(long, default_value = "60")]
    frames: u32,
}

#[derive(Serialize)]
struct Status {
    /// Clicks issued by this run
    presses: u32,
    /// Clicks since the last reset
    times_clapped: u32,
    count: u32,
    total: u64,
    activated: bool,
    busy: bool,
    generation: u64,
    animating: bool,
    elapsed_ms: u64,
}

/// Render target that traces the values it receives
struct TraceTarget;

impl AnimationTarget for TraceTarget {
    fn apply(&mut self, target: ElementHandle, property: Property, value: f32) {
        tracing::trace!(?target, ?property, value, "apply");
    }

    fn burst(&mut self, parent: ElementHandle, shape: Shape, particles: &[Particle]) {
        tracing::trace!(?parent, ?shape, particles = particles.len(), "burst");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let status = run(&args)?;
    tracing::info!(count = status.count, total = status.total, "done");
    println!("{}", serde_json::to_string(&status)?);

    Ok(())
}

fn run(args: &Args) -> Result<Status> {
    let mut config = match &args.config {
        Some(path) => ClapConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClapConfig::default(),
    };
    if args.limit.is_some() {
        config.clap_limit = args.limit;
    }
    config.validate().context("invalid configuration")?;

    let button = ClapButton::builder()
        .config(config)
        .render_target(TraceTarget)
        .build();

    let mut elements: SlotMap<ElementHandle, ()> = SlotMap::with_key();
    for role in roles::REQUIRED {
        button.register_ref(role, elements.insert(()))?;
    }

    for _ in 0..args.claps {
        button.press();
        button.tick(FRAME_MS);
    }
    if args.reset && !button.reset() {
        tracing::info!("reset skipped, nothing changed");
    }
    for _ in 0..args.frames {
        button.tick(FRAME_MS);
    }

    let state = button.state();
    Ok(Status {
        presses: args.claps,
        times_clapped: button.click_tally().count(),
        count: state.count,
        total: state.total,
        activated: state.activated,
        busy: button.is_busy(),
        generation: button.reset_generation(),
        animating: button.is_animating(),
        elapsed_ms: button.now_ms(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(argv: &[&str]) -> Status {
        let args = Args::try_parse_from(std::iter::once("applause").chain(argv.iter().copied())).unwrap();
        run(&args).unwrap()
    }

    #[test]
    fn test_limit_vetoes_extra_presses() {
        let status = run_with(&["--claps", "5", "--limit", "2", "--frames", "0"]);
        assert_eq!(status.presses, 5);
        assert_eq!(status.times_clapped, 5);
        assert_eq!(status.count, 2);
    }

    #[test]
    fn test_reset_clears_times_clapped() {
        let status = run_with(&["--claps", "3", "--reset", "--frames", "1"]);
        assert_eq!(status.presses, 3);
        assert_eq!(status.times_clapped, 0);
        assert_eq!(status.count, 0);
        assert_eq!(status.generation, 1);
        assert!(status.busy);
    }
}
