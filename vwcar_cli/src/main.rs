#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `vwcar`: offline driver for the VW translation layer.

mod cli;
mod error_fmt;
mod replay;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};
use vwcar_core::Session;
use vwcar_core::codec::subscriptions::{Subscription, radar_subscriptions};
use vwcar_core::controller::CarControl;
use vwcar_core::mocks::{MemoryParams, NoPlan, SignalSnapshot};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE, Units};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::replay::{ReplayOptions, run_replay};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            eprintln!("warning: could not install Ctrl-C handler: {e}");
        }
    }

    if let Err(err) = run(cli, &shutdown) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

/// Read, parse and validate the config, keeping the TOML error typed.
fn load_config(path: &Path) -> eyre::Result<vwcar_config::Config> {
    let text =
        std::fs::read_to_string(path).wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = vwcar_config::load_toml(&text).map_err(eyre::Report::new)?;
    cfg.validate()?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, logging: &vwcar_config::Logging) -> eyre::Result<()> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .wrap_err_with(|| format!("invalid --log-level {:?}", cli.log_level))?;
    if cli.json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "vwcar.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "daily" => tracing_appender::rolling::daily(dir, &name),
            "hourly" => tracing_appender::rolling::hourly(dir, &name),
            _ => tracing_appender::rolling::never(dir, &name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let level = logging.level.as_deref().unwrap_or("info");
        let file_filter = EnvFilter::try_new(level)
            .wrap_err_with(|| format!("logging.level {level:?} is not a valid filter"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

fn run(cli: Cli, shutdown: &AtomicBool) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), platform = ?cfg.car.platform, "config loaded");

    let mut session = Session::from_config(&cfg)?;

    match cli.cmd {
        Commands::Replay {
            input,
            output,
            max_ticks,
            units,
            slc,
            skip_empty,
        } => {
            let reader = BufReader::new(
                File::open(&input)
                    .wrap_err_with(|| format!("open frame log {}", input.display()))?,
            );
            let opts = ReplayOptions {
                max_ticks,
                is_metric: units == Units::Metric,
                slc,
                skip_empty,
            };
            let stats = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .wrap_err_with(|| format!("create command log {}", path.display()))?;
                    let mut w = BufWriter::new(file);
                    run_replay(&mut session, reader, &mut w, &opts, shutdown)?
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut w = BufWriter::new(stdout.lock());
                    run_replay(&mut session, reader, &mut w, &opts, shutdown)?
                }
            };
            tracing::info!(
                ticks = stats.ticks,
                messages = stats.messages,
                interrupted = stats.interrupted,
                "replay finished"
            );
            Ok(())
        }
        Commands::Signals => {
            print_signals(&session, cli.json)?;
            Ok(())
        }
        Commands::SelfCheck => {
            let out = session.tick(
                &SignalSnapshot::default(),
                &CarControl::default(),
                &mut NoPlan,
                &mut MemoryParams::default(),
            );
            let platform = session.car_params().platform;
            tracing::info!(?platform, messages = out.command.messages.len(), "self-check");
            println!(
                "OK: platform={platform:?} subscriptions={} messages={}",
                session.subscriptions().pt.len() + session.subscriptions().cam.len(),
                out.command.messages.len()
            );
            Ok(())
        }
    }
}

fn print_signals(session: &Session, json: bool) -> eyre::Result<()> {
    let subs = session.subscriptions();
    let radar = radar_subscriptions(session.car_params()).unwrap_or_default();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if json {
        use serde_json::json;
        let table = |list: &[Subscription]| {
            list.iter()
                .map(|(m, hz)| json!({ "message": m, "hz": hz }))
                .collect::<Vec<_>>()
        };
        let obj = json!({
            "platform": format!("{:?}", session.car_params().platform),
            "pt": table(subs.pt.as_slice()),
            "cam": table(subs.cam.as_slice()),
            "radar": table(radar.as_slice()),
        });
        writeln!(out, "{obj}").wrap_err("write signals")?;
        return Ok(());
    }

    for (bus, list) in [("pt", &subs.pt), ("cam", &subs.cam), ("radar", &radar)] {
        for (message, hz) in list {
            writeln!(out, "{bus:<5} {message:<22} {hz:>3} Hz").wrap_err("write signals")?;
        }
    }
    Ok(())
}
