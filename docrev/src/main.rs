//! docrev: refine AI-generated repository documentation through chat.
//!
//! Entry point for the `docrev` binary. Wires together the configuration
//! (`config`), the documentation service client (`backend`), the terminal
//! lifecycle (`tui`), the event bus (`event`), the render worker (`render`)
//! and the UI (`ui`) around a `docrev_core::Session`.
//!
//! # Startup sequence
//!
//! 1. Parse flags and load the XDG config; both are read-only and run before
//!    the terminal is touched.
//! 2. Open `.docrev/docrev.log` and install the tracing subscriber.
//! 3. Install the panic hook, then register the SIGTERM flag.
//! 4. `init_tui()` enters the alternate screen.
//! 5. Spawn the render worker thread, the event task and the first generate.
//!
//! `restore_tui()` runs after the event loop exits on every non-panic path;
//! the loop itself only leaves via `break`.

mod app;
mod backend;
mod config;
mod editor;
mod event;
mod render;
mod theme;
mod tui;
mod ui;

use std::fs::{create_dir_all, OpenOptions};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use docrev_core::pipeline::fetch_delta;
use docrev_core::{ChatRefiner, DocGenerator, GenerateRequest, RefinementPipeline, RefinementTicket, Session};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::backend::{FileGenerator, HttpBackend};
use crate::config::{config_path, Cli, Config};
use crate::event::AppEvent;
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

const LOG_DIR: &str = ".docrev";

/// Sends a log file's worth of tracing output to `.docrev/docrev.log`.
///
/// `RUST_LOG` wins over the configured level. ANSI colors are off because the
/// file is read with a pager, not a terminal.
fn init_tracing(level: &str) -> anyhow::Result<()> {
    create_dir_all(LOG_DIR).with_context(|| format!("creating {LOG_DIR}"))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(format!("{LOG_DIR}/docrev.log"))
        .context("opening log file")?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Runs one generate action in the background and posts the new session.
fn spawn_generate(
    generator: Arc<dyn DocGenerator>,
    request: GenerateRequest,
    pipeline: RefinementPipeline,
    tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = Session::bootstrap(generator.as_ref(), &request, pipeline)
            .await
            .map(Box::new);
        let _ = tx.send(AppEvent::Generated(result));
    });
}

/// Sends a refinement to the chat collaborator and posts the reply.
fn spawn_refine(
    model: Arc<dyn ChatRefiner>,
    ticket: RefinementTicket,
    tx: UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = fetch_delta(model.as_ref(), &ticket.request).await;
        let _ = tx.send(AppEvent::Refined { ticket, result });
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_warning) = Config::load(&config_path());
    let config = config.merge_cli(&cli);

    init_tracing(&config.log.level)?;
    if let Some(warning) = config_warning {
        warn!("{warning}");
    }

    let repo = match (&cli.repo, &cli.doc) {
        (Some(repo), _) => repo.clone(),
        (None, Some(path)) => path.display().to_string(),
        (None, None) => bail!("either --repo or --doc is required"),
    };

    let http = Arc::new(
        HttpBackend::new(&config.backend.url, Duration::from_secs(config.backend.timeout_secs))
            .context("building HTTP client")?,
    );
    let generator: Arc<dyn DocGenerator> = match &cli.doc {
        Some(path) => Arc::new(FileGenerator::new(path)),
        None => http.clone(),
    };
    let model: Arc<dyn ChatRefiner> = http;
    let pipeline = RefinementPipeline::with_anchor(config.merge.anchor.clone());
    info!(%repo, backend = %config.backend.url, anchor = %config.merge.anchor, "starting");

    let theme = theme::Theme::from_name(&config.theme);
    let generate_request = GenerateRequest {
        repo,
        persona: config.session.persona,
        branch: config.session.branch.clone(),
    };
    let mut state = AppState::new(generate_request);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm().context("registering SIGTERM handler")?;
    let mut terminal = tui::init_tui().context("initialising terminal")?;

    let handler = event::EventHandler::new();
    let tx = handler.tx.clone();
    let mut rx = handler.rx;

    // Render worker: owns the syntect sets; exits when `render_tx` is dropped.
    let (render_tx, render_rx) = crossbeam_channel::unbounded();
    state.render_tx = Some(render_tx);
    let worker_tx = tx.clone();
    let worker = std::thread::spawn(move || render::worker::render_worker_loop(render_rx, worker_tx));

    event::spawn_event_task(tx.clone());

    state.generating = true;
    spawn_generate(Arc::clone(&generator), state.generate_request.clone(), pipeline.clone(), tx.clone());

    let mut refine_task: Option<JoinHandle<()>> = None;
    let mut draw_result: std::io::Result<()> = Ok(());

    'event_loop: loop {
        tokio::select! {
            // Heartbeat so SIGTERM is seen within 50ms even when nothing else arrives.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            draw_result = Err(e);
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Key(key)) => match handle_key(key, &mut state) {
                        KeyAction::Continue => {}
                        KeyAction::Quit => break 'event_loop,
                        KeyAction::Refine(ticket) => {
                            refine_task = Some(spawn_refine(Arc::clone(&model), ticket, tx.clone()));
                        }
                        KeyAction::CancelRefinement => {
                            if let Some(task) = refine_task.take() {
                                task.abort();
                            }
                            state.cancel_refinement();
                        }
                        KeyAction::Regenerate => {
                            if let Some(task) = refine_task.take() {
                                task.abort();
                            }
                            // A failed regenerate keeps the old session, which must not stay locked.
                            state.cancel_refinement();
                            state.generating = true;
                            state.info("Regenerating documentation");
                            spawn_generate(
                                Arc::clone(&generator),
                                state.generate_request.clone(),
                                pipeline.clone(),
                                tx.clone(),
                            );
                        }
                    },
                    Some(AppEvent::Mouse(mouse)) => handle_mouse(mouse, &mut state),
                    // ratatui picks up the new size on the next draw.
                    Some(AppEvent::Resize(_, _)) => {}
                    Some(AppEvent::Tick) => state.on_tick(),
                    Some(AppEvent::Rendered(payload)) => state.apply_render(*payload),
                    Some(AppEvent::Generated(result)) => {
                        if let Err(e) = &result {
                            error!(error = %e, "generation failed");
                        }
                        state.apply_generated(result);
                    }
                    Some(AppEvent::Refined { ticket, result }) => {
                        refine_task = None;
                        state.apply_refined(&ticket, result);
                    }
                    Some(AppEvent::Quit) | None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui().context("restoring terminal")?;

    // Closing the request channel lets the worker's `for` loop end.
    state.render_tx = None;
    if worker.join().is_err() {
        warn!("render worker panicked");
    }
    info!("exiting");
    draw_result.context("drawing frame")?;
    Ok(())
}
