//! Simulate command - run the bridge against a scripted tracker.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::info;
use tuiolayer::app::{AppConfig, TrackingApp};
use tuiolayer::config::ConfigFile;
use tuiolayer::listener::{ProtocolClient, ScriptCompletion, ScriptStep, SimulatedClient};
use tuiolayer::logging::init_logging;
use tuiolayer::mapper::{PositionEvent, Surface};

use crate::error::CliError;

/// Updates per scripted swipe.
const SWIPE_SAMPLES: usize = 30;

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub ticks: u64,
    pub tick_ms: u64,
    pub cursors: usize,
    pub port: Option<u16>,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let _logging = init_logging(&config.logging_config())?;

    let tick_interval = Duration::from_millis(args.tick_ms.max(1));
    let mut app_config = AppConfig::from_config_file(&config).with_tick_interval(tick_interval);
    if let Some(port) = args.port {
        for session in &mut app_config.sessions {
            session.port = port;
        }
    }
    if config.filter.ignore_cursors {
        println!("Note: filter.ignore_cursors is set, no cursor events will arrive.");
    }

    let script = build_script(args.cursors, tick_interval);
    let mut completions: Vec<ScriptCompletion> = Vec::new();
    let mut app = TrackingApp::start(app_config, Instant::now(), |_| -> Box<dyn ProtocolClient> {
        let client = SimulatedClient::new(script.clone());
        completions.push(client.completion());
        Box::new(client)
    })?;

    println!("TuioLayer Simulation v{}", tuiolayer::VERSION);
    println!("=========================");
    println!();
    for session in app.sessions() {
        println!("Session: port {} ({})", session.port(), session.state());
    }
    if let Some(mapper) = app.mapper() {
        println!("Surface: {}", mapper.borrow().surface().name());
    }
    println!("Cursors: {}", args.cursors);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })?;

    let mut positions = app.mapper().map(|m| m.borrow().subscribe());
    let mut seen = 0u64;
    let ticks = app.run_until(&shutdown, |app, report| {
        seen += 1;
        for fault in &report.faults {
            println!("  ! {}", fault);
        }
        if let Some(rx) = positions.as_mut() {
            print_positions(rx);
        }

        let scripts_done = completions.iter().all(ScriptCompletion::is_finished);
        let idle = report.drained == 0 && app.sessions().iter().all(|s| s.pending_events() == 0);
        if seen >= args.ticks || (scripts_done && idle) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    info!(ticks, "Simulation finished");

    let snapshot = app.shutdown();
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!(
        "  Events: {} enqueued, {} filtered, {} dispatched",
        snapshot.events_enqueued, snapshot.events_filtered, snapshot.events_dispatched
    );
    println!(
        "  Queue high water: {} | Discarded: {} | Receiver faults: {}",
        snapshot.queue_high_water, snapshot.events_discarded, snapshot.receiver_faults
    );
    println!(
        "  Ticks: {} | Throughput: {:.1} events/s | Uptime: {}",
        snapshot.ticks,
        snapshot.events_per_second(),
        snapshot.uptime_human()
    );
    Ok(())
}

/// One horizontal swipe per cursor, on evenly spaced rows.
fn build_script(cursors: usize, frame_interval: Duration) -> Vec<ScriptStep> {
    (0..cursors)
        .flat_map(|i| {
            let y = (i + 1) as f32 / (cursors + 1) as f32;
            ScriptStep::swipe(
                i as i64 + 1,
                (0.1, y),
                (0.9, y),
                SWIPE_SAMPLES,
                frame_interval,
            )
        })
        .collect()
}

fn print_positions(rx: &mut broadcast::Receiver<PositionEvent>) {
    loop {
        match rx.try_recv() {
            Ok(PositionEvent::Added {
                session_id,
                kind,
                position,
            }) => println!("  + {} {} at {}", kind, session_id, position),
            Ok(PositionEvent::Moved {
                session_id,
                kind,
                position,
            }) => println!("  ~ {} {} to {}", kind, session_id, position),
            Ok(PositionEvent::Removed { session_id, kind }) => {
                println!("  - {} {}", kind, session_id)
            }
            Err(TryRecvError::Lagged(skipped)) => {
                println!("  ({} position events skipped)", skipped)
            }
            Err(_) => break,
        }
    }
}
