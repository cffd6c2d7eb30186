// TailPane - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Logging initialisation (debug mode support)
// 3. Session restore and layout construction
// 4. The presentation loop: draining view events and printing new lines
//
// The main thread is the presentation thread: it owns the pane container
// and the event channel receiver, and background poll threads only ever
// reach it through that channel.

use clap::Parser;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use tailpane::app::pane::{PaneContainer, ViewSurface};
use tailpane::app::reader::FileSourceReader;
use tailpane::app::scheduler::Scheduler;
use tailpane::app::session;
use tailpane::core::model::{LogSource, ViewEvent, ViewId};
use tailpane::platform::config::{load_config, PlatformPaths};
use tailpane::util;
use tailpane::util::constants::{
    MAX_EVENTS_PER_DRAIN, MAX_TAIL_POLL_INTERVAL_MS, MIN_TAIL_POLL_INTERVAL_MS,
};

/// Headless presentation surface: movement and focus have no visual effect,
/// so they are logged for diagnostics and otherwise ignored.
struct LogSurface {
    name: String,
}

impl ViewSurface for LogSurface {
    fn apply_movement(&mut self, delta: f64) {
        tracing::debug!(view = %self.name, delta, "Movement applied");
    }

    fn request_focus(&mut self) {
        tracing::debug!(view = %self.name, "Focus requested");
    }
}

/// TailPane - follow several growing log files side by side.
///
/// Opens each file as a view positioned at its current end and prints newly
/// appended lines to stdout prefixed with the view's name. With no files
/// given, the previous session's layout is restored.
#[derive(Parser, Debug)]
#[command(name = "TailPane", version, about)]
struct Cli {
    /// Log files to open, one view per file.
    files: Vec<PathBuf>,

    /// Start following every opened file immediately.
    #[arg(short = 'F', long = "follow")]
    follow: bool,

    /// Poll interval override in milliseconds.
    #[arg(long = "poll-interval-ms")]
    poll_interval_ms: Option<u64>,

    /// Do not restore or save the layout session.
    #[arg(long = "no-session")]
    no_session: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Resolve platform paths and load config.toml first: the config file
    // carries the fallback log level.  Warnings are replayed once logging
    // is up.
    let platform_paths = PlatformPaths::resolve();
    let (config, config_warnings) = load_config(&platform_paths.config_dir);

    // Initialise logging subsystem
    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "TailPane starting"
    );

    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    // Poll interval: CLI override > config > default, validated either way.
    let poll_interval_ms = match cli.poll_interval_ms {
        Some(interval)
            if (MIN_TAIL_POLL_INTERVAL_MS..=MAX_TAIL_POLL_INTERVAL_MS).contains(&interval) =>
        {
            interval
        }
        Some(interval) => {
            tracing::warn!(
                requested = interval,
                "--poll-interval-ms out of range ({MIN_TAIL_POLL_INTERVAL_MS}-{MAX_TAIL_POLL_INTERVAL_MS}); using configured value"
            );
            config.poll_interval_ms
        }
        None => config.poll_interval_ms,
    };

    let scheduler = Arc::new(Scheduler::new());
    let (mut container, events_rx) = PaneContainer::new(
        Arc::clone(&scheduler),
        Duration::from_millis(poll_interval_ms),
    );

    // Build the layout: CLI files take precedence; otherwise restore the
    // previous session.
    let session_file = session::session_path(&platform_paths.data_dir);
    let mut files_to_tail: Vec<PathBuf> = Vec::new();

    if cli.files.is_empty() && !cli.no_session {
        if let Some(restored) = session::load(&session_file) {
            container.set_orientation(restored.orientation);
            for path in restored.open_files {
                open_view(&mut container, path);
            }
            container.set_divider_positions(&restored.divider_positions);
            files_to_tail = restored.tailing_files;
        }
    } else {
        for path in &cli.files {
            open_view(&mut container, path.clone());
        }
        if cli.follow {
            files_to_tail = cli.files.clone();
        }
    }

    if container.is_empty() {
        eprintln!("No files to open. Pass log file paths on the command line.");
        std::process::exit(2);
    }

    // Restore tailing state.
    let tail_ids: Vec<ViewId> = container
        .views()
        .filter(|wrapper| files_to_tail.contains(&wrapper.source().path))
        .map(|wrapper| wrapper.id())
        .collect();
    for id in tail_ids {
        if let Some(wrapper) = container.get(id) {
            wrapper.start_tailing();
        }
    }

    for wrapper in container.views() {
        println!("==> {} <==", wrapper.header_title());
    }

    // Persist the layout off the presentation thread so the next launch
    // restores it even if the process is killed mid-run.
    if !cli.no_session {
        let snapshot = session::capture(&container);
        scheduler.run_async(move || {
            if let Err(e) = session::save(&snapshot, &session_file) {
                tracing::warn!(error = %e, "Session save failed");
            }
        });
    }

    run_presentation_loop(&container, &events_rx);

    // Only reachable if the event channel closes; tear down cleanly anyway.
    container.close_all();
    scheduler.shutdown();
}

/// Open `path` as a new view appended to the layout.
fn open_view(container: &mut PaneContainer, path: PathBuf) {
    let source = LogSource::describe(path.clone());
    let reader = Box::new(FileSourceReader::open_at_end(path));
    let name = source.display_name.clone();
    let surface = Box::new(LogSurface { name: name.clone() });
    let on_close = Box::new(move || tracing::info!(view = %name, "View closed"));
    container.add(source, reader, surface, on_close, None);
}

/// Drain view events and print followed lines, budgeted per iteration so a
/// burst of appended content cannot monopolise the loop.
fn run_presentation_loop(container: &PaneContainer, events: &mpsc::Receiver<ViewEvent>) {
    loop {
        let first = match events.recv_timeout(Duration::from_millis(250)) {
            Ok(event) => event,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        };

        let mut handled = 0usize;
        let mut next = Some(first);
        while let Some(event) = next {
            apply_event(container, event);
            handled += 1;
            next = if handled < MAX_EVENTS_PER_DRAIN {
                events.try_recv().ok()
            } else {
                None
            };
        }
    }
}

fn apply_event(container: &PaneContainer, event: ViewEvent) {
    match event {
        ViewEvent::NewLines { view, lines } => {
            let name = container
                .get(view)
                .map(|wrapper| wrapper.source().display_name.clone())
                .unwrap_or_else(|| view.to_string());
            for line in lines {
                println!("{name} | {line}");
            }
        }
        ViewEvent::ReadError { view, message } => {
            tracing::warn!(%view, %message, "Source read failed on a poll tick");
        }
    }
}
