#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;
use x11rb::connection::Connection;
use x11rb::rust_connection::RustConnection;

use window_state::constants::paths;
use window_state::x11::{CachedAtoms, X11Displays, X11Window};
use window_state::{AppDirs, DirsAppDirs, StoreConfig, WindowStateStore};

#[derive(Parser, Debug)]
#[command(name = "window-state", version, about = "Save and restore X11 window geometry")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

/// Store options; these win over `WINDOW_STATE_*` environment variables
#[derive(Args, Debug)]
struct StoreArgs {
    /// Application name used for the default state directory
    #[arg(long, global = true, default_value = paths::APP_DIR)]
    app_name: String,

    /// State file name
    #[arg(long, global = true)]
    file: Option<String>,

    /// Directory holding the state file
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    #[arg(long, global = true)]
    default_width: Option<u32>,

    #[arg(long, global = true)]
    default_height: Option<u32>,

    /// Quiet period after move/resize before geometry is captured
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    /// Don't re-maximize a window that was saved maximized
    #[arg(long, global = true)]
    no_maximize: bool,

    /// Don't re-enter fullscreen for a window that was saved fullscreen
    #[arg(long, global = true)]
    no_full_screen: bool,
}

impl StoreArgs {
    fn to_config(&self) -> StoreConfig {
        let mut config = StoreConfig::default();
        config.apply_env_overrides();

        if let Some(file) = &self.file {
            config.file = file.clone();
        }
        if let Some(path) = &self.path {
            config.path = Some(path.clone());
        }
        if let Some(width) = self.default_width {
            config.default_width = width;
        }
        if let Some(height) = self.default_height {
            config.default_height = height;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce_ms = debounce_ms;
        }
        if self.no_maximize {
            config.maximize = false;
        }
        if self.no_full_screen {
            config.full_screen = false;
        }

        config.validate_and_clamp();
        config
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the geometry a window would be restored to
    Show,
    /// Restore a window's saved geometry, track it until it is destroyed, then save it
    Track {
        /// X11 window id, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_window_id)]
        window: u32,
    },
    /// Delete the saved state file
    Forget,
}

fn parse_window_id(raw: &str) -> Result<u32, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| format!("invalid window id '{}': {}", raw, e))
}

/// X11 connection plus the root-screen facts the adapters need
struct XContext {
    conn: Arc<RustConnection>,
    root: u32,
    width: u16,
    height: u16,
}

impl XContext {
    fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to the X server")?;
        let screen = &conn.setup().roots[screen_num];
        let (root, width, height) = (screen.root, screen.width_in_pixels, screen.height_in_pixels);
        info!("successfully connected to x11: screen={screen_num}, dimensions={width}x{height}");
        Ok(Self {
            conn: Arc::new(conn),
            root,
            width,
            height,
        })
    }

    fn displays(&self) -> Arc<X11Displays> {
        Arc::new(X11Displays::new(
            Arc::clone(&self.conn),
            self.root,
            self.width,
            self.height,
        ))
    }
}

fn show(config: StoreConfig, app_dirs: Arc<dyn AppDirs>) -> Result<()> {
    let x = XContext::connect()?;
    let store = WindowStateStore::builder(config, x.displays())
        .app_dirs(app_dirs)
        .build();

    info!(path = %store.state_file().display(), "Effective window state");
    let json = serde_json::to_string_pretty(&store.record())
        .context("Failed to serialize window state")?;
    println!("{json}");
    Ok(())
}

fn track(config: StoreConfig, app_dirs: Arc<dyn AppDirs>, window_id: u32) -> Result<()> {
    // Debounce timer lives on its own worker; the X event loop blocks this thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .context("Failed to start tokio runtime")?;

    let x = XContext::connect()?;
    let atoms = Arc::new(CachedAtoms::new(&x.conn)?);
    let store = WindowStateStore::builder(config, x.displays())
        .app_dirs(app_dirs)
        .runtime(runtime.handle().clone())
        .build();

    let window = Arc::new(X11Window::attach(Arc::clone(&x.conn), x.root, window_id, atoms)?);
    // Normal geometry first so a later unmaximize lands on it
    let position = store.x().zip(store.y());
    if let Err(e) = window.place(position, store.width(), store.height()) {
        warn!(error = %e, "Failed to restore window geometry");
    }
    store.manage(window.clone());
    x.conn.flush().context("Failed to flush X11 connection")?;
    info!(window = window.id(), path = %store.state_file().display(), "Tracking window");

    #[cfg(unix)]
    spawn_signal_handler(store.clone())?;

    loop {
        let event = match x.conn.wait_for_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "X11 connection lost, saving last known state");
                store.unmanage();
                store.save_state(None);
                return Err(e).context("X11 connection lost");
            }
        };
        if window.dispatch(&event) {
            break;
        }
    }

    info!(window = window.id(), "Window destroyed, state saved");
    Ok(())
}

/// Save on Ctrl+C / SIGTERM so an interrupted track still persists
#[cfg(unix)]
fn spawn_signal_handler(store: WindowStateStore) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!(signal = signal, "Received signal, saving window state");
            store.update_state(None);
            store.unmanage();
            store.save_state(None);
            std::process::exit(0);
        }
    });
    Ok(())
}

fn forget(config: &StoreConfig, app_dirs: &dyn AppDirs) -> Result<()> {
    let path = config.state_file(app_dirs);
    match std::fs::remove_file(&path) {
        Ok(()) => info!(path = %path.display(), "Removed saved window state"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No saved window state to remove");
        }
        Err(e) => {
            return Err(e).context(format!("Failed to remove {}", path.display()));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = cli.store.to_config();
    let app_dirs: Arc<dyn AppDirs> = Arc::new(DirsAppDirs::new(cli.store.app_name.as_str()));

    match cli.command {
        Command::Show => show(config, app_dirs),
        Command::Track { window } => track(config, app_dirs, window),
        Command::Forget => forget(&config, app_dirs.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window_id_decimal_and_hex() {
        assert_eq!(parse_window_id("12345"), Ok(12345));
        assert_eq!(parse_window_id("0x3a00007"), Ok(0x3a00007));
        assert_eq!(parse_window_id("0X1F"), Ok(31));
        assert!(parse_window_id("window").is_err());
        assert!(parse_window_id("0xZZ").is_err());
    }

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "window-state",
            "--path",
            "/data",
            "--file",
            "state.json",
            "--default-width",
            "1000",
            "--no-maximize",
            "show",
        ]);
        let config = cli.store.to_config();
        assert_eq!(config.path, Some(PathBuf::from("/data")));
        assert_eq!(config.file, "state.json");
        assert_eq!(config.default_width, 1000);
        assert!(!config.maximize);
        assert!(config.full_screen);
        assert!(matches!(cli.command, Command::Show));
    }

    #[test]
    fn test_cli_parses_track_window() {
        let cli = Cli::parse_from(["window-state", "track", "0x400001"]);
        assert!(matches!(cli.command, Command::Track { window: 0x400001 }));
    }
}
