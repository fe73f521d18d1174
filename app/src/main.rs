use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info};

use gesture_cast::config::{DEFAULT_HOST, DEFAULT_PORT};
use gesture_cast::source::IpcHandPose;
use gesture_cast::{client, App, Config, GError};

/// Set by SIGTERM/SIGINT.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

const STATUS_POLL: Duration = Duration::from_millis(50);

/// Classifies hand poses into rock, paper or scissors and streams the label over TCP
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read hand poses from the estimator and broadcast the gesture
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        /// Estimator socket, overrides the config file
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Connect to a running server and print every gesture change
    Watch {
        #[arg(long, default_value_t = DEFAULT_HOST.to_owned())]
        host: String,
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        #[arg(long, default_value_t = 2000)]
        retry_ms: u64,
    },
}

fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

fn serve(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    socket: Option<PathBuf>,
) -> error_stack::Result<(), GError> {
    let mut config = Config::open_or_default(config)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(socket) = socket {
        config.source.socket = socket;
    }

    let source = IpcHandPose::connect(&config.source)?;
    let app = App::new(config);
    let mut running = app.start(source)?;

    let mut was_connected = false;
    while !shutdown_requested() {
        if let Some(result) = running.take_processing_result() {
            match result {
                Ok(summary) => info!(
                    "hand pose stream finished after {} cycles, still serving {}",
                    summary.cycles, summary.last
                ),
                Err(e) => error!("processing stopped: {e:?}"),
            }
        }

        if running.server_finished() && running.processing_finished() {
            break;
        }

        let connected = running.context().is_client_connected();
        if connected != was_connected {
            if connected {
                info!("client connected");
            } else {
                info!("waiting for connection...");
            }
            was_connected = connected;
        }

        thread::sleep(STATUS_POLL);
    }

    info!("shutting down");
    running.shutdown()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    install_signal_handlers();

    let result = match Args::parse().command {
        Command::Serve {
            config,
            host,
            port,
            socket,
        } => serve(config, host, port, socket),
        Command::Watch {
            host,
            port,
            retry_ms,
        } => {
            client::watch(
                &format!("{host}:{port}"),
                Duration::from_millis(retry_ms),
                || !shutdown_requested(),
                |gesture| println!("Gesture: {gesture}"),
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}
