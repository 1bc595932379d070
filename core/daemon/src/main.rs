//! presenced entrypoint.
//!
//! A small single-writer daemon: a scheduler thread re-evaluates presence
//! signals on a fixed cadence, and a socket listener exposes the control
//! surface (mode toggle, manual selection, status queries) to clients.

use fs_err as fs;
use std::env;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use presenced_protocol::{
    parse_set_status, parse_set_token, ErrorInfo, Method, Request, Response, MAX_REQUEST_BYTES,
    PROTOCOL_VERSION,
};
use presence_core::{config, ResolveContext};

mod collect;
mod scheduler;
mod slack;
mod state;

use collect::Collectors;
use slack::SlackClient;
use state::{error_code, SharedState};

const SOCKET_NAME: &str = "daemon.sock";
const READ_TIMEOUT_SECS: u64 = 2;
const READ_CHUNK_SIZE: usize = 4096;

fn main() {
    let config_path = env::var("PRESENCED_CONFIG").ok().map(PathBuf::from);
    let config = match config::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            // Logging is not up yet; this is the one message that must
            // reach the user regardless.
            eprintln!("presenced: {}", err);
            std::process::exit(1);
        }
    };

    init_logging(config.debug);

    if config.token.trim().is_empty() {
        warn!("No API token configured; publishes will fail until one is set");
    }

    let socket_path = match daemon_socket_path() {
        Ok(path) => path,
        Err(err) => {
            error!(error = %err, "Failed to resolve daemon socket path");
            std::process::exit(1);
        }
    };

    if let Err(err) = prepare_socket_dir(&socket_path) {
        error!(error = %err, "Failed to prepare daemon socket directory");
        std::process::exit(1);
    }

    if let Err(err) = remove_existing_socket(&socket_path) {
        error!(error = %err, path = %socket_path.display(), "Failed to remove existing socket");
        std::process::exit(1);
    }

    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, path = %socket_path.display(), "Failed to bind daemon socket");
            std::process::exit(1);
        }
    };

    let publisher = match SlackClient::new(config.token.clone()) {
        Ok(publisher) => publisher,
        Err(err) => {
            error!(error = %err, "Failed to build publishing client");
            std::process::exit(1);
        }
    };

    let collectors = Collectors::with_defaults(
        config.vacation_calendars.clone(),
        config.work_calendars.clone(),
    );
    let shared_state = Arc::new(SharedState::new(
        ResolveContext::from_config(&config),
        publisher,
        collectors,
        config.poll_interval_secs,
    ));

    info!(
        path = %socket_path.display(),
        poll_interval_secs = config.poll_interval_secs,
        "presenced started"
    );

    // Startup enters auto mode, which behaves like the manual-to-auto
    // transition: one immediate cycle before the first scheduled sleep.
    shared_state.run_tick("startup");
    scheduler::spawn(Arc::clone(&shared_state));

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let state = Arc::clone(&shared_state);
                thread::spawn(|| handle_connection(stream, state));
            }
            Err(err) => {
                warn!(error = %err, "Failed to accept daemon connection");
            }
        }
    }
}

fn init_logging(debug: bool) {
    let debug_enabled = debug
        || env::var("PRESENCED_DEBUG_LOG")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn daemon_socket_path() -> Result<PathBuf, String> {
    if let Ok(path) = env::var("PRESENCED_SOCKET") {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or_else(|| "Home directory not found".to_string())?;
    Ok(home.join(".presenced").join(SOCKET_NAME))
}

fn prepare_socket_dir(socket_path: &Path) -> Result<(), String> {
    let parent = socket_path
        .parent()
        .ok_or_else(|| "Socket path has no parent".to_string())?;
    fs::create_dir_all(parent).map_err(|err| format!("Failed to create socket directory: {}", err))
}

fn remove_existing_socket(socket_path: &Path) -> Result<(), String> {
    if socket_path.exists() {
        fs::remove_file(socket_path)
            .map_err(|err| format!("Failed to remove existing socket: {}", err))?;
    }
    Ok(())
}

fn handle_connection(mut stream: UnixStream, state: Arc<SharedState<SlackClient>>) {
    let request = match read_request(&mut stream) {
        Ok(request) => request,
        Err(err) => {
            warn!(code = %err.code, message = %err.message, "Failed to read request");
            let response = Response::error_with_info(None, err);
            let _ = write_response(&mut stream, response);
            return;
        }
    };

    tracing::debug!(method = ?request.method, id = ?request.id, "Daemon request received");
    let response = handle_request(request, state);
    let _ = write_response(&mut stream, response);
}

fn read_request(stream: &mut UnixStream) -> Result<Request, ErrorInfo> {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(READ_TIMEOUT_SECS)));

    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > MAX_REQUEST_BYTES {
                    return Err(ErrorInfo::new(
                        "request_too_large",
                        "request exceeded maximum size",
                    ));
                }
                if chunk[..n].contains(&b'\n') {
                    break;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(ErrorInfo::new("read_timeout", "request timed out"));
            }
            Err(err) => {
                return Err(ErrorInfo::new(
                    "read_error",
                    format!("failed to read request: {}", err),
                ));
            }
        }
    }

    if buffer.is_empty() {
        return Err(ErrorInfo::new("empty_request", "request body was empty"));
    }

    let request_bytes = match buffer.iter().position(|b| *b == b'\n') {
        Some(index) => &buffer[..index],
        None => buffer.as_slice(),
    };

    if request_bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ErrorInfo::new("empty_request", "request body was empty"));
    }

    serde_json::from_slice(request_bytes).map_err(|err| {
        ErrorInfo::new(
            "invalid_json",
            format!("request was not valid JSON: {}", err),
        )
    })
}

fn handle_request(request: Request, state: Arc<SharedState<SlackClient>>) -> Response {
    if request.protocol_version != PROTOCOL_VERSION {
        return Response::error(
            request.id,
            "protocol_mismatch",
            "unsupported protocol version",
        );
    }

    match request.method {
        Method::GetHealth => {
            let data = serde_json::json!({
                "status": "ok",
                "pid": std::process::id(),
                "version": env!("CARGO_PKG_VERSION"),
                "protocol_version": PROTOCOL_VERSION,
                "mode": state.status_report().mode,
                "poll_interval_secs": state.poll_interval_secs(),
            });
            Response::ok(request.id, data)
        }
        Method::GetStatus => match serde_json::to_value(state.status_report()) {
            Ok(value) => Response::ok(request.id, value),
            Err(err) => Response::error(
                request.id,
                "serialization_error",
                format!("Failed to serialize status report: {}", err),
            ),
        },
        Method::ListStatuses => match serde_json::to_value(state.catalog_entries()) {
            Ok(value) => Response::ok(request.id, value),
            Err(err) => Response::error(
                request.id,
                "serialization_error",
                format!("Failed to serialize catalog: {}", err),
            ),
        },
        Method::ToggleMode => {
            let mode = state.toggle_mode();
            info!(mode = ?mode, "Mode toggled via control socket");
            Response::ok(request.id, serde_json::json!({ "mode": mode }))
        }
        Method::SetStatus => {
            let params = match request.params {
                Some(params) => params,
                None => return Response::error(request.id, "invalid_params", "key is required"),
            };
            let parsed = match parse_set_status(params) {
                Ok(parsed) => parsed,
                Err(err) => return Response::error_with_info(request.id, err),
            };
            match state.select_status(&parsed.key) {
                Ok(_) => Response::ok(request.id, serde_json::json!({"key": parsed.key})),
                Err(err) => Response::error(request.id, error_code(&err), err.to_string()),
            }
        }
        Method::ClearStatus => match state.clear_status() {
            Ok(_) => Response::ok(request.id, serde_json::json!({"cleared": true})),
            Err(err) => Response::error(request.id, error_code(&err), err.to_string()),
        },
        Method::SetToken => {
            let params = match request.params {
                Some(params) => params,
                None => return Response::error(request.id, "invalid_params", "token is required"),
            };
            let parsed = match parse_set_token(params) {
                Ok(parsed) => parsed,
                Err(err) => return Response::error_with_info(request.id, err),
            };
            state.update_publisher(|publisher| publisher.set_token(parsed.token));
            info!("API token replaced via control socket");
            Response::ok(request.id, serde_json::json!({"updated": true}))
        }
    }
}

fn write_response(stream: &mut UnixStream, response: Response) -> std::io::Result<()> {
    serde_json::to_writer(&mut *stream, &response)?;
    stream.write_all(b"\n")?;
    stream.flush()?;
    Ok(())
}
