//! Socket client for the presenced control surface.

use presenced_protocol::{
    CatalogEntryView, Method, Request, Response, StatusReport, MAX_REQUEST_BYTES, PROTOCOL_VERSION,
};
use serde_json::Value;
use std::env;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

const SOCKET_ENV: &str = "PRESENCED_SOCKET";
const SOCKET_NAME: &str = "daemon.sock";
const READ_TIMEOUT_MS: u64 = 2_000;
const WRITE_TIMEOUT_MS: u64 = 600;

pub fn get_health() -> Result<Value, String> {
    request(Method::GetHealth, None)
}

pub fn get_status() -> Result<StatusReport, String> {
    let data = request(Method::GetStatus, None)?;
    serde_json::from_value(data).map_err(|err| format!("Unexpected status payload: {}", err))
}

pub fn list_statuses() -> Result<Vec<CatalogEntryView>, String> {
    let data = request(Method::ListStatuses, None)?;
    serde_json::from_value(data).map_err(|err| format!("Unexpected catalog payload: {}", err))
}

pub fn toggle_mode() -> Result<String, String> {
    let data = request(Method::ToggleMode, None)?;
    data.get("mode")
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| "Daemon response did not name the new mode".to_string())
}

pub fn set_status(key: &str) -> Result<(), String> {
    request(Method::SetStatus, Some(serde_json::json!({ "key": key }))).map(|_| ())
}

pub fn clear_status() -> Result<(), String> {
    request(Method::ClearStatus, None).map(|_| ())
}

pub fn set_token(token: &str) -> Result<(), String> {
    request(Method::SetToken, Some(serde_json::json!({ "token": token }))).map(|_| ())
}

fn request(method: Method, params: Option<Value>) -> Result<Value, String> {
    let request = Request {
        protocol_version: PROTOCOL_VERSION,
        method,
        id: None,
        params,
    };
    let response = send_request(request)?;
    if response.ok {
        Ok(response.data.unwrap_or(Value::Null))
    } else {
        let message = response
            .error
            .map(|err| format!("{}: {}", err.code, err.message))
            .unwrap_or_else(|| "Unknown daemon error".to_string());
        Err(message)
    }
}

fn socket_path() -> Result<PathBuf, String> {
    if let Ok(path) = env::var(SOCKET_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or_else(|| "Home directory not found".to_string())?;
    Ok(home.join(".presenced").join(SOCKET_NAME))
}

fn send_request(request: Request) -> Result<Response, String> {
    let socket = socket_path()?;
    let mut stream = UnixStream::connect(&socket)
        .map_err(|err| format!("Failed to connect to daemon socket: {}", err))?;
    let _ = stream.set_read_timeout(Some(Duration::from_millis(READ_TIMEOUT_MS)));
    let _ = stream.set_write_timeout(Some(Duration::from_millis(WRITE_TIMEOUT_MS)));

    serde_json::to_writer(&mut stream, &request)
        .map_err(|err| format!("Failed to write request: {}", err))?;
    stream
        .write_all(b"\n")
        .map_err(|err| format!("Failed to flush request: {}", err))?;
    stream.flush().ok();

    read_response(&mut stream)
}

fn read_response(stream: &mut UnixStream) -> Result<Response, String> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > MAX_REQUEST_BYTES {
                    return Err("Response exceeded maximum size".to_string());
                }
                if chunk[..n].contains(&b'\n') {
                    break;
                }
            }
            Err(err) => {
                return Err(format!("Failed to read response: {}", err));
            }
        }
    }

    if buffer.is_empty() {
        return Err("Daemon closed the connection without responding".to_string());
    }

    let response_bytes = match buffer.iter().position(|b| *b == b'\n') {
        Some(index) => &buffer[..index],
        None => buffer.as_slice(),
    };

    serde_json::from_slice(response_bytes)
        .map_err(|err| format!("Response was not valid JSON: {}", err))
}
