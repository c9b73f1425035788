//! Chrome/Chromium driven over the DevTools protocol.
//!
//! The browser is started with `--remote-debugging-port=0` and a throwaway
//! profile. Its `DevTools listening on ws://...` line on stderr gives the
//! browser endpoint; pages are attached as flattened target sessions over
//! that single WebSocket.

use std::io::{BufRead, BufReader, ErrorKind};
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tempfile::TempDir;
use tungstenite::{Message, WebSocket};

use super::browser::{Browser, Clip, Page, Session, Viewport};
use super::{OutputFormat, RenderError};
use crate::config::RenderConfig;
use crate::{debug, log};

/// Executables searched on PATH when `render.browser` is unset.
const CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

const DEFAULT_FLAGS: &[&str] = &[
    "--headless=new",
    "--remote-debugging-port=0",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-gpu",
    "--disable-extensions",
    "--hide-scrollbars",
    "--mute-audio",
];

const ENDPOINT_PREFIX: &str = "DevTools listening on ";

/// Linear backoff step between launch attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// CSS pixels per inch (PDF paper sizes are in inches).
const CSS_DPI: f64 = 96.0;

/// Launches a local Chrome/Chromium per session.
#[derive(Debug, Clone)]
pub struct ChromeBrowser {
    executable: Option<PathBuf>,
    args: Vec<String>,
    timeout: Duration,
    launch_retries: u32,
}

impl ChromeBrowser {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            executable: config.browser.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
            launch_retries: config.launch_retries,
        }
    }

    fn find_executable(&self) -> Result<PathBuf, RenderError> {
        match &self.executable {
            Some(path) if path.components().count() > 1 => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(RenderError::Process(format!(
                        "browser `{}` not found",
                        path.display()
                    )))
                }
            }
            Some(name) => which::which(name).map_err(|e| {
                RenderError::Process(format!("browser `{}` not found: {e}", name.display()))
            }),
            None => CANDIDATES
                .iter()
                .find_map(|name| which::which(name).ok())
                .ok_or_else(|| {
                    RenderError::Process(
                        "no Chrome or Chromium found on PATH, set `render.browser`".into(),
                    )
                }),
        }
    }

    fn launch_once(&self) -> Result<ChromeSession, RenderError> {
        let executable = self.find_executable()?;
        let profile = tempfile::Builder::new()
            .prefix("sidecar-profile-")
            .tempdir()
            .map_err(|e| RenderError::Process(format!("failed to create browser profile: {e}")))?;

        debug!("render"; "launching {}", executable.display());
        let mut child = Command::new(&executable)
            .args(DEFAULT_FLAGS)
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .args(&self.args)
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RenderError::Process(format!("failed to start `{}`: {e}", executable.display()))
            })?;

        let connected = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::Process("browser stderr was not captured".into()))
            .and_then(|stderr| wait_for_endpoint(stderr, self.timeout))
            .and_then(|endpoint| Connection::connect(&endpoint, self.timeout));

        match connected {
            Ok(conn) => Ok(ChromeSession {
                child,
                conn: Arc::new(Mutex::new(conn)),
                timeout: self.timeout,
                closed: false,
                _profile: profile,
            }),
            Err(e) => {
                kill(&mut child);
                Err(e)
            }
        }
    }
}

impl Browser for ChromeBrowser {
    fn launch(&self) -> Result<Box<dyn Session>, RenderError> {
        let mut attempt = 0;
        loop {
            match self.launch_once() {
                Ok(session) => return Ok(Box::new(session)),
                Err(e) if attempt < self.launch_retries => {
                    attempt += 1;
                    log!(
                        "warning";
                        "browser launch failed ({e}), retrying {}/{}",
                        attempt,
                        self.launch_retries
                    );
                    thread::sleep(RETRY_BACKOFF * attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Read stderr until the DevTools endpoint is announced.
///
/// The reader thread keeps draining stderr afterwards so the browser never
/// blocks on a full pipe.
fn wait_for_endpoint(stderr: ChildStderr, timeout: Duration) -> Result<String, RenderError> {
    let (tx, rx) = channel::bounded(1);

    thread::spawn(move || {
        let mut tx = Some(tx);
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            match line.strip_prefix(ENDPOINT_PREFIX) {
                Some(endpoint) => {
                    if let Some(tx) = tx.take() {
                        let _ = tx.send(endpoint.trim().to_string());
                    }
                }
                None => debug!("chrome"; "{}", line),
            }
        }
    });

    rx.recv_timeout(timeout).map_err(|e| match e {
        RecvTimeoutError::Timeout => RenderError::Process(format!(
            "browser did not report a DevTools endpoint within {}s",
            timeout.as_secs()
        )),
        RecvTimeoutError::Disconnected => {
            RenderError::Process("browser exited before reporting a DevTools endpoint".into())
        }
    })
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Give the process `timeout` to exit on its own, then kill it.
fn wait_or_kill(child: &mut Child, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => thread::sleep(Duration::from_millis(50)),
            Err(_) => break,
        }
    }
    kill(child);
}

// ============================================================================
// Connection
// ============================================================================

/// Request/response channel over the browser WebSocket.
struct Connection {
    socket: WebSocket<TcpStream>,
    next_id: u64,
    timeout: Duration,
}

impl Connection {
    fn connect(endpoint: &str, timeout: Duration) -> Result<Self, RenderError> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            RenderError::Protocol(format!("invalid DevTools endpoint `{endpoint}`: {e}"))
        })?;
        let host = url.host_str().unwrap_or("127.0.0.1");
        let port = url.port_or_known_default().unwrap_or(80);

        let stream = TcpStream::connect((host, port))
            .map_err(|e| RenderError::Process(format!("failed to connect to {host}:{port}: {e}")))?;
        stream
            .set_read_timeout(Some(timeout))
            .and_then(|()| stream.set_write_timeout(Some(timeout)))
            .map_err(|e| RenderError::Process(format!("failed to configure socket: {e}")))?;

        let (socket, _) = tungstenite::client::client(endpoint, stream)
            .map_err(|e| RenderError::Process(format!("DevTools handshake failed: {e}")))?;

        Ok(Self {
            socket,
            next_id: 0,
            timeout,
        })
    }

    /// Send one command and wait for its reply, skipping events.
    fn call(
        &mut self,
        session_id: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value, RenderError> {
        let timeout = self.timeout;
        self.next_id += 1;
        let id = self.next_id;

        let mut request = json!({ "id": id, "method": method, "params": params });
        if let Some(session_id) = session_id {
            request["sessionId"] = Value::String(session_id.to_string());
        }
        self.socket
            .send(Message::Text(request.to_string().into()))
            .map_err(|e| transport_error(method, timeout, e))?;

        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                return Err(RenderError::Timeout {
                    action: method.to_string(),
                    after: timeout,
                });
            }

            let message = self
                .socket
                .read()
                .map_err(|e| transport_error(method, timeout, e))?;
            let Message::Text(text) = message else {
                continue;
            };
            let reply: Value = serde_json::from_str(text.as_str()).map_err(|e| {
                RenderError::Protocol(format!("{method}: malformed message: {e}"))
            })?;
            if reply.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }

            if let Some(error) = reply.get("error") {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                return Err(RenderError::Protocol(format!("{method}: {message}")));
            }
            return Ok(reply.get("result").cloned().unwrap_or(Value::Null));
        }
    }
}

fn transport_error(method: &str, timeout: Duration, error: tungstenite::Error) -> RenderError {
    match error {
        tungstenite::Error::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            RenderError::Timeout {
                action: method.to_string(),
                after: timeout,
            }
        }
        tungstenite::Error::Io(_)
        | tungstenite::Error::ConnectionClosed
        | tungstenite::Error::AlreadyClosed => {
            RenderError::Process(format!("connection to browser lost during {method}"))
        }
        other => RenderError::Protocol(format!("{method}: {other}")),
    }
}

fn string_field(value: &Value, field: &str, method: &str) -> Result<String, RenderError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RenderError::Protocol(format!("{method}: missing `{field}`")))
}

fn decode_data(reply: &Value, method: &str) -> Result<Vec<u8>, RenderError> {
    let data = string_field(reply, "data", method)?;
    STANDARD
        .decode(data)
        .map_err(|e| RenderError::Protocol(format!("{method}: invalid base64 payload: {e}")))
}

// ============================================================================
// Session / Page
// ============================================================================

struct ChromeSession {
    child: Child,
    conn: Arc<Mutex<Connection>>,
    timeout: Duration,
    closed: bool,
    // removed after the process is gone
    _profile: TempDir,
}

impl Session for ChromeSession {
    fn new_page(&mut self) -> Result<Box<dyn Page>, RenderError> {
        let mut conn = self.conn.lock();

        let target = conn.call(None, "Target.createTarget", json!({ "url": "about:blank" }))?;
        let target_id = string_field(&target, "targetId", "Target.createTarget")?;

        let attached = conn.call(
            None,
            "Target.attachToTarget",
            json!({ "targetId": target_id, "flatten": true }),
        )?;
        let session_id = string_field(&attached, "sessionId", "Target.attachToTarget")?;

        conn.call(Some(&session_id), "Page.enable", json!({}))?;
        drop(conn);

        Ok(Box::new(ChromePage {
            conn: Arc::clone(&self.conn),
            target_id,
            session_id,
            closed: false,
        }))
    }

    fn close(&mut self) -> Result<(), RenderError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // the browser may drop the socket before replying
        if let Err(e) = self.conn.lock().call(None, "Browser.close", json!({})) {
            debug!("render"; "Browser.close: {e}");
        }
        wait_or_kill(&mut self.child, self.timeout);
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if !self.closed {
            kill(&mut self.child);
        }
    }
}

struct ChromePage {
    conn: Arc<Mutex<Connection>>,
    target_id: String,
    session_id: String,
    closed: bool,
}

impl ChromePage {
    fn call(&self, method: &str, params: Value) -> Result<Value, RenderError> {
        self.conn.lock().call(Some(&self.session_id), method, params)
    }
}

impl Page for ChromePage {
    fn set_content(&mut self, html: &str) -> Result<(), RenderError> {
        let tree = self.call("Page.getFrameTree", json!({}))?;
        let frame_id = tree
            .pointer("/frameTree/frame/id")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::Protocol("Page.getFrameTree: missing frame id".into()))?
            .to_string();

        self.call(
            "Page.setDocumentContent",
            json!({ "frameId": frame_id, "html": html }),
        )?;
        Ok(())
    }

    fn evaluate(&mut self, expression: &str) -> Result<Value, RenderError> {
        let reply = self.call(
            "Runtime.evaluate",
            json!({
                "expression": expression,
                "awaitPromise": true,
                "returnByValue": true,
            }),
        )?;

        if let Some(details) = reply.get("exceptionDetails") {
            let message = details
                .pointer("/exception/description")
                .and_then(Value::as_str)
                .or_else(|| details.get("text").and_then(Value::as_str))
                .unwrap_or("script exception");
            return Err(RenderError::Render(message.to_string()));
        }
        Ok(reply.pointer("/result/value").cloned().unwrap_or(Value::Null))
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        self.call(
            "Emulation.setDeviceMetricsOverride",
            json!({
                "width": viewport.width,
                "height": viewport.height,
                "deviceScaleFactor": viewport.device_scale_factor,
                "mobile": false,
            }),
        )?;
        Ok(())
    }

    fn screenshot(&mut self, format: OutputFormat, clip: Clip) -> Result<Vec<u8>, RenderError> {
        let format = match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            other => {
                return Err(RenderError::Render(format!(
                    "{other:?} is not a raster format"
                )));
            }
        };

        let reply = self.call(
            "Page.captureScreenshot",
            json!({
                "format": format,
                "clip": {
                    "x": clip.x,
                    "y": clip.y,
                    "width": clip.width,
                    "height": clip.height,
                    "scale": 1,
                },
                "captureBeyondViewport": true,
            }),
        )?;
        decode_data(&reply, "Page.captureScreenshot")
    }

    fn pdf(&mut self, width: f64, height: f64) -> Result<Vec<u8>, RenderError> {
        let reply = self.call(
            "Page.printToPDF",
            json!({
                "paperWidth": width / CSS_DPI,
                "paperHeight": height / CSS_DPI,
                "printBackground": true,
                "marginTop": 0,
                "marginBottom": 0,
                "marginLeft": 0,
                "marginRight": 0,
                "pageRanges": "1",
            }),
        )?;
        decode_data(&reply, "Page.printToPDF")
    }

    fn close(&mut self) -> Result<(), RenderError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.conn.lock().call(
            None,
            "Target.closeTarget",
            json!({ "targetId": self.target_id }),
        )?;
        Ok(())
    }
}
