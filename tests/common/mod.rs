//! Shared test infrastructure: a loopback fake Octane server and a runner
//! for the compiled binary.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

/// One request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    /// Header names are lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Clone)]
struct CannedResponse {
    status: u16,
    body: String,
    extra_headers: Vec<(String, String)>,
}

/// Route table keyed by `"METHOD target"`; unknown routes answer 404.
#[derive(Default)]
pub struct FakeOctaneBuilder {
    routes: BTreeMap<String, CannedResponse>,
}

impl FakeOctaneBuilder {
    pub fn route(mut self, method: &str, target: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            format!("{method} {target}"),
            CannedResponse {
                status,
                body: body.to_string(),
                extra_headers: Vec::new(),
            },
        );
        self
    }

    pub fn sign_in(mut self) -> Self {
        self.routes.insert(
            "POST /authentication/sign_in".to_string(),
            CannedResponse {
                status: 200,
                body: String::new(),
                extra_headers: vec![(
                    "Set-Cookie".to_string(),
                    "LWSSO_COOKIE_KEY=test-session; Path=/".to_string(),
                )],
            },
        );
        self
    }

    pub fn start(self) -> FakeOctane {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = self.routes;
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    continue;
                };
                serve(stream, &routes, &recorded);
            }
        });
        FakeOctane {
            base_url: format!("http://{addr}"),
            requests,
        }
    }
}

pub struct FakeOctane {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeOctane {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }

    pub fn find(&self, method: &str, target: &str) -> Option<RecordedRequest> {
        self.requests()
            .into_iter()
            .find(|request| request.method == method && request.target == target)
    }
}

/// Requests are logged before the response goes out, so the log is complete
/// once the client has seen every answer.
fn serve(
    stream: TcpStream,
    routes: &BTreeMap<String, CannedResponse>,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> Option<()> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = BTreeMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).ok()?;

    let route_key = format!("{method} {target}");
    recorded.lock().expect("request log").push(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    let response = routes
        .get(&route_key)
        .cloned()
        .unwrap_or(CannedResponse {
            status: 404,
            body: r#"{"error_code":"platform.not_found"}"#.to_string(),
            extra_headers: Vec::new(),
        });
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason(response.status),
        response.body.len()
    );
    for (name, value) in &response.extra_headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let mut stream = stream;
    stream.write_all(head.as_bytes()).ok()?;
    stream.write_all(response.body.as_bytes()).ok()?;
    stream.flush().ok()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Write a config file pointing at `server` and return its path.
pub fn write_config(dir: &Path, server: &str) -> PathBuf {
    let conf_dir = dir.join("conf");
    std::fs::create_dir_all(&conf_dir).expect("create conf dir");
    let path = conf_dir.join("config.json");
    let config = serde_json::json!({
        "octane": {
            "server": server,
            "sharedSpace": 1001,
            "workspace": 1002,
            "user": "sa@nga",
            "password": "Welcome1",
            "headers": {"HPECLIENTTYPE": "HPE_REST_API_TECH_PREVIEW"}
        }
    });
    std::fs::write(&path, config.to_string()).expect("write config");
    path
}

/// Run the binary from `cwd` with the given extra arguments.
pub fn run_binary(cwd: &Path, args: &[&str]) -> Output {
    run_binary_with_log(cwd, args, Some("info"))
}

/// Like [`run_binary`], with `RUST_LOG` set to `filter` or removed when `None`.
pub fn run_binary_with_log(cwd: &Path, args: &[&str], filter: Option<&str>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_octane-commands"));
    command.args(args).current_dir(cwd);
    match filter {
        Some(filter) => command.env("RUST_LOG", filter),
        None => command.env_remove("RUST_LOG"),
    };
    command.output().expect("run octane-commands")
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
    serde_json::from_str(&text).expect("parse report JSON")
}
