// Shared fixtures for CLI integration tests
//
// A tiny blocking HTTP server standing in for both the origin API and the
// provider resource host. Each connection gets the canned answer of the first
// route matching its request path, then the connection is closed. Every
// request line and its headers are recorded for later inspection.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

/// Encoded `sourceUrl` that decodes to `/apivtwo/clock?id=7`
pub const SOURCE_ID_7: &str = "--175948514e4c4f57175b54575b5307515c050f";
/// Encoded `sourceUrl` that decodes to `/apivtwo/clock?id=8`
pub const SOURCE_ID_8: &str = "--175948514e4c4f57175b54575b5307515c0500";
/// Encoded `sourceUrl` that decodes to `/apivtwo/clock?id=9`
pub const SOURCE_ID_9: &str = "--175948514e4c4f57175b54575b5307515c0501";

pub const PROVIDER_BODY: &str = r#"{"links":[
    {"link":"https://cdn.kraken.example/ep1/master.m3u8","resolutionStr":"1080p","hls":true},
    {"link":"https://cdn.kraken.example/ep1/low.mp4","resolutionStr":"480p"}
]}"#;

pub const SHOW_BODY: &str =
    r#"{"data":{"show":{"_id":"abc","availableEpisodesDetail":{"sub":["3","1","2"]}}}}"#;

/// GraphQL `episode` answer listing the given `sourceUrl` values
pub fn episode_body(sources: &[&str]) -> String {
    let urls: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(i, url)| {
            format!(
                r#"{{"sourceUrl":"{}","sourceName":"Source-{}","type":"iframe"}}"#,
                url, i
            )
        })
        .collect();
    format!(
        r#"{{"data":{{"episode":{{"episodeString":"1","sourceUrls":[{}]}}}}}}"#,
        urls.join(",")
    )
}

#[derive(Clone)]
struct Route {
    prefix: String,
    needle: Option<String>,
    status: u16,
    body: String,
}

impl Route {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
            && self.needle.as_deref().map_or(true, |n| path.contains(n))
    }
}

/// One request as seen by the fixture
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[derive(Default)]
pub struct FixtureBuilder {
    routes: Vec<Route>,
}

impl FixtureBuilder {
    /// Answer paths starting with `prefix`
    pub fn route(mut self, prefix: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push(Route {
            prefix: prefix.to_string(),
            needle: None,
            status,
            body: body.into(),
        });
        self
    }

    /// Answer paths starting with `prefix` that also contain `needle`
    pub fn route_containing(
        mut self,
        prefix: &str,
        needle: &str,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.routes.push(Route {
            prefix: prefix.to_string(),
            needle: Some(needle.to_string()),
            status,
            body: body.into(),
        });
        self
    }

    pub fn start(self) -> FixtureServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture server");
        let addr = listener.local_addr().expect("fixture address");
        let routes = Arc::new(self.routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let shared = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        let routes = Arc::clone(&routes);
                        let requests = Arc::clone(&shared);
                        thread::spawn(move || handle(stream, &routes, &requests));
                    }
                    Err(_) => break,
                }
            }
        });

        FixtureServer {
            base_url: format!("http://{}", addr),
            requests,
        }
    }
}

pub struct FixtureServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FixtureServer {
    pub fn builder() -> FixtureBuilder {
        FixtureBuilder::default()
    }

    /// Origin answering a one-source episode whose provider lists kraken links
    pub fn standard() -> Self {
        Self::builder()
            .route("/apivtwo", 200, PROVIDER_BODY)
            .route_containing("/api", "availableEpisodesDetail", 200, SHOW_BODY)
            .route("/api", 200, episode_body(&[SOURCE_ID_7]))
            .start()
    }

    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }

    /// Recorded requests whose path starts with `prefix`
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Unknown",
    }
}

fn handle(mut stream: TcpStream, routes: &[Route], requests: &Mutex<Vec<RecordedRequest>>) {
    let mut reader = match stream.try_clone() {
        Ok(s) => BufReader::new(s),
        Err(_) => return,
    };

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    // Requests are GETs without a body
    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => {
                if let Some((name, value)) = line.split_once(':') {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
            }
            Err(_) => return,
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
    let (status, body) = routes
        .iter()
        .find(|route| route.matches(&path))
        .map(|route| (route.status, route.body.clone()))
        .unwrap_or((404, String::from("{}")));

    requests
        .lock()
        .expect("request log")
        .push(RecordedRequest { path, headers });

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Run the binary with a clean proxy environment
pub fn run_cli(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_allanime-extension"));
    command.args(args);
    for key in [
        "HTTP_PROXY",
        "HTTPS_PROXY",
        "ALL_PROXY",
        "http_proxy",
        "https_proxy",
        "all_proxy",
        "ALLANIME_PROXY",
        "ALLANIME_MODE",
        "ALLANIME_API_URL",
        "ALLANIME_RESOURCE_HOST",
        "ALLANIME_TIMEOUT",
        "RUST_LOG",
    ] {
        command.env_remove(key);
    }
    command.env("NO_PROXY", "127.0.0.1,localhost");
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().expect("run allanime-extension")
}

/// Run `stream-url` for show `abc` episode 1 against a fixture
pub fn run_stream_url(server: &FixtureServer) -> Output {
    let api_url = server.api_url();
    run_cli(
        &["stream-url", "--anime", "abc", "--episode", "1"],
        &[
            ("ALLANIME_API_URL", api_url.as_str()),
            ("ALLANIME_RESOURCE_HOST", server.base_url.as_str()),
        ],
    )
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}
