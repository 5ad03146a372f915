//! Minimal HTTP/1.1 server for exercising the curl transport.
//!
//! Routes:
//! - `/ok/...` 200 with an HTML body naming the path
//! - `/echo` 200 echoing the method and request body
//! - `/busy` 429 for the first two hits, then 200
//! - `/slow` waits two seconds before answering 200
//! - `/redirect` 302 to `/ok/landed`
//!
//! Every response closes the connection.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Handle to a running test server.
#[derive(Clone)]
pub struct TestServer {
    base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl TestServer {
    /// Full URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// How many requests were received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &hits));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

struct Incoming {
    method: String,
    path: String,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Incoming> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = std::str::from_utf8(&data[..header_end]).ok()?.to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    Some(Incoming { method, path, body })
}

fn respond(stream: &mut TcpStream, status: &str, extra: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status,
        content_type,
        body.len(),
        extra
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn handle(mut stream: TcpStream, hits: &Mutex<HashMap<String, usize>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    let count = {
        let mut hits = hits.lock().unwrap();
        let n = hits.entry(req.path.clone()).or_insert(0);
        *n += 1;
        *n
    };
    let html = "text/html; charset=UTF-8";

    match req.path.as_str() {
        "/echo" => {
            let mut body = format!("{} ", req.method).into_bytes();
            body.extend_from_slice(&req.body);
            respond(&mut stream, "200 OK", "", "application/json; charset=utf-8", &body);
        }
        "/busy" if count <= 2 => {
            respond(&mut stream, "429 Too Many Requests", "", html, b"slow down");
        }
        "/busy" => respond(&mut stream, "200 OK", "", html, b"finally"),
        "/slow" => {
            thread::sleep(Duration::from_secs(2));
            respond(&mut stream, "200 OK", "", html, b"late");
        }
        "/redirect" => respond(
            &mut stream,
            "302 Found",
            "Location: /ok/landed\r\n",
            html,
            b"",
        ),
        path if path.starts_with("/ok") => {
            let body = format!("<p>{}</p>", path).into_bytes();
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n",
                html,
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            if req.method != "HEAD" {
                let _ = stream.write_all(&body);
            }
        }
        _ => respond(&mut stream, "404 Not Found", "", html, b"missing"),
    }
}
