//! Minimal HTTP/1.1 server emulating the archive API for integration tests.
//!
//! Serves a fixed catalog under `/api/v1/`: token handshake, paged listing,
//! image detail, segmentation lookup, image download and mask download.
//! Every request except the handshake must carry the issued `Girder-Token`.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

pub const TOKEN: &str = "test-token-123";

#[derive(Debug, Clone, Copy)]
pub struct ArchiveServerOptions {
    /// If true, the handshake answers 401.
    pub reject_login: bool,
    /// Number of images in the catalog (`img0`, `img1`, ...).
    pub images: usize,
}

impl Default for ArchiveServerOptions {
    fn default() -> Self {
        Self {
            reject_login: false,
            images: 5,
        }
    }
}

/// Handle to a running server.
pub struct ArchiveServer {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl ArchiveServer {
    /// Number of requests served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Request targets seen so far, in arrival order.
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

/// Bytes served for an image download.
pub fn image_bytes(id: &str) -> Vec<u8> {
    format!("JPEG-IMAGE-{}", id).into_bytes()
}

/// Bytes served for a mask download.
pub fn mask_bytes(id: &str) -> Vec<u8> {
    format!("JPEG-MASK-{}", id).into_bytes()
}

/// Image `i` has `i % 3` segmentations: `seg-img{i}-{k}`.
pub fn segmentation_ids(i: usize) -> Vec<String> {
    (0..i % 3).map(|k| format!("seg-img{}-{}", i, k)).collect()
}

pub fn start(opts: ArchiveServerOptions) -> ArchiveServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(AtomicUsize::new(0));
    let paths = Arc::new(Mutex::new(Vec::new()));
    let server = ArchiveServer {
        base_url: format!("http://127.0.0.1:{}/api/v1/", port),
        requests: Arc::clone(&requests),
        paths: Arc::clone(&paths),
    };
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let requests = Arc::clone(&requests);
            let paths = Arc::clone(&paths);
            thread::spawn(move || handle(stream, opts, &requests, &paths));
        }
    });
    server
}

fn handle(
    mut stream: TcpStream,
    opts: ArchiveServerOptions,
    requests: &AtomicUsize,
    paths: &Mutex<Vec<String>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let Some(request) = read_head(&mut stream) else {
        return;
    };
    let (target, headers) = parse_request(&request);
    requests.fetch_add(1, Ordering::SeqCst);
    paths.lock().unwrap().push(target.clone());

    let url = url::Url::parse(&format!("http://local{}", target)).unwrap();
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    let path = url.path().trim_start_matches("/api/v1/").to_string();
    let segments: Vec<&str> = path.split('/').collect();

    if segments == ["user", "authentication"] {
        let has_basic = headers
            .get("authorization")
            .map(|v| v.starts_with("Basic "))
            .unwrap_or(false);
        if opts.reject_login || !has_basic {
            return respond(&mut stream, "401 Unauthorized", "application/json", b"{\"message\":\"Login failed.\"}");
        }
        let body = format!("{{\"authToken\":{{\"token\":\"{}\",\"expires\":\"2030-01-01\"}},\"user\":{{}}}}", TOKEN);
        return respond(&mut stream, "200 OK", "application/json", body.as_bytes());
    }

    if headers.get("girder-token").map(String::as_str) != Some(TOKEN) {
        return respond(&mut stream, "401 Unauthorized", "application/json", b"{}");
    }

    let index_of = |id: &str| -> Option<usize> {
        id.strip_prefix("img")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n < opts.images)
    };

    match segments.as_slice() {
        ["image"] => {
            let limit: usize = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(50);
            let offset: usize = query.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
            let end = (offset + limit).min(opts.images);
            let items: Vec<String> = (offset.min(end)..end)
                .map(|i| format!("{{\"_id\":\"img{}\",\"name\":\"ISIC_{:07}\"}}", i, i))
                .collect();
            let body = format!("[{}]", items.join(","));
            respond(&mut stream, "200 OK", "application/json", body.as_bytes())
        }
        ["image", id] => match index_of(*id) {
            Some(i) => {
                let label = if i % 2 == 0 { "benign" } else { "malignant" };
                let body = format!(
                    "{{\"_id\":\"{}\",\"name\":\"ISIC_{:07}\",\"meta\":{{\"clinical\":{{\"benign_malignant\":\"{}\"}}}}}}",
                    id, i, label
                );
                respond(&mut stream, "200 OK", "application/json", body.as_bytes())
            }
            None => respond(&mut stream, "404 Not Found", "application/json", b"{}"),
        },
        ["segmentation"] => {
            let items: Vec<String> = query
                .get("imageId")
                .and_then(|id| index_of(id.as_str()))
                .map(segmentation_ids)
                .unwrap_or_default()
                .into_iter()
                .map(|sid| format!("{{\"_id\":\"{}\",\"skill\":\"expert\"}}", sid))
                .collect();
            let body = format!("[{}]", items.join(","));
            respond(&mut stream, "200 OK", "application/json", body.as_bytes())
        }
        ["image", id, "download"] => match index_of(*id) {
            Some(_) => respond(&mut stream, "200 OK", "image/jpeg", &image_bytes(id)),
            None => respond(&mut stream, "404 Not Found", "application/json", b"{}"),
        },
        ["segmentation", sid, "mask"] => {
            if sid.starts_with("seg-img") {
                respond(&mut stream, "200 OK", "image/jpeg", &mask_bytes(sid))
            } else {
                respond(&mut stream, "404 Not Found", "application/json", b"{}")
            }
        }
        _ => respond(&mut stream, "404 Not Found", "application/json", b"{}"),
    }
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Read until the end of the request head (GET requests carry no body).
fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8(data).ok()
}

/// Returns (request target, lowercase header map).
fn parse_request(request: &str) -> (String, HashMap<String, String>) {
    let mut lines = request.lines();
    let target = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let mut headers = HashMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    (target, headers)
}
