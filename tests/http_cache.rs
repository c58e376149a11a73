use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use talaga_terminal::http_cache::{cache_busted, fetch_text_revalidate};

#[test]
fn busting_parameter_respects_existing_query() {
    assert_eq!(
        cache_busted("https://x.example.com/equipos.json", 42),
        "https://x.example.com/equipos.json?_=42"
    );
    assert_eq!(
        cache_busted("https://x.example.com/api?v=2", 42),
        "https://x.example.com/api?v=2&_=42"
    );
}

/// Answer the first request with a tagged body and the second with 304.
fn tagged_server() -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let responses = [
            "HTTP/1.1 200 OK\r\nETag: \"v1\"\r\nContent-Length: 7\r\nConnection: close\r\n\r\n{\"a\":1}",
            "HTTP/1.1 304 Not Modified\r\nETag: \"v1\"\r\nConnection: close\r\n\r\n",
        ];
        for response in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap_or(0);
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let _ = stream.write_all(response.as_bytes());
            let _ = tx.send(String::from_utf8_lossy(&buf).to_lowercase());
        }
    });
    (base, rx)
}

#[test]
fn not_modified_reuses_the_stored_body() {
    let (base, requests) = tagged_server();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let url = format!("{base}/equipos-{stamp}.json");
    let client = Client::new();

    let first = fetch_text_revalidate(&client, &url).unwrap();
    assert_eq!(first.body, "{\"a\":1}");
    assert!(first.changed);

    let second = fetch_text_revalidate(&client, &url).unwrap();
    assert_eq!(second.body, first.body);
    assert!(!second.changed);

    let first_request = requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(first_request.starts_with(&format!("get /equipos-{stamp}.json?_=")));
    let second_request = requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(second_request.contains("if-none-match: \"v1\""));
}
