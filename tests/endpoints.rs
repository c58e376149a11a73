use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use talaga_terminal::config::AppConfig;
use talaga_terminal::endpoints::{
    EndpointCandidate, SaveKind, candidates_from_config, post_first_success,
};

/// Serve one request with `status` and hand the raw request back.
fn one_shot_server(status: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if request_complete(&buf) {
                break;
            }
        }
        let response = format!("HTTP/1.1 {status}\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{{}}");
        let _ = stream.write_all(response.as_bytes());
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
    });
    (base, rx)
}

fn request_complete(buf: &[u8]) -> bool {
    let text = String::from_utf8_lossy(buf);
    let Some((head, body)) = text.split_once("\r\n\r\n") else {
        return false;
    };
    let length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    body.len() >= length
}

fn closed_port_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn candidate(base: &str) -> EndpointCandidate {
    EndpointCandidate {
        base: base.to_string(),
        result_path: "/api/guardar-resultado".to_string(),
        history_path: "/api/guardar-historial-completo".to_string(),
    }
}

#[test]
fn candidates_follow_detection_order() {
    let config = AppConfig {
        match_data: "https://talaga.example.com/data/equipos.json".to_string(),
        ..AppConfig::default()
    };
    let urls: Vec<String> = candidates_from_config(&config)
        .iter()
        .map(|c| c.url(SaveKind::Result))
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://talaga.example.com/api/guardar-resultado",
            "http://localhost:8083/guardar-resultado",
        ]
    );
}

#[test]
fn same_origin_candidate_is_not_repeated() {
    let config = AppConfig {
        match_data: "equipos.json".to_string(),
        site_base: Some("https://talaga.example.com".to_string()),
        save_api_base: Some("https://api.example.com/".to_string()),
        ..AppConfig::default()
    };
    let bases: Vec<String> = candidates_from_config(&config)
        .into_iter()
        .map(|c| c.base)
        .collect();
    assert_eq!(
        bases,
        vec![
            "https://api.example.com",
            "https://talaga.example.com",
            "http://localhost:8083",
        ]
    );

    let config = AppConfig {
        site_base: Some("https://talaga.example.com".to_string()),
        ..AppConfig::default()
    };
    assert_eq!(candidates_from_config(&config).len(), 2);
}

#[test]
fn falls_through_to_the_first_working_server() {
    let (failing, _failing_rx) = one_shot_server("500 Internal Server Error");
    let (working, working_rx) = one_shot_server("200 OK");
    let candidates = vec![
        candidate(&closed_port_base()),
        candidate(&failing),
        candidate(&working),
    ];

    let client = Client::new();
    let url = post_first_success(&client, &candidates, SaveKind::History, &[1, 2, 3])
        .expect("third candidate accepts");
    assert_eq!(url, format!("{working}/api/guardar-historial-completo"));

    let request = working_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("server saw the request");
    assert!(request.starts_with("POST /api/guardar-historial-completo"));
    assert!(request.ends_with("[1,2,3]"));
}

#[test]
fn reports_every_failed_candidate() {
    let first = closed_port_base();
    let second = closed_port_base();
    let candidates = vec![candidate(&first), candidate(&second)];
    let err = post_first_success(&Client::new(), &candidates, SaveKind::Result, &"x")
        .expect_err("nothing is listening");
    let message = format!("{err:#}");
    assert!(message.contains(&first));
    assert!(message.contains(&second));

    let err = post_first_success(&Client::new(), &[], SaveKind::Result, &"x").unwrap_err();
    assert!(err.to_string().contains("no result save endpoint"));
}
