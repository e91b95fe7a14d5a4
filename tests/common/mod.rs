#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use httpmetrics::collectors::{HttpCollector, HttpCollectorPlugin, MetricConfig, MetricSourceType, SourceDescriptor};
use httpmetrics::error::ConfigError;

/// Minimal HTTP/1.1 responder on a random local port. Replies with the
/// scripted responses in order and repeats the last one afterwards.
pub struct StubServer {
    pub addr: String,
    hits: Arc<AtomicUsize>,
}

impl StubServer {
    pub fn start(responses: Vec<(u16, &'static str)>) -> Self {
        assert!(!responses.is_empty());
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address").to_string();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)];
                let _ = respond(stream, status, body);
            }
        });

        Self { addr, hits }
    }

    pub fn ok(body: &'static str) -> Self {
        Self::start(vec![(200, body)])
    }

    pub fn url(&self) -> String {
        format!("http://{}/metrics", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn respond(stream: TcpStream, status: u16, body: &str) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 || line == "\r\n" {
            break;
        }
    }

    let reason = if status == 200 { "OK" } else { "Stub" };
    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}

/// An address nothing is listening on.
pub fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    format!("http://{addr}/metrics")
}

pub fn metric_config(pairs: &[(&str, &str)]) -> MetricConfig {
    metric_config_of(MetricSourceType::External, pairs)
}

pub fn metric_config_of(kind: MetricSourceType, pairs: &[(&str, &str)]) -> MetricConfig {
    let config: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    MetricConfig::new(kind, config)
}

pub fn build_collector(pairs: &[(&str, &str)]) -> Result<HttpCollector, ConfigError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("build http client");
    HttpCollectorPlugin::with_client(client).build(
        &SourceDescriptor::new("test", "collector"),
        &metric_config(pairs),
        Duration::from_secs(30),
    )
}

pub fn collector_for(server: &StubServer, json_path: &str) -> HttpCollector {
    build_collector(&[("endpoint", server.url().as_str()), ("json-path", json_path)]).expect("valid collector config")
}
