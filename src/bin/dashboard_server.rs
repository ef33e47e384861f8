//! Dashboard JSON server
//!
//! Serves dashboard views as JSON for a browser front end. Each request
//! carries its own selection in the query string; the dataset is generated
//! once at startup.
//! Run with: cargo run --bin dashboard_server

use anyhow::{Context, Result};
use chrono::NaiveDate;
use energydash::config::{split_list, Config};
use energydash::dashboard::Dashboard;
use energydash::logging::{log, obj, v_str, Domain, Level};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use url::Url;

#[derive(Debug, Default)]
struct Query {
    start: Option<String>,
    end: Option<String>,
    plants: Option<Vec<String>>,
    threshold: Option<String>,
}

fn parse_target(target: &str) -> Result<(String, Query)> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(target))
        .with_context(|| format!("bad request target {}", target))?;
    let mut query = Query::default();
    for (key, value) in url.query_pairs() {
        match &*key {
            "start" => query.start = Some(value.into_owned()),
            "end" => query.end = Some(value.into_owned()),
            "plants" => query.plants = Some(split_list(&value)),
            "threshold" => query.threshold = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok((url.path().to_string(), query))
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("expected YYYY-MM-DD, got {}", s))
    })
    .transpose()
}

fn bad_request(msg: &str) -> (&'static str, String) {
    ("400 BAD REQUEST", json!({ "error": msg }).to_string())
}

fn handle_view(dash: &Dashboard, q: &Query) -> Result<String> {
    let start = parse_date(q.start.as_deref())?;
    let end = parse_date(q.end.as_deref())?;
    let threshold = q
        .threshold
        .as_deref()
        .map(|t| t.parse::<f64>().with_context(|| format!("threshold must be a number, got {}", t)))
        .transpose()?;
    let selection = dash.selection(start, end, q.plants.as_deref(), threshold)?;
    Ok(dash.compute(&selection).to_json())
}

fn handle_plants(dash: &Dashboard, q: &Query) -> Result<String> {
    let range = dash.dataset().range;
    let start = parse_date(q.start.as_deref())?.unwrap_or(range.start());
    let end = parse_date(q.end.as_deref())?.unwrap_or(range.end());
    Ok(dash.plants_in(start, end)?.to_string())
}

fn route(dash: &Dashboard, request_line: &str) -> (&'static str, String) {
    let mut parts = request_line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(m), Some(t)) => (m, t),
        _ => return bad_request("malformed request line"),
    };
    if method != "GET" {
        return ("405 METHOD NOT ALLOWED", json!({ "error": "only GET is supported" }).to_string());
    }
    let (path, query) = match parse_target(target) {
        Ok(parsed) => parsed,
        Err(err) => return bad_request(&err.to_string()),
    };

    let result = match path.as_str() {
        "/api/health" => Ok(json!({ "status": "ok" }).to_string()),
        "/api/view" => handle_view(dash, &query),
        "/api/plants" => handle_plants(dash, &query),
        _ => return ("404 NOT FOUND", json!({ "error": "not found" }).to_string()),
    };
    match result {
        Ok(body) => ("200 OK", body),
        Err(err) => {
            log(
                Level::Warn,
                Domain::Session,
                "request_rejected",
                obj(&[("path", v_str(&path)), ("msg", v_str(&format!("{:#}", err)))]),
            );
            bad_request(&format!("{:#}", err))
        }
    }
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let port = cfg.port;
    let dash = Dashboard::new(cfg)?;
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port))
        .with_context(|| format!("failed to bind port {}", port))?;

    log(
        Level::Info,
        Domain::System,
        "server_started",
        obj(&[("addr", v_str(&format!("http://localhost:{}", port)))]),
    );
    println!("Dashboard server running at http://localhost:{}", port);
    println!();
    println!("Endpoints:");
    println!("  GET /api/view?start=&end=&plants=&threshold=  - Dashboard view as JSON");
    println!("  GET /api/plants?start=&end=                   - Plants available in range");
    println!("  GET /api/health                               - Health check");
    println!();

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };

        let request_line = match BufReader::new(&stream).lines().next() {
            Some(Ok(line)) => line,
            _ => continue,
        };

        let (status, body) = route(&dash, &request_line);
        let response = format!(
            "HTTP/1.1 {}\r\n\
             Content-Type: application/json\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Content-Length: {}\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let _ = stream.write_all(response.as_bytes());
    }
    Ok(())
}
