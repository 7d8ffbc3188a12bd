//! `check-trace`: probe the public site with an HTTP TRACE request and look
//! for version banners in the response headers.
//!
//! A hardened server answers with a bare `Server: Apache`. Anything that
//! names versions or modules is reported as leaking.

use tracing::info;

use super::capture;
use crate::settings::Settings;
use crate::sink::ErrorSink;

const LEAK_MARKERS: &[&str] = &["Server: Apache/", "OpenSSL/", "mod_wsgi/", "Python/", "(FreeBSD)"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceVerdict {
    Safe,
    /// Markers found in the response, in probe order.
    Leaking(Vec<&'static str>),
}

pub fn classify(output: &str) -> TraceVerdict {
    let found: Vec<&'static str> = LEAK_MARKERS
        .iter()
        .copied()
        .filter(|marker| output.contains(marker))
        .collect();
    if found.is_empty() {
        TraceVerdict::Safe
    } else {
        TraceVerdict::Leaking(found)
    }
}

pub fn probe_command(settings: &Settings) -> Vec<String> {
    vec![
        "curl".to_string(),
        "-v".to_string(),
        "-X".to_string(),
        "TRACE".to_string(),
        "--connect-timeout".to_string(),
        settings.connect_timeout_secs.to_string(),
        settings.trace_url.clone(),
    ]
}

pub fn run(settings: &Settings, sink: &dyn ErrorSink) -> Option<TraceVerdict> {
    let argv = probe_command(settings);
    info!(url = %settings.trace_url, "probing with TRACE");

    let out = match capture(&argv, None) {
        Ok(out) => out,
        Err(err) => {
            sink.record(&format!("{:?}", err));
            return None;
        }
    };

    // curl -v writes the exchange to stderr.
    let combined = format!("{}\n{}", out.stdout, out.stderr);
    if !out.success {
        sink.record(combined.trim());
        return None;
    }

    let verdict = classify(&combined);
    match &verdict {
        TraceVerdict::Safe => println!("Everything is safe"),
        TraceVerdict::Leaking(markers) => {
            eprintln!("{}", combined.trim());
            sink.record(&format!("server banner leaks {}", markers.join(", ")));
        }
    }
    Some(verdict)
}
