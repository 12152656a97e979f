//! Log-drain HTTP endpoint.
//!
//! `POST /?app_name=...` with a newline-delimited body of drain lines.
//!
//! - Query parameters are validated before the body is touched; a request
//!   without a usable `app_name` is rejected and nothing is recorded.
//! - The body is streamed and framed line by line, so memory stays bounded by
//!   `collector.max_line_bytes` regardless of request size.
//! - Each line is handled independently: a line that does not fit the drain
//!   grammar is skipped silently, a line that fails to decode is logged and
//!   skipped, and neither affects the lines around it.

use axum::{
    body::Body,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;

use drainpipe_core::error::DrainError;
use drainpipe_core::protocol::dimensions_from_params;
use drainpipe_core::Dimensions;

use crate::app_state::AppState;
use crate::transport::lines::{Frame, LineSplitter};
use crate::transport::error_response;

// --------------------
// Per-request line accounting
// --------------------
#[derive(Debug, Default)]
struct IngestStats {
    parsed: u64,
    skipped: u64,
    decode_errors: u64,
    samples: u64,
}

impl IngestStats {
    fn record(&self, app: &AppState) {
        let m = app.metrics();
        m.log_lines.add(&[("result", "parsed")], self.parsed);
        m.log_lines.add(&[("result", "skipped")], self.skipped);
        m.log_lines.add(&[("result", "decode_error")], self.decode_errors);
    }
}

// --------------------
// Entry
// --------------------
pub async fn drain(
    State(app): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    body: Body,
) -> Response {
    let external = match dimensions_from_params(&params) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "rejecting drain request");
            app.metrics().drain_requests.inc(&[("outcome", "rejected")]);
            return error_response(&e);
        }
    };

    let mut splitter = LineSplitter::new(app.cfg().collector.max_line_bytes);
    let mut frames = Vec::new();
    let mut stats = IngestStats::default();
    let mut stream = body.into_data_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                // lines already applied stay applied
                tracing::warn!(error = %e, lines = stats.parsed, "drain body aborted");
                stats.record(&app);
                app.metrics().drain_requests.inc(&[("outcome", "aborted")]);
                let err = DrainError::BadRequest(format!("body read failed: {e}"));
                return error_response(&err);
            }
        };

        splitter.push(&chunk, &mut frames);
        for frame in frames.drain(..) {
            ingest(&app, frame, &external, &mut stats);
        }
    }
    if let Some(frame) = splitter.finish() {
        ingest(&app, frame, &external, &mut stats);
    }

    stats.record(&app);
    app.metrics().drain_requests.inc(&[("outcome", "accepted")]);
    tracing::debug!(
        parsed = stats.parsed,
        skipped = stats.skipped,
        decode_errors = stats.decode_errors,
        samples = stats.samples,
        "drain request handled"
    );

    StatusCode::NO_CONTENT.into_response()
}

fn ingest(app: &AppState, frame: Frame, external: &Dimensions, stats: &mut IngestStats) {
    let raw = match frame {
        Frame::Line(raw) => raw,
        Frame::Oversized => {
            let max = app.cfg().collector.max_line_bytes;
            tracing::error!(max_line_bytes = max, "drain line too long, skipping");
            stats.decode_errors += 1;
            return;
        }
    };

    let text = match std::str::from_utf8(&raw) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "drain line is not valid utf-8, skipping");
            stats.decode_errors += 1;
            return;
        }
    };

    let line = match app.line_parser().parse(text) {
        Ok(Some(line)) => line,
        Ok(None) => {
            tracing::trace!("line does not match drain format");
            stats.skipped += 1;
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to decode drain line");
            stats.decode_errors += 1;
            return;
        }
    };

    let (samples, dims) = app.extractor().extract(&line, external);
    for s in &samples {
        if app.registry().update(s, &dims) {
            app.metrics().samples.inc(&[("kind", s.kind.as_str())]);
            stats.samples += 1;
        }
    }

    stats.parsed += 1;
}
