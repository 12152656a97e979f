//! Drain line grammar vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::DateTime;

use drainpipe_core::protocol::LineParser;

use vector_loader::{load, ALL};

#[test]
fn line_vectors() {
    let parser = LineParser::new().unwrap();

    for f in ALL {
        let v = load(f);
        let res = parser.parse(&v.line);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let parsed = res.expect("expected no error");

        if v.expect_skip {
            assert!(parsed.is_none(), "vector={}", v.description);
            continue;
        }

        let line = parsed.expect("expected a parsed line");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(line.priority, ex.priority, "vector={}", v.description);
        assert_eq!(line.version, ex.version, "vector={}", v.description);
        assert_eq!(
            line.timestamp,
            DateTime::parse_from_rfc3339(&ex.timestamp).unwrap(),
            "vector={}",
            v.description
        );
        assert_eq!(line.hostname, ex.hostname, "vector={}", v.description);
        assert_eq!(line.app_name, ex.app_name, "vector={}", v.description);
        assert_eq!(line.proc_id, ex.proc_id, "vector={}", v.description);
        assert_eq!(line.message, ex.message, "vector={}", v.description);
    }
}

#[test]
fn octet_count_prefix_is_optional() {
    let parser = LineParser::new().unwrap();
    let line = parser
        .parse("<45>1 2019-12-11T22:29:21Z host heroku web.1 - sample#load_avg_1m=0.00")
        .unwrap()
        .expect("matches without the octet count");
    assert_eq!(line.proc_id, "web.1");
    assert_eq!(line.message, "sample#load_avg_1m=0.00");
}

#[test]
fn empty_message_still_parses() {
    let parser = LineParser::new().unwrap();
    let line = parser
        .parse("<45>1 2019-12-11T22:29:21+00:00 host heroku web.1 - ")
        .unwrap()
        .expect("empty message");
    assert_eq!(line.message, "");
}
