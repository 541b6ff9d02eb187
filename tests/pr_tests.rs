mod common;

use common::*;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

/// One-shot HTTP server answering `status` with `body`; yields the raw request.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
        }

        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len(),
        )
        .unwrap();
        String::from_utf8_lossy(&request).to_string()
    });

    (url, handle)
}

#[test]
fn test_create_pr_opens_pull_request() {
    let temp = TempDir::new().unwrap();
    let (url, server) = serve_once(
        "201 Created",
        r#"{"html_url":"https://github.com/ansible-collections/amazon.aws/pull/12","id":99,"number":12,"commits":2,"changed_files":6}"#,
    );

    let (ok, json) = run_json(
        temp.path(),
        &[
            "create-pr",
            "--repository",
            "ansible-collections/amazon.aws",
            "--head-branch",
            "promote_test",
            "--title",
            "Promote foo",
            "--token",
            "secret-token",
            "--api-url",
            &url,
        ],
    );
    assert!(ok, "{json}");
    assert_eq!(json["changed"], true);
    assert_eq!(json["number"], 12);
    assert_eq!(json["commits"], 2);
    assert!(json.get("msg").is_none());

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /repos/ansible-collections/amazon.aws/pulls "));
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("authorization: bearer secret-token"));
    assert!(lower.contains("x-github-api-version: 2022-11-28"));
    assert!(request.contains(r#""head":"promote_test""#));
    assert!(request.contains(r#""base":"main""#));
}

#[test]
fn test_create_pr_already_exists_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    let (url, server) = serve_once(
        "422 Unprocessable Entity",
        r#"{"message":"Validation Failed","errors":[{"resource":"PullRequest","code":"custom","message":"A pull request already exists for me:promote_test."}]}"#,
    );

    let (ok, json) = run_json(
        temp.path(),
        &[
            "create-pr",
            "--repository",
            "o/r",
            "--fork-owner",
            "me",
            "--fork-branch",
            "promote_test",
            "--title",
            "Promote foo",
            "--token",
            "t",
            "--api-url",
            &url,
        ],
    );
    assert!(ok, "{json}");
    assert_eq!(json["changed"], false);
    assert_eq!(json["msg"], "A pull request already exists for me:promote_test.");

    let request = server.join().unwrap();
    assert!(request.contains(r#""head":"me:promote_test""#));
}

#[test]
fn test_create_pr_api_error() {
    let temp = TempDir::new().unwrap();
    let (url, server) = serve_once(
        "422 Unprocessable Entity",
        r#"{"message":"Validation Failed","errors":[{"resource":"PullRequest","field":"base","code":"invalid"}]}"#,
    );

    let (ok, json) = run_json(
        temp.path(),
        &[
            "create-pr",
            "--repository",
            "o/r",
            "--head-branch",
            "promote_test",
            "--title",
            "Promote foo",
            "--token",
            "t",
            "--api-url",
            &url,
        ],
    );
    server.join().unwrap();

    assert!(!ok);
    assert_eq!(json["failed"], true);
    assert_eq!(json["kind"], "external_api");
    assert_eq!(json["errors"][0]["field"], "base");
}

#[test]
fn test_create_pr_requires_a_head() {
    let temp = TempDir::new().unwrap();

    run_step(
        temp.path(),
        &[
            "create-pr",
            "--repository",
            "o/r",
            "--title",
            "Promote foo",
            "--token",
            "t",
        ],
    )
    .failure()
    .stderr(predicate::str::contains("--head-branch"));
}

#[test]
fn test_create_pr_fork_flags_go_together() {
    let temp = TempDir::new().unwrap();

    run_step(
        temp.path(),
        &[
            "create-pr",
            "--repository",
            "o/r",
            "--fork-owner",
            "me",
            "--title",
            "Promote foo",
            "--token",
            "t",
        ],
    )
    .failure()
    .stderr(predicate::str::contains("--fork-branch"));
}
