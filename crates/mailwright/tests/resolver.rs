//! Integration tests for the default resolver against a local HTTP stub.

#![allow(clippy::unwrap_used)]

mod common;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::{Duration, Instant};

use common::fixture;
use mailwright::{ComposeConfig, ComposeConfigBuilder, DefaultResolver, Email, Error, Resolver, Resource};

/// Serves `connections` requests with a canned response and returns the
/// listening address.
fn serve(response: Vec<u8>, connections: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming().take(connections) {
            let Ok(mut stream) = stream else { continue };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        }
    });

    addr
}

/// Resolver settings that talk to the local stub directly.
fn local_config() -> ComposeConfigBuilder {
    ComposeConfig::builder().use_system_proxy(false)
}

fn local_resolver() -> DefaultResolver {
    DefaultResolver::new(&local_config().build())
}

fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

#[test]
fn test_fetch_ok_uses_response_content_type() {
    let addr = serve(http_response("200 OK", "image/png", b"\x89PNG"), 1);
    let resolver = local_resolver();

    let resolved = resolver
        .resolve(&Resource::url(&format!("http://{addr}/logo")))
        .unwrap();
    assert_eq!(resolved.bytes, b"\x89PNG");
    assert_eq!(resolved.content_type.essence(), "image/png");
}

#[test]
fn test_fetch_not_found_is_unreachable() {
    let addr = serve(http_response("404 Not Found", "text/plain", b"nope"), 1);
    let resolver = local_resolver();

    let result = resolver.resolve(&Resource::url(&format!("http://{addr}/missing.gif")));
    assert!(matches!(result, Err(Error::UnreachableResource { .. })));
}

#[test]
fn test_fetch_refused_is_unreachable() {
    // Bind then drop to get a port nobody listens on
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let resolver = local_resolver();

    let result = resolver.resolve(&Resource::url(&format!("http://{addr}/x.gif")));
    assert!(matches!(result, Err(Error::UnreachableResource { .. })));
}

#[test]
fn test_fetch_timeout_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and hold the connection without answering
    let handle = thread::spawn(move || {
        let conn = listener.accept();
        thread::sleep(Duration::from_secs(3));
        drop(conn);
    });

    let config = local_config()
        .fetch_timeout(Duration::from_millis(300))
        .build();
    let resolver = DefaultResolver::new(&config);
    let result = resolver.resolve(&Resource::url(&format!("http://{addr}/slow.gif")));
    assert!(matches!(result, Err(Error::UnreachableResource { .. })));
    handle.join().unwrap();
}

#[test]
fn test_fetch_over_size_limit() {
    let addr = serve(http_response("200 OK", "application/octet-stream", &[0u8; 64]), 1);
    let config = local_config().max_resource_size(16).build();
    let resolver = DefaultResolver::new(&config);

    let result = resolver.resolve(&Resource::url(&format!("http://{addr}/big.bin")));
    assert!(matches!(
        result,
        Err(Error::ResourceTooLarge { size: 64, limit: 16, .. })
    ));
}

#[test]
fn test_fetch_without_content_length_stops_at_size_limit() {
    let mut response =
        b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n"
            .to_vec();
    response.extend(std::iter::repeat_n(0u8, 4 * 1024 * 1024));
    let addr = serve(response, 1);
    let config = local_config()
        .max_resource_size(16)
        .fetch_timeout(Duration::from_secs(10))
        .build();
    let resolver = DefaultResolver::new(&config);

    let started = Instant::now();
    let result = resolver.resolve(&Resource::url(&format!("http://{addr}/stream.bin")));
    assert!(matches!(
        result,
        Err(Error::ResourceTooLarge { size: 17, limit: 16, .. })
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_fetch_without_content_length_within_limit() {
    let response =
        b"HTTP/1.1 200 OK\r\nContent-Type: image/gif\r\nConnection: close\r\n\r\nGIF89a".to_vec();
    let addr = serve(response, 1);
    let resolver = DefaultResolver::new(&local_config().max_resource_size(16).build());

    let resolved = resolver
        .resolve(&Resource::url(&format!("http://{addr}/small.gif")))
        .unwrap();
    assert_eq!(resolved.bytes, b"GIF89a");
}

#[test]
fn test_file_url_reads_from_disk() {
    let url = url::Url::from_file_path(fixture("testfile.txt")).unwrap();
    let resolver = local_resolver();
    let resolved = resolver.resolve(&Resource::from(url)).unwrap();
    assert!(resolved.bytes.starts_with(b"This is a test file"));
    assert_eq!(resolved.content_type.essence(), "text/plain");
}

#[test]
fn test_embed_through_default_resolver() {
    let addr = serve(http_response("200 OK", "image/gif", b"GIF89a"), 1);
    let mut email = Email::html().with_config(local_config().build());
    email
        .set_from("me@apache.org")
        .unwrap()
        .add_to("you@apache.org")
        .unwrap();

    let url = format!("http://{addr}/images/feather.gif");
    let first = email.embed(&Resource::url(&url), Some("feather")).unwrap();
    // The stub answers once, so this must come from the registry
    let second = email.embed(&Resource::url(&url), Some("feather")).unwrap();
    assert_eq!(first, second);

    let message = email.build().unwrap();
    assert_eq!(message.part_count(), 1);
    assert_eq!(message.part(0).unwrap().content_type.essence(), "image/gif");
}
