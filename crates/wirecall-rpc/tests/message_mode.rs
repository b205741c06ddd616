//! Message-mode exchanges: raw cursors over a stream, no RPC framing.

use std::path::PathBuf;
use std::thread;

use wirecall_message::{InMessage, MessageError, OutMessage};
use wirecall_stream::{Endpoint, ServerSocket, UnixServer};

fn make_sock_path(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/wirecall-msg-{}-{}-{}",
        tag,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir.join("msg.sock")
}

fn always() -> bool {
    true
}

#[test]
fn string_echo_roundtrip() {
    let sock_path = make_sock_path("echo");
    let server = UnixServer::bind(&sock_path).expect("server should bind");

    let server_thread = thread::spawn(move || {
        let mut conn = server.accept(&always).expect("accept should succeed");

        let mut input = InMessage::new();
        assert!(conn.read_message(&mut input, &always).unwrap());
        let request = input.read_str().expect("request should carry a string");

        let mut output = OutMessage::new();
        output.write_str(&format!("{request} processed")).unwrap();
        assert!(conn.write_message(&output, &always).unwrap());

        conn.wait_for_shutdown(&always)
            .expect("client should close after reading the reply");
    });

    let mut client = Endpoint::Unix(sock_path.clone())
        .connect()
        .expect("client should connect");

    let mut output = OutMessage::new();
    output.write_str("hello").unwrap();
    assert!(client.write_message(&output, &always).unwrap());

    let mut input = InMessage::new();
    assert!(client.read_message(&mut input, &always).unwrap());
    assert_eq!(input.read_str().unwrap(), "hello processed");

    client.shutdown().expect("half-close should succeed");
    server_thread.join().expect("server thread should finish");

    if let Some(parent) = sock_path.parent() {
        let _ = std::fs::remove_dir_all(parent);
    }
}

#[test]
fn mixed_payload_roundtrip() {
    let sock_path = make_sock_path("mixed");
    let server = UnixServer::bind(&sock_path).expect("server should bind");

    let blob: Vec<u8> = (0..1024u32).map(|i| (i % 255) as u8).collect();
    let blob_for_server = blob.clone();

    let server_thread = thread::spawn(move || {
        let mut conn = server.accept(&always).expect("accept should succeed");
        let mut input = InMessage::new();
        assert!(conn.read_message(&mut input, &always).unwrap());

        assert_eq!(input.read_u32().unwrap(), 7);
        assert_eq!(input.read_f64().unwrap(), -0.5);
        assert_eq!(input.read_str().unwrap(), "mixed");
        assert_eq!(input.read_blob().unwrap(), blob_for_server);
        assert_eq!(input.remaining(), 0);
    });

    let mut client = Endpoint::Unix(sock_path.clone())
        .connect()
        .expect("client should connect");

    let mut output = OutMessage::new();
    output.write_u32(7).unwrap();
    output.write_f64(-0.5).unwrap();
    output.write_str("mixed").unwrap();
    output.write_blob(&blob).unwrap();
    assert!(client.write_message(&output, &always).unwrap());

    server_thread.join().expect("server thread should finish");

    if let Some(parent) = sock_path.parent() {
        let _ = std::fs::remove_dir_all(parent);
    }
}

#[test]
fn oversize_append_fails_before_any_write() {
    let mut output = OutMessage::new();
    let oversized = vec![0u8; output.max_size()];

    let err = output.write_blob(&oversized).unwrap_err();
    assert!(matches!(err, MessageError::Overflow { .. }));

    // The cursor is latched; a retry with a smaller payload is refused
    // until the buffer is cleared.
    let err = output.write_u8(0).unwrap_err();
    assert!(matches!(err, MessageError::BadMessage));

    output.clear();
    output.write_u8(0).expect("clear should reopen the cursor");
}
