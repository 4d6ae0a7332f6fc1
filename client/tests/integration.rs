//! Integration tests for the scene client.
//!
//! A scripted peer listens on a random local port, plays the server side of
//! the protocol, and records the command bytes the client sends back.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use snek_client::client_loop::{run_client_loop, LoopOptions, Outcome};
use snek_client::config::Address;
use snek_client::input::{InputEvent, Key};
use snek_client::scene::{Renderer, Scene};
use snek_client::transport::Transport;
use snek_shared::codec::{Endianness, IntegerWidth, WidthCodec};
use snek_shared::config::SessionConfig;
use snek_shared::coords::{Rgb, WorldBounds};
use snek_shared::error::ProtocolError;
use snek_shared::frame::Session;
use snek_shared::protocol::{encode_game_over, encode_handshake, encode_points, PointLayout};
use tungstenite::Message;

#[derive(Default)]
struct Recorder {
    scenes: Vec<(usize, Option<u32>)>,
}

impl Renderer for Recorder {
    fn render(&mut self, scene: &Scene) {
        self.scenes.push((scene.snake_len(), scene.score));
    }
}

fn codec(width: IntegerWidth) -> WidthCodec {
    // Client and peer share the host, so native order matches on both ends.
    WidthCodec::new(width, Endianness::native())
}

fn options() -> LoopOptions {
    LoopOptions {
        tick: Duration::from_millis(1),
        backdrop: None,
    }
}

/// Accept one TCP client and send the handshake. Each scripted frame is
/// written after reading the given number of command bytes; the write side
/// is then shut down.
fn start_tcp_peer(
    handshake: Vec<u8>,
    frames: Vec<(usize, Vec<u8>)>,
) -> (String, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(&handshake).unwrap();
        let mut received = Vec::new();
        for (expect, frame) in frames {
            let mut cmd = vec![0u8; expect];
            stream.read_exact(&mut cmd).unwrap();
            received.extend(cmd);
            stream.write_all(&frame).unwrap();
        }
        let _ = stream.shutdown(Shutdown::Write);
        // Collect anything else until the client hangs up.
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
        received.extend(rest);
        received
    });
    (format!("tcp://{addr}"), handle)
}

fn connect(url: &str) -> Session<Transport> {
    let address = Address::parse(url).unwrap();
    let transport = Transport::connect(&address).unwrap();
    Session::new(transport, SessionConfig::default())
}

#[test]
fn tcp_session_plays_to_game_over() {
    let c = codec(IntegerWidth::Four);
    let handshake = encode_handshake(&c, WorldBounds::new(100, 100, 100), Rgb([0, 0, 0x40]));
    let frames = vec![
        (
            1,
            encode_points(&c, PointLayout::CoordsOnly, &[[50, 50, 50], [10, 10, 10]], &[]),
        ),
        (
            0,
            encode_points(
                &c,
                PointLayout::CoordsOnly,
                &[[50, 50, 50], [10, 10, 10], [11, 10, 10]],
                &[],
            ),
        ),
        (0, encode_game_over(42)),
    ];
    let (url, peer) = start_tcp_peer(handshake, frames);

    let (tx, rx) = mpsc::channel();
    tx.send(InputEvent::Key(Key::Up)).unwrap();

    let mut session = connect(&url);
    let mut renderer = Recorder::default();
    let outcome = run_client_loop(&mut session, Some(&rx), &mut renderer, options()).unwrap();
    drop(session);

    assert_eq!(outcome, Outcome::GameOver { score: 42 });
    assert_eq!(renderer.scenes, vec![(1, None), (2, None), (0, Some(42))]);
    assert_eq!(peer.join().unwrap(), vec![b'x']);
}

#[test]
fn quit_is_the_last_byte_sent() {
    let c = codec(IntegerWidth::One);
    let handshake = encode_handshake(&c, WorldBounds::new(20, 20, 20), Rgb::WHITE);
    let (url, peer) = start_tcp_peer(handshake, vec![]);

    let (tx, rx) = mpsc::channel();
    tx.send(InputEvent::Key(Key::Escape)).unwrap();

    let mut session = connect(&url);
    let mut renderer = Recorder::default();
    let outcome = run_client_loop(&mut session, Some(&rx), &mut renderer, options()).unwrap();
    drop(session);

    assert_eq!(outcome, Outcome::Quit);
    assert!(renderer.scenes.is_empty());
    assert_eq!(peer.join().unwrap(), vec![b'E']);
}

#[test]
fn peer_hangup_mid_frame_is_short_read() {
    let c = codec(IntegerWidth::Two);
    let mut handshake = encode_handshake(&c, WorldBounds::new(20, 20, 20), Rgb::WHITE);
    // Declares two points but delivers one.
    let frame = encode_points(&c, PointLayout::CoordsOnly, &[[1, 2, 3], [4, 5, 6]], &[]);
    handshake.extend_from_slice(&frame[..frame.len() - 6]);
    let (url, peer) = start_tcp_peer(handshake, vec![]);

    let mut session = connect(&url);
    let mut renderer = Recorder::default();
    let err = run_client_loop(&mut session, None, &mut renderer, options()).unwrap_err();
    drop(session);

    assert_eq!(
        err,
        ProtocolError::ShortRead {
            expected: 12,
            actual: 6
        }
    );
    peer.join().unwrap();
}

#[test]
fn websocket_session_reassembles_split_messages() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        let c = codec(IntegerWidth::Eight);
        let mut script = encode_handshake(&c, WorldBounds::new(8, 8, 8), Rgb::WHITE);
        script.extend(encode_points(
            &c,
            PointLayout::CoordsOnly,
            &[[4, 4, 4], [2, 2, 2]],
            &[],
        ));
        script.extend(encode_game_over(7));
        // Message boundaries deliberately cut through fields.
        for chunk in script.chunks(5) {
            ws.send(Message::binary(chunk.to_vec())).unwrap();
        }
        while ws.read().is_ok() {}
    });

    let mut session = connect(&format!("ws://{addr}"));
    let mut renderer = Recorder::default();
    let outcome = run_client_loop(&mut session, None, &mut renderer, options()).unwrap();
    drop(session);

    assert_eq!(outcome, Outcome::GameOver { score: 7 });
    assert_eq!(renderer.scenes, vec![(1, None), (0, Some(7))]);
    peer.join().unwrap();
}

#[test]
fn unsupported_width_is_rejected_at_handshake() {
    let (url, peer) = start_tcp_peer(vec![40, 0, 0, 0], vec![]);
    let mut session = connect(&url);
    let mut renderer = Recorder::default();
    let err = run_client_loop(&mut session, None, &mut renderer, options()).unwrap_err();
    drop(session);
    assert_eq!(err, ProtocolError::UnsupportedWidth { indicator: 40 });
    peer.join().unwrap();
}

#[test]
fn raw_stream_over_plain_socket_decodes() {
    // Same bytes the peer helper writes, read without the client loop.
    let c = codec(IntegerWidth::Four);
    let handshake = encode_handshake(&c, WorldBounds::new(100, 100, 100), Rgb::WHITE);
    let frames = vec![(
        0,
        encode_points(&c, PointLayout::CoordsOnly, &[[50, 50, 50], [10, 10, 10]], &[]),
    )];
    let (url, peer) = start_tcp_peer(handshake, frames);
    let addr = url.trim_start_matches("tcp://").to_string();

    let stream = TcpStream::connect(addr).unwrap();
    let mut session = Session::new(stream, SessionConfig::default());
    session.handshake().unwrap();
    let frame = session.next_frame().unwrap();
    drop(session);

    let p0 = frame.points[0].position;
    let p1 = frame.points[1].position;
    assert!((p0.x - 0.5).abs() < 1e-6 && (p0.y - 0.5).abs() < 1e-6 && (p0.z - 0.5).abs() < 1e-6);
    assert!((p1.x - 0.1).abs() < 1e-6 && (p1.y - 0.1).abs() < 1e-6 && (p1.z - 0.1).abs() < 1e-6);
    peer.join().unwrap();
}

#[test]
fn websocket_close_then_hangup_ends_the_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        ws.send(Message::binary(vec![1u8, 2, 3])).unwrap();
        let _ = ws.close(None);
        // Hang up without waiting for the close reply.
        drop(ws);
    });

    let address = Address::parse(&format!("ws://{addr}")).unwrap();
    let mut transport = Transport::connect(&address).unwrap();
    let mut bytes = Vec::new();
    transport.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);
    peer.join().unwrap();
}

#[test]
fn stdio_mode_keeps_stdout_for_commands() {
    let c = codec(IntegerWidth::Two);
    let mut script = encode_handshake(&c, WorldBounds::new(16, 16, 16), Rgb::WHITE);
    script.extend(encode_points(&c, PointLayout::CoordsOnly, &[[1, 2, 3], [8, 8, 8]], &[]));
    script.extend(encode_game_over(5));

    let mut child = Command::new(env!("CARGO_BIN_EXE_snek-client"))
        .arg("-")
        .env_remove("SNEK_ADDR")
        .env_remove("SNEK_CONFIG")
        .env_remove("SNEK_CLOUD")
        .env("SNEK_TICK_MS", "1")
        .env("RUST_LOG", "info")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(&script).unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    // No key was pressed, so no command byte and nothing else.
    assert!(output.stdout.is_empty(), "stdout: {:?}", output.stdout);
    let log = String::from_utf8_lossy(&output.stderr);
    assert!(log.contains("Final score: 5"), "log: {log}");
}
