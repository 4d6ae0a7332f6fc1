//! Byte-stream transports for the scene session.
//!
//! Every transport is a blocking `Read + Write`. Websocket messages are
//! flattened into one byte stream so the decoder never sees framing.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Stdin, Stdout, Write};
use std::net::TcpStream;

use snek_shared::error::ProtocolError;
use snek_shared::frame::Duplex;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::config::Address;

/// Adapts a websocket into a byte stream. Binary and text payloads are
/// concatenated in arrival order; each write goes out as one binary message.
pub struct WsStream<S: Read + Write> {
    socket: WebSocket<S>,
    pending: Vec<u8>,
    pos: usize,
    closed: bool,
}

impl<S: Read + Write> WsStream<S> {
    pub fn new(socket: WebSocket<S>) -> Self {
        Self {
            socket,
            pending: Vec::new(),
            pos: 0,
            closed: false,
        }
    }

    pub fn into_inner(self) -> WebSocket<S> {
        self.socket
    }

    /// Pull messages until one carries payload. `false` once the peer closed.
    fn fill(&mut self) -> io::Result<bool> {
        while !self.closed {
            let msg = match self.socket.read() {
                Ok(m) => m,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    self.closed = true;
                    break;
                }
                Err(tungstenite::Error::Io(e)) => return Err(e),
                Err(e) => return Err(io::Error::other(e)),
            };
            let payload = match msg {
                Message::Binary(b) => b.to_vec(),
                Message::Text(t) => t.as_str().as_bytes().to_vec(),
                Message::Close(_) => {
                    // Sends the queued close reply.
                    if let Err(e) = self.socket.flush() {
                        tracing::debug!("Close reply not sent: {}", e);
                    }
                    self.closed = true;
                    break;
                }
                _ => continue,
            };
            if payload.is_empty() {
                continue;
            }
            self.pending = payload;
            self.pos = 0;
            return Ok(true);
        }
        Ok(false)
    }
}

impl<S: Read + Write> Read for WsStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos >= self.pending.len() && !self.fill()? {
            return Ok(0);
        }
        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl<S: Read + Write> Write for WsStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.socket.write(Message::binary(buf.to_vec())) {
            Ok(()) => Ok(buf.len()),
            Err(tungstenite::Error::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.socket.flush() {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e)),
        }
    }
}

pub enum Transport {
    WebSocket(Box<WsStream<MaybeTlsStream<TcpStream>>>),
    Tcp(TcpStream),
    Pipe(Duplex<File, File>),
    Stdio(Duplex<Stdin, Stdout>),
}

impl Transport {
    pub fn connect(address: &Address) -> Result<Self, ProtocolError> {
        let transport = match address {
            Address::WebSocket(url) => {
                let (socket, _response) = tungstenite::connect(url.as_str())
                    .map_err(|e| ProtocolError::Io(format!("websocket connect to {url}: {e}")))?;
                Transport::WebSocket(Box::new(WsStream::new(socket)))
            }
            Address::Tcp(addr) => {
                let stream = TcpStream::connect(addr)?;
                stream.set_nodelay(true)?;
                Transport::Tcp(stream)
            }
            Address::Pipe { input, output } => {
                let reader = File::open(input)?;
                let writer = OpenOptions::new().write(true).open(output)?;
                Transport::Pipe(Duplex::new(reader, writer))
            }
            Address::Stdio => Transport::Stdio(Duplex::new(io::stdin(), io::stdout())),
        };
        tracing::info!("Connected via {}", transport.kind());
        Ok(transport)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Transport::WebSocket(_) => "websocket",
            Transport::Tcp(_) => "tcp",
            Transport::Pipe(_) => "pipe",
            Transport::Stdio(_) => "stdio",
        }
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::WebSocket(s) => s.read(buf),
            Transport::Tcp(s) => s.read(buf),
            Transport::Pipe(s) => s.read(buf),
            Transport::Stdio(s) => s.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::WebSocket(s) => s.write(buf),
            Transport::Tcp(s) => s.write(buf),
            Transport::Pipe(s) => s.write(buf),
            Transport::Stdio(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::WebSocket(s) => s.flush(),
            Transport::Tcp(s) => s.flush(),
            Transport::Pipe(s) => s.flush(),
            Transport::Stdio(s) => s.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn websocket_messages_flatten_into_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let peer = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();
            ws.send(Message::binary(vec![1u8, 2, 3])).unwrap();
            ws.send(Message::Ping(vec![9u8].into())).unwrap();
            ws.send(Message::binary(vec![4u8, 5])).unwrap();
            let reply = loop {
                match ws.read().unwrap() {
                    Message::Binary(b) => break b.to_vec(),
                    _ => continue,
                }
            };
            ws.close(None).unwrap();
            // Drain until the close handshake completes.
            while ws.read().is_ok() {}
            reply
        });

        let url = format!("ws://{addr}");
        let (socket, _) = tungstenite::connect(url.as_str()).unwrap();
        let mut stream = WsStream::new(socket);

        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        stream.write_all(b"z").unwrap();
        stream.flush().unwrap();

        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![5]);
        drop(stream);

        assert_eq!(peer.join().unwrap(), b"z".to_vec());
    }
}
