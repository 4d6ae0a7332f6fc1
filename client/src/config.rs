use std::path::PathBuf;
use std::time::Duration;

use snek_shared::config::SessionConfig;
use url::Url;

pub const DEFAULT_ADDR: &str = "ws://127.0.0.1:6969";
pub const DEFAULT_TICK_MS: u64 = 500;

/// Where scene bytes come from and commands go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    WebSocket(Url),
    /// `host:port`
    Tcp(String),
    /// Named pipe pair: scene bytes are read from `input`, commands written to `output`.
    Pipe { input: PathBuf, output: PathBuf },
    /// Scene on stdin, commands on stdout.
    Stdio,
}

impl Address {
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text == "-" {
            return Ok(Address::Stdio);
        }
        if let Some(rest) = text.strip_prefix("pipe://") {
            let (input, output) = rest
                .split_once(',')
                .ok_or_else(|| format!("pipe address needs <in>,<out>: {text}"))?;
            if input.is_empty() || output.is_empty() {
                return Err(format!("pipe address has an empty path: {text}"));
            }
            return Ok(Address::Pipe {
                input: PathBuf::from(input),
                output: PathBuf::from(output),
            });
        }

        let url = Url::parse(text).map_err(|e| format!("invalid address {text:?}: {e}"))?;
        match url.scheme() {
            "ws" | "wss" => Ok(Address::WebSocket(url)),
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| format!("tcp address has no host: {text}"))?;
                let port = url
                    .port()
                    .ok_or_else(|| format!("tcp address has no port: {text}"))?;
                Ok(Address::Tcp(format!("{host}:{port}")))
            }
            other => Err(format!("unsupported address scheme {other:?}")),
        }
    }

    /// Whether the transport itself reads stdin, leaving none for keys.
    pub fn uses_stdin(&self) -> bool {
        matches!(self, Address::Stdio)
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub address: Address,
    pub session: SessionConfig,
    /// Frame pacing
    pub tick_ms: u64,
    /// Optional `x, y, z` text file drawn as a backdrop.
    pub cloud: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: Address::WebSocket(
                Url::parse(DEFAULT_ADDR).unwrap_or_else(|_| unreachable!("default address parses")),
            ),
            session: SessionConfig::default(),
            tick_ms: DEFAULT_TICK_MS,
            cloud: None,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_ms == 0 {
            return Err("tick_ms must be > 0".to_string());
        }
        self.session.validate()
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Address from the first CLI argument or `SNEK_ADDR`, session options
    /// from the JSON file named by `SNEK_CONFIG`, pacing from `SNEK_TICK_MS`
    /// and a backdrop cloud from `SNEK_CLOUD`.
    pub fn from_env_and_args() -> Result<Self, String> {
        let arg = std::env::args().nth(1);
        Self::from_sources(arg, |key| std::env::var(key).ok())
    }

    pub fn from_sources(
        arg: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let mut config = ClientConfig::default();

        if let Some(addr) = arg.or_else(|| env("SNEK_ADDR")) {
            config.address = Address::parse(&addr)?;
        }

        if let Some(path) = env("SNEK_CONFIG") {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| format!("failed to read {path}: {e}"))?;
            config.session = SessionConfig::from_json(&text)?;
        }

        if let Some(ms) = env("SNEK_TICK_MS") {
            config.tick_ms = ms
                .trim()
                .parse()
                .map_err(|_| format!("SNEK_TICK_MS is not a number: {ms:?}"))?;
        }

        config.cloud = env("SNEK_CLOUD").map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }
}
