use log::debug;
use std::fmt;
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A numeric FTP reply, possibly spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    lines: Vec<String>,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![text.into()],
        }
    }

    /// Multi-line reply. The first and last entries carry the code, the ones
    /// in between are sent indented by one space.
    pub fn multiline(code: u16, lines: Vec<String>) -> Self {
        if lines.is_empty() {
            return Self::new(code, "");
        }
        Self { code, lines }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn to_wire(&self) -> String {
        let sanitize = |s: &str| s.replace(['\r', '\n'], " ");
        match self.lines.as_slice() {
            [single] => format!("{} {}\r\n", self.code, sanitize(single)),
            [first, middle @ .., last] => {
                let mut out = format!("{}-{}\r\n", self.code, sanitize(first));
                for line in middle {
                    out.push_str(&format!(" {}\r\n", sanitize(line)));
                }
                out.push_str(&format!("{} {}\r\n", self.code, sanitize(last)));
                out
            }
            [] => format!("{} \r\n", self.code),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.lines.join(" | "))
    }
}

/// Owns the write half of the control connection. Every byte a session sends
/// on the control channel goes through here.
pub struct ReplyWriter {
    inner: Box<dyn AsyncWrite + Unpin + Send>,
    peer: SocketAddr,
}

impl ReplyWriter {
    pub fn new(inner: impl AsyncWrite + Unpin + Send + 'static, peer: SocketAddr) -> Self {
        Self {
            inner: Box::new(inner),
            peer,
        }
    }

    pub async fn send(&mut self, reply: &Reply) -> std::io::Result<()> {
        debug!("-> {} {}", self.peer, reply);
        self.inner.write_all(reply.to_wire().as_bytes()).await?;
        self.inner.flush().await
    }

    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.inner.shutdown().await
    }
}
