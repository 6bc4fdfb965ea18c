// Shared fixtures for handler tests.

use crate::config::{PassivePortRange, ServerConfig};
use crate::core_auth::{AuthorizationStore, Permissions};
use crate::core_ftpcommand::handlers::{CommandContext, CommandRegistry};
use crate::core_ftpcommand::reply::{Reply, ReplyWriter};
use crate::core_network::pasv::PassivePortAllocator;
use crate::server::ServerContext;
use crate::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, DuplexStream};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";

pub struct TestHarness {
    pub root: TempDir,
    pub server: ServerContext,
    pub session: Session,
    pub writer: ReplyWriter,
    client: DuplexStream,
    registry: CommandRegistry,
}

impl TestHarness {
    pub fn with_permissions(perm: &str, low: u16, high: u16) -> Self {
        let root = TempDir::new().unwrap();
        let auth = AuthorizationStore::new();
        auth.add_user(
            USERNAME,
            PASSWORD,
            &root.path().join(USERNAME),
            Permissions::parse(perm).unwrap(),
        )
        .unwrap();

        let passive_ports = PassivePortRange::new(low, high).unwrap();
        let server = ServerContext {
            config: ServerConfig {
                passive_ports,
                data_timeout_secs: 5,
                ..ServerConfig::default()
            },
            auth: Arc::new(auth),
            ports: PassivePortAllocator::new(passive_ports),
        };

        let addr = "127.0.0.1:2121".parse().unwrap();
        let peer = "127.0.0.1:40000".parse().unwrap();
        let (client, server_side) = tokio::io::duplex(64 * 1024);

        Self {
            root,
            server,
            session: Session::new(peer, addr),
            writer: ReplyWriter::new(server_side, peer),
            client,
            registry: CommandRegistry::new(),
        }
    }

    /// Fresh connection, nobody logged in.
    pub fn anonymous() -> Self {
        Self::with_permissions("elradfmwMT", 47000, 47000)
    }

    pub async fn logged_in() -> Self {
        Self::logged_in_with(Self::anonymous()).await
    }

    pub async fn logged_in_with_perm(perm: &str) -> Self {
        Self::logged_in_with(Self::with_permissions(perm, 47000, 47000)).await
    }

    pub async fn logged_in_with_ports(low: u16, high: u16) -> Self {
        Self::logged_in_with(Self::with_permissions("elradfmwMT", low, high)).await
    }

    async fn logged_in_with(mut harness: Self) -> Self {
        assert_eq!(harness.run(&format!("USER {}", USERNAME)).await.code(), 331);
        assert_eq!(harness.run(&format!("PASS {}", PASSWORD)).await.code(), 230);
        harness
    }

    pub async fn run(&mut self, line: &str) -> Reply {
        let mut ctx = CommandContext {
            session: &mut self.session,
            server: &self.server,
            writer: &mut self.writer,
        };
        self.registry
            .dispatch(&mut ctx, &format!("{}\r\n", line))
            .await
    }

    /// The user's canonical home directory.
    pub fn home(&self) -> PathBuf {
        self.root.path().join(USERNAME).canonicalize().unwrap()
    }

    pub fn write_file(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.home().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Negotiates EPSV and returns the advertised port.
    pub async fn passive_port(&mut self) -> u16 {
        let reply = self.run("EPSV").await;
        assert_eq!(reply.code(), 229);
        reply
            .text()
            .split('|')
            .nth(3)
            .and_then(|p| p.parse().ok())
            .unwrap()
    }

    /// Everything sent as preliminary replies so far.
    pub async fn preliminary_output(&mut self) -> String {
        let mut out = Vec::new();
        let mut buf = [0u8; 1024];
        while let Ok(Ok(n)) =
            tokio::time::timeout(Duration::from_millis(50), self.client.read(&mut buf)).await
        {
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

pub fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
