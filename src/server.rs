use crate::config::{Config, ServerConfig};
use crate::core_auth::AuthorizationStore;
use crate::core_network::network;
use crate::core_network::pasv::PassivePortAllocator;
use anyhow::{Context, Result};
use log::{error, info};
use std::future::Future;
use std::sync::Arc;

/// Process-wide state shared by every session.
#[derive(Debug)]
pub struct ServerContext {
    pub config: ServerConfig,
    pub auth: Arc<AuthorizationStore>,
    pub ports: Arc<PassivePortAllocator>,
}

impl ServerContext {
    /// Validates the configuration and registers every configured user,
    /// creating home directories on the way.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let auth = Arc::new(AuthorizationStore::new());
        for user in &config.users {
            let permissions = user.permissions()?;
            auth.add_user(&user.username, &user.password, &user.home, permissions)
                .with_context(|| format!("Failed to register user {}", user.username))?;
            info!("Added user: {}, home: {}", user.username, user.home.display());
        }

        let ports = PassivePortAllocator::new(config.server.passive_ports);
        Ok(Self {
            config: config.server,
            auth,
            ports,
        })
    }
}

pub fn log_config(config: &ServerConfig) {
    info!("  Listen Address: {}", config.bind_address());
    info!(
        "  Passive Ports: {}-{}",
        config.passive_ports.low, config.passive_ports.high
    );
    if let Some(address) = config.masquerade_address {
        info!("  PASV Address: {}", address);
    }
    info!("  Idle Timeout: {}s", config.idle_timeout_secs);
    info!("  Data Timeout: {}s", config.data_timeout_secs);
}

/// Runs the FTP server until `shutdown` resolves.
pub async fn run<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let context = Arc::new(ServerContext::from_config(config)?);
    log_config(&context.config);

    let listener = network::bind_listener(&context.config.bind_address()).await?;
    match network::start_server(listener, context, shutdown).await {
        Ok(()) => {
            info!("Server shut down cleanly.");
            Ok(())
        }
        Err(e) => {
            error!("Server failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PassivePortRange, UserConfig};
    use tempfile::TempDir;

    #[test]
    fn test_context_registers_users_and_creates_homes() {
        let root = TempDir::new().unwrap();
        let config = Config {
            server: ServerConfig {
                passive_ports: PassivePortRange::new(50000, 50010).unwrap(),
                ..ServerConfig::default()
            },
            users: vec![
                UserConfig {
                    username: "alice".into(),
                    password: "one".into(),
                    home: root.path().join("alice"),
                    perm: "elr".into(),
                },
                UserConfig {
                    username: "alice".into(),
                    password: "two".into(),
                    home: root.path().join("alice-new"),
                    perm: "elradfmwMT".into(),
                },
            ],
        };

        let context = ServerContext::from_config(config).unwrap();
        assert!(root.path().join("alice").is_dir());
        assert!(root.path().join("alice-new").is_dir());
        assert_eq!(context.auth.len(), 1);
        assert!(context.auth.authenticate("alice", "two").is_ok());
        assert_eq!(context.ports.range().port_count(), 11);
    }

    #[test]
    fn test_context_rejects_bad_passive_range() {
        let config = Config {
            server: ServerConfig {
                passive_ports: PassivePortRange { low: 6000, high: 5000 },
                ..ServerConfig::default()
            },
            users: Vec::new(),
        };
        assert!(ServerContext::from_config(config).is_err());
    }
}
