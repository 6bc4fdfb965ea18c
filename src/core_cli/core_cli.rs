use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "mfmt-ftpd", about = "A multi-user FTP server with MFMT support.")]
pub struct Cli {
    /// Path to the configuration file (`.json` for the legacy format, TOML otherwise)
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Address to listen on, overrides the configuration file
    #[arg(long)]
    pub host: Option<String>,

    /// Control port, overrides the configuration file
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Applies the command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["mfmt-ftpd"]);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(!cli.verbose);
        assert!(cli.host.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from(["mfmt-ftpd", "-c", "ftpd.toml", "-v", "--host", "0.0.0.0", "--port", "2100"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(cli.config, PathBuf::from("ftpd.toml"));
        assert!(cli.verbose);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 2100);
    }
}
