use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::data;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{error, info};
use std::fs::Metadata;
use std::path::Path;

/// Handles LIST and NLST.
///
/// Both send the listing over the passive data channel. LIST produces
/// `ls -l` style lines, NLST bare names.
pub struct ListCommand {
    long: bool,
}

impl ListCommand {
    pub fn long() -> Self {
        Self { long: true }
    }

    pub fn names_only() -> Self {
        Self { long: false }
    }
}

/// Drops leading `ls` style options such as `-la`, which many clients send.
fn strip_options(arg: &str) -> &str {
    let mut rest = arg.trim_start();
    while rest.starts_with('-') {
        rest = match rest.split_once(' ') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    rest
}

fn mode_string(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    #[cfg(unix)]
    let bits = {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode()
    };
    #[cfg(not(unix))]
    let bits: u32 = if metadata.permissions().readonly() { 0o444 } else { 0o644 };

    let mut mode = String::with_capacity(10);
    mode.push(kind);
    for shift in [6, 3, 0] {
        let triplet = (bits >> shift) & 0o7;
        mode.push(if triplet & 0o4 != 0 { 'r' } else { '-' });
        mode.push(if triplet & 0o2 != 0 { 'w' } else { '-' });
        mode.push(if triplet & 0o1 != 0 { 'x' } else { '-' });
    }
    mode
}

pub fn format_long_entry(name: &str, metadata: &Metadata) -> String {
    let modified = metadata
        .modified()
        .map(DateTime::<Local>::from)
        .map(|t| t.format("%b %d %H:%M").to_string())
        .unwrap_or_else(|_| String::from("Jan 01 00:00"));
    format!(
        "{} 1 owner group {:>12} {} {}\r\n",
        mode_string(metadata),
        metadata.len(),
        modified,
        name
    )
}

/// Builds the listing for a directory, or for a single file.
async fn build_listing(path: &Path, long: bool) -> std::io::Result<String> {
    let metadata = tokio::fs::metadata(path).await?;
    let mut entries = Vec::new();
    if metadata.is_dir() {
        let mut dir = tokio::fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            entries.push((entry.file_name().to_string_lossy().into_owned(), metadata));
        }
    } else {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        entries.push((name, metadata));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(entries
        .iter()
        .map(|(name, metadata)| {
            if long {
                format_long_entry(name, metadata)
            } else {
                format!("{}\r\n", name)
            }
        })
        .collect())
}

#[async_trait]
impl CommandHandler for ListCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::List)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        let target = match strip_options(arg) {
            "" => ".",
            target => target,
        };
        let resolved = ctx.session.resolve(target)?;
        let listing = build_listing(&resolved.real_path, self.long)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    CommandError::FileNotFound(resolved.virtual_path.clone())
                }
                _ => CommandError::fs("List", e),
            })?;

        let mut data = data::start_transfer(ctx, "Here comes the directory listing.").await?;
        data::send_bytes(&mut data, listing.as_bytes())
            .await
            .map_err(|e| {
                error!("Error sending listing: {}", e);
                CommandError::TransferAborted(e)
            })?;
        info!("Sent listing of {}", resolved.virtual_path);
        Ok(Reply::new(226, "Directory send OK."))
    }
}
