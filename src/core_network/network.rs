use crate::constants::MAX_COMMAND_LENGTH;
use crate::core_ftpcommand::handlers::{CommandContext, CommandRegistry};
use crate::core_ftpcommand::reply::{Reply, ReplyWriter};
use crate::server::ServerContext;
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// How long open sessions get to wind down after the shutdown notice.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn bind_listener(address: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind control socket on {}", address))?;
    info!("Server listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts control connections until `shutdown` resolves, one task per
/// connection. Open sessions are then told to close and awaited.
pub async fn start_server<F>(
    listener: TcpListener,
    context: Arc<ServerContext>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let registry = Arc::new(CommandRegistry::new());
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut sessions = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => {
                let (socket, addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        continue;
                    }
                };
                info!("New connection from {}", addr);

                let context = Arc::clone(&context);
                let registry = Arc::clone(&registry);
                let stop_rx = stop_rx.clone();
                sessions.spawn(async move {
                    if let Err(e) = handle_connection(socket, addr, context, registry, stop_rx).await {
                        warn!("Connection error with {}: {}", addr, e);
                    }
                    info!("Connection closed for {}", addr);
                });
            }
            Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = finished {
                    error!("Session task failed: {}", e);
                }
            }
        }
    }

    drop(listener);
    info!("Closing {} open session(s)", sessions.len());
    // Receivers only fail once every session is gone, so the result is irrelevant.
    let _ = stop_tx.send(true);

    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while sessions.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("Forcibly closing {} session(s)", sessions.len());
        sessions.shutdown().await;
    }
    info!("Server stopped");
    Ok(())
}

enum ControlLine {
    Line,
    TooLong,
    Eof,
}

/// Reads one LF-terminated line into `line`, never buffering more than
/// `MAX_COMMAND_LENGTH` bytes of it.
async fn read_control_line<R>(reader: &mut R, line: &mut Vec<u8>) -> std::io::Result<ControlLine>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_COMMAND_LENGTH as u64 + 1;
    let n = (&mut *reader).take(limit).read_until(b'\n', line).await?;
    if n == 0 {
        return Ok(ControlLine::Eof);
    }
    if line.ends_with(b"\n") {
        return Ok(ControlLine::Line);
    }
    if (n as u64) < limit {
        // EOF in the middle of a line.
        return Ok(ControlLine::Line);
    }

    // Discard the remainder of the oversized line.
    let mut scratch = Vec::new();
    loop {
        scratch.clear();
        let n = (&mut *reader).take(limit).read_until(b'\n', &mut scratch).await?;
        if n == 0 || scratch.ends_with(b"\n") {
            return Ok(ControlLine::TooLong);
        }
    }
}

pub async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    context: Arc<ServerContext>,
    registry: Arc<CommandRegistry>,
    mut stop_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let local_addr = socket.local_addr()?;
    let (read_half, write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = ReplyWriter::new(write_half, addr);
    let mut session = Session::new(addr, local_addr);
    let idle_timeout = context.config.idle_timeout();

    writer
        .send(&Reply::new(220, context.config.greeting.as_str()))
        .await?;

    let mut line = Vec::new();
    loop {
        line.clear();
        let read = tokio::select! {
            _ = stop_rx.changed() => {
                // Best effort, the socket is closed either way.
                let _ = writer.send(&Reply::new(421, "Server shutting down.")).await;
                break;
            }
            read = tokio::time::timeout(idle_timeout, read_control_line(&mut reader, &mut line)) => read,
        };

        match read {
            Err(_) => {
                info!("Idle timeout for {}", addr);
                let _ = writer
                    .send(&Reply::new(421, "Control connection timed out."))
                    .await;
                break;
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(ControlLine::Eof)) => {
                debug!("{} closed the control connection", addr);
                break;
            }
            Ok(Ok(ControlLine::TooLong)) => {
                writer.send(&Reply::new(500, "Command too long.")).await?;
                continue;
            }
            Ok(Ok(ControlLine::Line)) => {}
        }

        let text = String::from_utf8_lossy(&line);
        let mut ctx = CommandContext {
            session: &mut session,
            server: &context,
            writer: &mut writer,
        };
        let reply = registry.dispatch(&mut ctx, &text).await;
        writer.send(&reply).await?;

        if session.is_closing() {
            break;
        }
    }

    // Dropping the session releases any passive port it still holds.
    drop(session);
    let _ = writer.shutdown().await;
    Ok(())
}
