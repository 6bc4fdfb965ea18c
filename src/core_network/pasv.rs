use crate::config::PassivePortRange;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

#[derive(Error, Debug)]
pub enum PortError {
    #[error("No passive port available in range {low}-{high}")]
    NoPortAvailable { low: u16, high: u16 },

    #[error("Failed to bind passive listener on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
struct AllocatorState {
    in_use: HashSet<u16>,
    next: u16,
}

/// Hands out ports of the configured passive range, round-robin, never the
/// same port to two live reservations.
#[derive(Debug)]
pub struct PassivePortAllocator {
    range: PassivePortRange,
    state: Mutex<AllocatorState>,
}

impl PassivePortAllocator {
    pub fn new(range: PassivePortRange) -> Arc<Self> {
        Arc::new(Self {
            range,
            state: Mutex::new(AllocatorState {
                in_use: HashSet::new(),
                next: range.low,
            }),
        })
    }

    pub fn range(&self) -> PassivePortRange {
        self.range
    }

    /// Reserves a free port. The reservation gives the port back when dropped.
    pub fn reserve(self: &Arc<Self>) -> Result<PortReservation, PortError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut candidate = state.next;
        for _ in 0..self.range.port_count() {
            let following = if candidate >= self.range.high {
                self.range.low
            } else {
                candidate + 1
            };
            if state.in_use.insert(candidate) {
                state.next = following;
                debug!("Reserved passive port {}", candidate);
                return Ok(PortReservation {
                    port: candidate,
                    allocator: Arc::clone(self),
                });
            }
            candidate = following;
        }

        warn!(
            "Passive port range {}-{} exhausted",
            self.range.low, self.range.high
        );
        Err(PortError::NoPortAvailable {
            low: self.range.low,
            high: self.range.high,
        })
    }

    pub fn release(&self, port: u16) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.in_use.remove(&port) {
            debug!("Released passive port {}", port);
        }
    }

    pub fn in_use(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .in_use
            .len()
    }
}

/// A live claim on one passive port.
pub struct PortReservation {
    port: u16,
    allocator: Arc<PassivePortAllocator>,
}

impl PortReservation {
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Debug for PortReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortReservation")
            .field("port", &self.port)
            .finish()
    }
}

impl Drop for PortReservation {
    fn drop(&mut self) {
        self.allocator.release(self.port);
    }
}

/// Listener waiting for the client's data connection.
#[derive(Debug)]
pub struct PassiveChannel {
    listener: TcpListener,
    reservation: PortReservation,
}

impl PassiveChannel {
    pub async fn open(
        allocator: &Arc<PassivePortAllocator>,
        bind_ip: IpAddr,
    ) -> Result<Self, PortError> {
        let reservation = allocator.reserve()?;
        let port = reservation.port();
        let listener = TcpListener::bind(SocketAddr::new(bind_ip, port))
            .await
            .map_err(|source| PortError::Bind { port, source })?;
        debug!("PASV listener set up on {}:{}", bind_ip, port);
        Ok(Self {
            listener,
            reservation,
        })
    }

    pub fn port(&self) -> u16 {
        self.reservation.port()
    }

    /// Waits for the client to connect. The port stays reserved until the
    /// returned connection is dropped.
    pub async fn accept(self, wait: Duration) -> io::Result<DataConnection> {
        let (stream, addr) = tokio::time::timeout(wait, self.listener.accept())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no data connection"))??;
        debug!("Accepted data connection from: {}", addr);
        Ok(DataConnection {
            stream,
            _reservation: self.reservation,
        })
    }
}

pub struct DataConnection {
    pub stream: TcpStream,
    _reservation: PortReservation,
}

pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> Reply {
    let [a, b, c, d] = ip.octets();
    Reply::new(
        227,
        format!(
            "Entering Passive Mode ({},{},{},{},{},{}).",
            a,
            b,
            c,
            d,
            port >> 8,
            port & 0xff
        ),
    )
}

pub fn format_epsv_reply(port: u16) -> Reply {
    Reply::new(229, format!("Entering Extended Passive Mode (|||{}|)", port))
}

async fn open_for_session(ctx: &mut CommandContext<'_>) -> Result<u16, CommandError> {
    // Release the previous reservation before asking for a new one.
    drop(ctx.session.take_passive());
    let bind_ip = ctx.session.local_addr.ip();
    let channel = PassiveChannel::open(&ctx.server.ports, bind_ip).await?;
    let port = channel.port();
    ctx.session.set_passive(channel);
    Ok(port)
}

pub struct PasvCommand;

#[async_trait]
impl CommandHandler for PasvCommand {
    async fn handle(&self, ctx: &mut CommandContext<'_>, _arg: &str) -> Result<Reply, CommandError> {
        let advertised = match ctx.server.config.masquerade_address {
            Some(IpAddr::V4(ip)) => ip,
            _ => match ctx.session.local_addr.ip() {
                IpAddr::V4(ip) => ip,
                IpAddr::V6(ip) => match ip.to_ipv4_mapped() {
                    Some(ip) => ip,
                    None => {
                        return Err(CommandError::UnsupportedParameter(
                            "PASV over IPv6, use EPSV".into(),
                        ))
                    }
                },
            },
        };
        let port = open_for_session(ctx).await?;
        info!(
            "{} entering passive mode on {}:{}",
            ctx.session.peer_addr, advertised, port
        );
        Ok(format_pasv_reply(advertised, port))
    }
}

pub struct EpsvCommand;

#[async_trait]
impl CommandHandler for EpsvCommand {
    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if !arg.is_empty() && !matches!(arg, "1" | "2") {
            return Err(CommandError::UnsupportedParameter(arg.to_string()));
        }
        let port = open_for_session(ctx).await?;
        info!(
            "{} entering extended passive mode on port {}",
            ctx.session.peer_addr, port
        );
        Ok(format_epsv_reply(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_ftpcommand::test_support::TestHarness;
    use std::collections::HashSet;

    fn allocator(low: u16, high: u16) -> Arc<PassivePortAllocator> {
        PassivePortAllocator::new(PassivePortRange::new(low, high).unwrap())
    }

    #[test]
    fn test_reserve_is_round_robin_and_unique() {
        let ports = allocator(40000, 40002);
        let a = ports.reserve().unwrap();
        let b = ports.reserve().unwrap();
        let c = ports.reserve().unwrap();
        let seen: HashSet<u16> = [a.port(), b.port(), c.port()].into_iter().collect();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|p| (40000..=40002).contains(p)));
        assert_eq!(ports.in_use(), 3);
    }

    #[test]
    fn test_exhaustion_then_release() {
        let ports = allocator(40010, 40011);
        let first = ports.reserve().unwrap();
        let _second = ports.reserve().unwrap();
        assert!(matches!(
            ports.reserve(),
            Err(PortError::NoPortAvailable { low: 40010, high: 40011 })
        ));

        let freed = first.port();
        drop(first);
        let again = ports.reserve().unwrap();
        assert_eq!(again.port(), freed);
    }

    #[test]
    fn test_explicit_release_is_idempotent() {
        let ports = allocator(40020, 40020);
        let reservation = ports.reserve().unwrap();
        ports.release(reservation.port());
        ports.release(reservation.port());
        assert_eq!(ports.in_use(), 0);
    }

    #[test]
    fn test_concurrent_reservations_never_collide() {
        let ports = allocator(41000, 41063);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ports = Arc::clone(&ports);
                std::thread::spawn(move || {
                    (0..8)
                        .map(|_| ports.reserve().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let reservations: Vec<PortReservation> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<u16> = reservations.iter().map(|r| r.port()).collect();
        assert_eq!(unique.len(), 64);
        assert!(ports.reserve().is_err());
        drop(reservations);
        assert_eq!(ports.in_use(), 0);
    }

    #[test]
    fn test_reply_formats() {
        assert_eq!(
            format_pasv_reply(Ipv4Addr::new(192, 168, 1, 10), 50001).to_wire(),
            "227 Entering Passive Mode (192,168,1,10,195,81).\r\n"
        );
        assert_eq!(
            format_epsv_reply(50001).to_wire(),
            "229 Entering Extended Passive Mode (|||50001|)\r\n"
        );
    }

    #[tokio::test]
    async fn test_repeated_pasv_reuses_its_own_port() {
        let mut harness = TestHarness::logged_in_with_ports(47810, 47810).await;

        let first = harness.run("PASV").await;
        assert_eq!(first.code(), 227);
        // The previous reservation is given back before the new one is taken.
        let second = harness.run("PASV").await;
        assert_eq!(second, first);
        assert_eq!(harness.server.ports.in_use(), 1);
    }

    #[tokio::test]
    async fn test_pasv_when_range_is_taken() {
        let mut harness = TestHarness::logged_in_with_ports(47820, 47820).await;
        let _held = harness.server.ports.reserve().unwrap();

        let reply = harness.run("PASV").await;
        assert_eq!(reply.code(), 425);
        assert!(!harness.session.has_passive());
        assert!(harness.session.is_logged_in());

        let reply = harness.run("PWD").await;
        assert_eq!(reply.code(), 257);
    }

    #[tokio::test]
    async fn test_epsv_accepts_a_data_connection() {
        let mut harness = TestHarness::logged_in_with_ports(47830, 47831).await;
        let reply = harness.run("EPSV").await;
        assert_eq!(reply.code(), 229);

        let channel = harness.session.take_passive().unwrap();
        let port = channel.port();
        let connect = tokio::spawn(async move { TcpStream::connect(("127.0.0.1", port)).await });
        let data = channel.accept(Duration::from_secs(5)).await.unwrap();
        connect.await.unwrap().unwrap();
        assert_eq!(harness.server.ports.in_use(), 1);
        drop(data);
        assert_eq!(harness.server.ports.in_use(), 0);
    }
}
