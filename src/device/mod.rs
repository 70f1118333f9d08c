//! Single-exchange UDP command channel to a node in AP mode
//!
//! Each exchange owns its socket for exactly one command/response round:
//! bind, arm the receiver, wait the settle interval, send, then accept the
//! first datagram that both originates from the node's fixed address and
//! decodes as the expected reply. Everything else on the wire (stray
//! broadcast traffic, half-garbled replies) is discarded and the loop keeps
//! listening until the deadline.

pub mod protocol;

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

use protocol::{decode_configure_ack, decode_version, ApConfig, SetupCommand};

/// Settle interval between arming the receiver and transmitting. The node
/// can answer within milliseconds; the receiver must already be listening.
const SETTLE_INTERVAL: Duration = Duration::from_secs(1);

/// Per-exchange deadline, measured from the start of the exchange.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no reply from the node before the deadline")]
    Timeout,

    #[error("setup socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Typed view of the node's setup surface, so the provisioning workflow can
/// run against a scripted node in tests.
pub trait DeviceSetup {
    async fn query_version(&self) -> Result<f64, DeviceError>;
    async fn configure(&self, cfg: &ApConfig) -> Result<(), DeviceError>;
}

/// Point-to-point command channel to a node at a fixed address.
pub struct DeviceLink {
    device_addr: SocketAddr,
    bind_addr: SocketAddr,
    settle: Duration,
    exchange_timeout: Duration,
}

impl DeviceLink {
    pub fn new(device_addr: SocketAddr, bind_addr: SocketAddr) -> Self {
        Self {
            device_addr,
            bind_addr,
            settle: SETTLE_INTERVAL,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    /// Channel to a factory-fresh node on its own access point.
    pub fn ap_mode() -> Self {
        Self::new(
            protocol::device_ap_addr(),
            SocketAddr::from(([0, 0, 0, 0], protocol::SETUP_PORT)),
        )
    }

    pub fn with_timing(mut self, settle: Duration, exchange_timeout: Duration) -> Self {
        self.settle = settle;
        self.exchange_timeout = exchange_timeout;
        self
    }

    /// Perform exactly one command/response exchange.
    ///
    /// The receive loop and the settle-then-send branch run concurrently on
    /// the same socket; the socket is scoped to this call, so it is released
    /// on success, timeout and error alike.
    async fn exchange<T>(
        &self,
        command: &SetupCommand,
        mut accept: impl FnMut(&[u8]) -> Option<T>,
    ) -> Result<T, DeviceError> {
        let socket = UdpSocket::bind(self.bind_addr).await?;
        let datagram = command.encode();

        let round = async {
            tokio::select! {
                reply = recv_matching(&socket, self.device_addr, &mut accept) => reply,
                err = send_after_settle(&socket, &datagram, self.device_addr, self.settle) => {
                    Err(err)
                }
            }
        };

        match tokio::time::timeout(self.exchange_timeout, round).await {
            Ok(result) => result,
            Err(_) => Err(DeviceError::Timeout),
        }
    }
}

impl DeviceSetup for DeviceLink {
    async fn query_version(&self) -> Result<f64, DeviceError> {
        self.exchange(&SetupCommand::Version, decode_version).await
    }

    async fn configure(&self, cfg: &ApConfig) -> Result<(), DeviceError> {
        self.exchange(&SetupCommand::ApConfigure(cfg.clone()), decode_configure_ack)
            .await
    }
}

/// Wait out the settle interval, transmit once, then park forever so the
/// receive branch keeps the select alive. Only a send failure resolves.
async fn send_after_settle(
    socket: &UdpSocket,
    datagram: &[u8],
    device_addr: SocketAddr,
    settle: Duration,
) -> DeviceError {
    tokio::time::sleep(settle).await;
    if let Err(e) = socket.send_to(datagram, device_addr).await {
        return DeviceError::Io(e);
    }
    debug!(%device_addr, bytes = datagram.len(), "setup command sent");
    std::future::pending().await
}

async fn recv_matching<T>(
    socket: &UdpSocket,
    device_addr: SocketAddr,
    accept: &mut impl FnMut(&[u8]) -> Option<T>,
) -> Result<T, DeviceError> {
    let mut buf = vec![0u8; 2048];
    loop {
        let (len, src) = socket.recv_from(&mut buf).await?;
        if src != device_addr {
            debug!(%src, "discarding datagram from unexpected sender");
            continue;
        }
        match accept(&buf[..len]) {
            Some(value) => return Ok(value),
            None => debug!("discarding non-matching datagram from the node"),
        }
    }
}
