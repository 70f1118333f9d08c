//! The provisioning workflow
//!
//! A strictly ordered sequence of phases that takes a factory-fresh node
//! from unconfigured to named-and-online:
//!
//! 1. log in to the Wio server
//! 2. register a placeholder node
//! 3. operator joins the node's access point
//! 4. query firmware version + push the AP configuration (retryable as a
//!    unit on timeout, operator-confirmed)
//! 5. operator rejoins an internet-connected access point
//! 6. poll the server until the node reports online (lenient: exhaustion
//!    degrades to a diagnostic, never fails the run)
//! 7. rename the node to its final name
//!
//! Phases never run concurrently and no phase is reentered except the
//! explicit configure retry. The workflow is generic over its three
//! collaborators so it can be exercised end-to-end against scripted fakes.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use tracing::{info, warn};

use crate::device::protocol::{ApConfig, ServerEndpoint};
use crate::device::{DeviceError, DeviceSetup};
use crate::directory::types::TEMPORARY_NODE_NAME;
use crate::directory::{Directory, NodeCredentials, Session};
use crate::error::ProvisionError;
use crate::prompt::Operator;

/// Firmware older than this cannot resolve hostnames and must be handed
/// the directory server as a numeric address.
const HOSTNAME_CAPABLE_VERSION: f64 = 1.2;

pub const DEFAULT_ONLINE_POLL_ATTEMPTS: u32 = 60;
pub const DEFAULT_ONLINE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Everything a run needs, supplied once at start and read-only after.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    /// Final display name applied in the rename phase.
    pub device_name: String,
    /// Directory server hostname (no scheme).
    pub server_host: String,
    pub email: String,
    pub password: String,
    pub wifi_ssid: String,
    pub wifi_password: String,
    /// Board type reported at registration, e.g. "Wio Node v1.0".
    pub board: String,
}

/// Last node status observed by the online poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineStatus {
    /// The node was not present in the listing.
    Unknown,
    Offline,
    Online,
}

impl fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnlineStatus::Unknown => write!(f, "unknown"),
            OnlineStatus::Offline => write!(f, "offline"),
            OnlineStatus::Online => write!(f, "online"),
        }
    }
}

/// Terminal success: the node is bound, named, and its last observed
/// status is attached as a diagnostic.
#[derive(Debug)]
pub struct ProvisioningReport {
    pub node_sn: String,
    pub name: String,
    pub online: OnlineStatus,
}

pub struct Provisioner<D, L, O> {
    directory: D,
    device: L,
    operator: O,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl<D: Directory, L: DeviceSetup, O: Operator> Provisioner<D, L, O> {
    pub fn new(directory: D, device: L, operator: O) -> Self {
        Self {
            directory,
            device,
            operator,
            poll_attempts: DEFAULT_ONLINE_POLL_ATTEMPTS,
            poll_interval: DEFAULT_ONLINE_POLL_INTERVAL,
        }
    }

    pub fn with_poll_budget(mut self, attempts: u32, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    /// Run the whole workflow. On error the run is over; nothing resumes.
    pub async fn run(
        &mut self,
        request: &ProvisioningRequest,
    ) -> Result<ProvisioningReport, ProvisionError> {
        info!(server = %request.server_host, "logging in to the Wio server");
        let session = self
            .directory
            .login(&request.email, &request.password)
            .await
            .map_err(ProvisionError::AuthenticationFailed)?;
        info!(user_id = %session.user_id, "logged in");

        info!(board = %request.board, "registering a new node");
        let creds = self
            .directory
            .create_node(&session, TEMPORARY_NODE_NAME, &request.board)
            .await
            .map_err(ProvisionError::Directory)?;
        info!(node_sn = %creds.node_sn, "node registered");

        self.operator
            .checkpoint("Join the node's access point, then press ENTER.")?;

        self.configure_until_done(request, &creds).await?;

        self.operator
            .checkpoint("Rejoin an internet-connected access point, then press ENTER.")?;

        let online = self.await_online(&session, &creds).await?;

        info!(name = %request.device_name, "renaming the node");
        self.directory
            .rename_node(&session, &creds.node_sn, &request.device_name)
            .await
            .map_err(ProvisionError::Directory)?;

        info!(node_sn = %creds.node_sn, status = %online, "provisioning complete");
        Ok(ProvisioningReport {
            node_sn: creds.node_sn.clone(),
            name: request.device_name.clone(),
            online,
        })
    }

    /// Phase 4 as a retryable unit: a timeout in either exchange offers the
    /// operator a replay of the whole unit; any other failure is final.
    async fn configure_until_done(
        &mut self,
        request: &ProvisioningRequest,
        creds: &NodeCredentials,
    ) -> Result<(), ProvisionError> {
        loop {
            match self.configure_once(request, creds).await {
                Ok(()) => return Ok(()),
                Err(ProvisionError::Device(DeviceError::Timeout)) => {
                    warn!("the node did not answer in time");
                    if !self.operator.confirm("Retry? [Y/n] ")? {
                        return Err(ProvisionError::OperatorAbort);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn configure_once(
        &mut self,
        request: &ProvisioningRequest,
        creds: &NodeCredentials,
    ) -> Result<(), ProvisionError> {
        info!("querying the node's firmware version");
        let version = self
            .device
            .query_version()
            .await
            .map_err(ProvisionError::Device)?;
        info!(version, "node answered");

        let server = if version < HOSTNAME_CAPABLE_VERSION {
            warn!(
                version,
                "firmware cannot resolve hostnames; passing the server by numeric address \
                 (firmware update strongly recommended)"
            );
            ServerEndpoint::Ip(resolve_host(&request.server_host).await?)
        } else {
            ServerEndpoint::Hostname(request.server_host.clone())
        };

        info!("configuring the node");
        let cfg = ApConfig {
            ssid: request.wifi_ssid.clone(),
            wifi_password: request.wifi_password.clone(),
            node_key: creds.node_key.clone(),
            node_sn: creds.node_sn.clone(),
            server,
        };
        self.device
            .configure(&cfg)
            .await
            .map_err(ProvisionError::Device)?;
        info!("node configured");
        Ok(())
    }

    /// Poll the node listing until the node reports online, once per
    /// interval, up to the attempt budget. Exhaustion is not a failure;
    /// the last observed status is reported and the run continues.
    async fn await_online(
        &mut self,
        session: &Session,
        creds: &NodeCredentials,
    ) -> Result<OnlineStatus, ProvisionError> {
        info!("waiting for the node to come online");
        let mut last = OnlineStatus::Unknown;
        for attempt in 0..self.poll_attempts {
            let nodes = self
                .directory
                .list_nodes(session)
                .await
                .map_err(ProvisionError::Directory)?;
            last = match nodes.iter().find(|n| n.node_sn == creds.node_sn) {
                None => OnlineStatus::Unknown,
                Some(node) if node.online => OnlineStatus::Online,
                Some(_) => OnlineStatus::Offline,
            };
            info!(attempt, status = %last, "node status");
            if last == OnlineStatus::Online {
                return Ok(last);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        warn!(
            attempts = self.poll_attempts,
            last_status = %last,
            "node never reported online; continuing anyway"
        );
        Ok(last)
    }
}

async fn resolve_host(host: &str) -> Result<IpAddr, ProvisionError> {
    let mut addrs = tokio::net::lookup_host((host, 443))
        .await
        .map_err(|_| ProvisionError::HostResolution(host.to_string()))?;
    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ProvisionError::HostResolution(host.to_string()))
}
