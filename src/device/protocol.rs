//! Wio node AP-mode setup protocol
//!
//! An unconfigured node runs its own access point and listens on UDP port
//! 1025 for plain-text setup commands. There is no framing, no checksum and
//! no delivery guarantee; each command is a single datagram and each reply
//! is a single datagram from the node's fixed address.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// UDP port the node listens on in AP mode. Replies are addressed to the
/// same port on the control machine, so the local socket binds it too.
pub const SETUP_PORT: u16 = 1025;

/// Fixed address of an unconfigured node on its own access point.
pub const DEVICE_AP_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 4, 1));

/// Literal reply acknowledging a successful `APCFG: ` command.
pub const CONFIGURE_ACK: &[u8] = b"ok\r\n";

/// The node's fixed setup address (`192.168.4.1:1025`).
pub fn device_ap_addr() -> SocketAddr {
    SocketAddr::new(DEVICE_AP_IP, SETUP_PORT)
}

/// Server value substituted into the `APCFG: ` payload.
///
/// Firmware older than 1.2 cannot resolve hostnames, so the directory
/// server must be handed over as a numeric address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEndpoint {
    Hostname(String),
    Ip(IpAddr),
}

impl ServerEndpoint {
    fn as_field(&self) -> String {
        match self {
            ServerEndpoint::Hostname(host) => host.clone(),
            ServerEndpoint::Ip(ip) => ip.to_string(),
        }
    }
}

/// Everything the node needs to leave AP mode and bind to the directory.
#[derive(Debug, Clone)]
pub struct ApConfig {
    pub ssid: String,
    pub wifi_password: String,
    pub node_key: String,
    pub node_sn: String,
    pub server: ServerEndpoint,
}

/// The closed set of setup commands this tool sends.
#[derive(Debug, Clone)]
pub enum SetupCommand {
    /// Ask the node for its firmware version.
    Version,
    /// Push Wi-Fi credentials and the directory binding.
    ApConfigure(ApConfig),
}

impl SetupCommand {
    /// Encode the command into its wire datagram.
    ///
    /// `APCFG: ` carries the server field twice; the firmware expects both
    /// and they must stay identical (observed wire format, not collapsible).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            SetupCommand::Version => b"VERSION".to_vec(),
            SetupCommand::ApConfigure(cfg) => {
                let server = cfg.server.as_field();
                format!(
                    "APCFG: {}\t{}\t{}\t{}\t{}\t{}\t",
                    cfg.ssid, cfg.wifi_password, cfg.node_key, cfg.node_sn, server, server
                )
                .into_bytes()
            }
        }
    }
}

/// Decode a `VERSION` reply: UTF-8 decimal, surrounding ASCII whitespace
/// tolerated (firmware appends CRLF). Anything unparseable is not the reply.
pub fn decode_version(payload: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(payload).ok()?;
    text.trim().parse::<f64>().ok()
}

/// Decode an `APCFG: ` reply: the literal `ok\r\n`, nothing else.
pub fn decode_configure_ack(payload: &[u8]) -> Option<()> {
    (payload == CONFIGURE_ACK).then_some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_encoding() {
        assert_eq!(SetupCommand::Version.encode(), b"VERSION");
    }

    #[test]
    fn test_apcfg_encoding_repeats_server_field() {
        let cmd = SetupCommand::ApConfigure(ApConfig {
            ssid: "home".into(),
            wifi_password: "secret".into(),
            node_key: "K".into(),
            node_sn: "abc123".into(),
            server: ServerEndpoint::Hostname("wio.example.com".into()),
        });
        assert_eq!(
            cmd.encode(),
            b"APCFG: home\tsecret\tK\tabc123\twio.example.com\twio.example.com\t".to_vec()
        );
    }

    #[test]
    fn test_apcfg_encoding_ip_dialect() {
        let cmd = SetupCommand::ApConfigure(ApConfig {
            ssid: "home".into(),
            wifi_password: "".into(),
            node_key: "K".into(),
            node_sn: "abc123".into(),
            server: ServerEndpoint::Ip("203.0.113.9".parse().unwrap()),
        });
        assert_eq!(
            cmd.encode(),
            b"APCFG: home\t\tK\tabc123\t203.0.113.9\t203.0.113.9\t".to_vec()
        );
    }

    #[test]
    fn test_decode_version() {
        assert_eq!(decode_version(b"1.2"), Some(1.2));
        assert_eq!(decode_version(b"1.19999\r\n"), Some(1.19999));
        assert_eq!(decode_version(b" 2.0 "), Some(2.0));
    }

    #[test]
    fn test_decode_version_rejects_garbage() {
        assert_eq!(decode_version(b"ok\r\n"), None);
        assert_eq!(decode_version(b""), None);
        assert_eq!(decode_version(b"1.2.3"), None);
        assert_eq!(decode_version(&[0xff, 0xfe]), None);
    }

    #[test]
    fn test_decode_configure_ack_is_exact() {
        assert_eq!(decode_configure_ack(b"ok\r\n"), Some(()));
        assert_eq!(decode_configure_ack(b"ok"), None);
        assert_eq!(decode_configure_ack(b"ok\n"), None);
        assert_eq!(decode_configure_ack(b"OK\r\n"), None);
        assert_eq!(decode_configure_ack(b"1.2"), None);
    }

    #[test]
    fn test_device_ap_addr() {
        assert_eq!(device_ap_addr().to_string(), "192.168.4.1:1025");
    }
}
