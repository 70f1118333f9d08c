//! Node Simulator
//!
//! Pretends to be a Wio board hosting its setup access point: answers
//! `VERSION` with a configurable firmware version and acknowledges
//! `APCFG: ` configuration pushes. Useful for exercising the provisioning
//! flow without hardware.
//!
//! Usage: cargo run --bin node-sim [bind_addr] [version]

use std::env;
use tokio::net::UdpSocket;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let bind_addr = env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:1025".to_string());
    let version = env::args().nth(2).unwrap_or_else(|| "1.2".to_string());

    let socket = UdpSocket::bind(&bind_addr).await?;
    println!("Wio node simulator");
    println!("  Listening on: {}", bind_addr);
    println!("  Firmware version: {}", version);
    println!();

    let mut buf = [0u8; 2048];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        let Ok(text) = std::str::from_utf8(&buf[..len]) else {
            println!("Ignoring {} undecodable bytes from {}", len, from);
            continue;
        };

        if text.trim() == "VERSION" {
            println!("VERSION from {} -> {}", from, version);
            socket.send_to(version.as_bytes(), from).await?;
        } else if let Some(rest) = text.strip_prefix("APCFG: ") {
            println!("APCFG from {}", from);
            let fields: Vec<&str> = rest.split('\t').collect();
            if let [ssid, _password, node_key, node_sn, server, ..] = fields[..] {
                println!("  ssid:     {}", ssid);
                println!("  node_sn:  {}", node_sn);
                println!("  node_key: {}", node_key);
                println!("  server:   {}", server);
            } else {
                println!("  (short configuration, {} fields)", fields.len());
            }
            socket.send_to(b"ok\r\n", from).await?;
            println!("  -> ok");
        } else {
            println!("Ignoring {} bytes from {}: {:?}", len, from, text.trim_end());
        }
    }
}
