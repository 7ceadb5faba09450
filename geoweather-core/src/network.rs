//! Network availability checks.
//!
//! Hosts that report per-interface transports are judged on those; hosts
//! that cannot fall back to a plain "connected or connecting" signal. Any
//! check that cannot be performed counts as offline.

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use tokio::net::{TcpStream, lookup_host};
use tracing::debug;

const DEFAULT_SYSFS_NET: &str = "/sys/class/net";
const DEFAULT_PROBE_ADDR: &str = "api.openweathermap.org:443";
const PROBE_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
    Other,
}

impl Transport {
    /// Guess the transport from a kernel interface name.
    pub fn from_interface_name(name: &str) -> Self {
        if name.starts_with("wl") {
            Transport::Wifi
        } else if name.starts_with("ww") || name.starts_with("rmnet") {
            Transport::Cellular
        } else if name.starts_with("en") || name.starts_with("eth") {
            Transport::Ethernet
        } else {
            Transport::Other
        }
    }

    fn is_usable(&self) -> bool {
        !matches!(self, Transport::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityReport {
    /// Transports of every interface that is currently up.
    Capabilities(Vec<Transport>),
    /// Hosts without capability reporting.
    Legacy { connected_or_connecting: bool },
    Unknown,
}

impl ConnectivityReport {
    pub fn is_usable(&self) -> bool {
        match self {
            ConnectivityReport::Capabilities(transports) => {
                transports.iter().any(Transport::is_usable)
            }
            ConnectivityReport::Legacy { connected_or_connecting } => *connected_or_connecting,
            ConnectivityReport::Unknown => false,
        }
    }
}

#[async_trait]
pub trait NetworkAvailability: Send + Sync + Debug {
    async fn is_available(&self) -> bool;
}

/// Fixed answer, for overrides and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticNetwork(pub bool);

#[async_trait]
impl NetworkAvailability for StaticNetwork {
    async fn is_available(&self) -> bool {
        self.0
    }
}

/// Checks interfaces under `/sys/class/net`, or probes the API host with a
/// TCP connect when that tree is not available.
#[derive(Debug, Clone)]
pub struct SystemNetwork {
    sysfs_root: PathBuf,
    probe_addr: String,
    probe_timeout: Duration,
}

impl Default for SystemNetwork {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_NET),
            probe_addr: DEFAULT_PROBE_ADDR.to_string(),
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
        }
    }
}

impl SystemNetwork {
    pub fn new(sysfs_root: impl Into<PathBuf>, probe_addr: impl Into<String>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
            probe_addr: probe_addr.into(),
            ..Self::default()
        }
    }

    /// Interface capabilities when sysfs is readable, else the TCP probe.
    ///
    /// `Unknown` when the probe address cannot be resolved at all.
    pub async fn report(&self) -> ConnectivityReport {
        let root = self.sysfs_root.clone();
        match tokio::task::spawn_blocking(move || read_interfaces(&root)).await {
            Ok(Some(transports)) => return ConnectivityReport::Capabilities(transports),
            Ok(None) => {}
            Err(e) => debug!("Interface scan task failed: {e}"),
        }

        let addrs = match lookup_host(self.probe_addr.as_str()).await {
            Ok(addrs) => addrs.collect::<Vec<_>>(),
            Err(e) => {
                debug!(addr = %self.probe_addr, "Cannot resolve probe address: {e}");
                return ConnectivityReport::Unknown;
            }
        };

        let connect = TcpStream::connect(addrs.as_slice());
        let connected =
            matches!(tokio::time::timeout(self.probe_timeout, connect).await, Ok(Ok(_)));
        ConnectivityReport::Legacy {
            connected_or_connecting: connected,
        }
    }
}

#[async_trait]
impl NetworkAvailability for SystemNetwork {
    async fn is_available(&self) -> bool {
        let report = self.report().await;
        debug!(?report, "Network connectivity report");
        report.is_usable()
    }
}

/// Transports of all non-loopback interfaces whose operstate is `up`.
///
/// `None` when the directory cannot be read at all.
fn read_interfaces(root: &Path) -> Option<Vec<Transport>> {
    let entries = fs::read_dir(root).ok()?;

    let transports = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == "lo" {
                return None;
            }
            let state = fs::read_to_string(entry.path().join("operstate")).ok()?;
            (state.trim() == "up").then(|| Transport::from_interface_name(&name))
        })
        .collect();

    Some(transports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_interface(root: &Path, name: &str, state: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("operstate"), format!("{state}\n")).unwrap();
    }

    #[test]
    fn classifies_interface_names() {
        assert_eq!(Transport::from_interface_name("wlp3s0"), Transport::Wifi);
        assert_eq!(Transport::from_interface_name("wwan0"), Transport::Cellular);
        assert_eq!(Transport::from_interface_name("rmnet_data0"), Transport::Cellular);
        assert_eq!(Transport::from_interface_name("enp0s31f6"), Transport::Ethernet);
        assert_eq!(Transport::from_interface_name("eth0"), Transport::Ethernet);
        assert_eq!(Transport::from_interface_name("docker0"), Transport::Other);
    }

    #[test]
    fn report_rules() {
        let mixed = ConnectivityReport::Capabilities(vec![Transport::Other, Transport::Wifi]);
        assert!(mixed.is_usable());
        assert!(!ConnectivityReport::Capabilities(vec![Transport::Other]).is_usable());
        assert!(!ConnectivityReport::Capabilities(vec![]).is_usable());
        let legacy = |connected_or_connecting| ConnectivityReport::Legacy {
            connected_or_connecting,
        };
        assert!(legacy(true).is_usable());
        assert!(!legacy(false).is_usable());
        assert!(!ConnectivityReport::Unknown.is_usable());
    }

    #[tokio::test]
    async fn sysfs_with_up_ethernet_is_available() {
        let dir = tempfile::tempdir().unwrap();
        fake_interface(dir.path(), "lo", "unknown");
        fake_interface(dir.path(), "eth0", "up");
        fake_interface(dir.path(), "wlan0", "down");

        let network = SystemNetwork::new(dir.path(), "127.0.0.1:9");
        assert_eq!(
            network.report().await,
            ConnectivityReport::Capabilities(vec![Transport::Ethernet])
        );
        assert!(network.is_available().await);
    }

    #[tokio::test]
    async fn sysfs_with_only_virtual_interfaces_is_offline() {
        let dir = tempfile::tempdir().unwrap();
        fake_interface(dir.path(), "lo", "unknown");
        fake_interface(dir.path(), "docker0", "up");
        fake_interface(dir.path(), "eth0", "down");

        let network = SystemNetwork::new(dir.path(), "127.0.0.1:9");
        assert!(!network.is_available().await);
    }

    #[tokio::test]
    async fn missing_sysfs_falls_back_to_probe() {
        let dir = tempfile::tempdir().unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let network = SystemNetwork::new(dir.path().join("missing"), addr);
        assert_eq!(
            network.report().await,
            ConnectivityReport::Legacy {
                connected_or_connecting: true,
            }
        );
    }

    #[tokio::test]
    async fn unresolvable_probe_address_is_unknown() {
        let dir = tempfile::tempdir().unwrap();

        let network = SystemNetwork::new(dir.path().join("missing"), "no port here");
        assert_eq!(network.report().await, ConnectivityReport::Unknown);
        assert!(!network.is_available().await);
    }

    #[tokio::test]
    async fn static_network_reports_its_value() {
        assert!(StaticNetwork(true).is_available().await);
        assert!(!StaticNetwork(false).is_available().await);
    }
}
