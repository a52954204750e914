//! Network provisioning manager.
//!
//! Owns the single wireless radio and moves it between hotspot (AP) mode
//! and station mode through NetworkManager's `nmcli`:
//!
//! ```text
//!  is_connected()? ──no──▶ start_access_point() ──▶ portal ──▶ connect(ssid, pw)
//!                                                     ▲              │
//!                                                     └──[failure]───┤ (AP restarted)
//!                                                                    ▼
//!                                                                 Connected
//! ```
//!
//! ## Serialisation
//!
//! AP and station mode cannot coexist on one radio.  Every transition that
//! touches the radio (`start_access_point`, `stop_access_point`, `connect`)
//! holds the `radio` lock for its whole duration.  Read-only queries (scan,
//! status, saved profiles) do not take it, so the portal stays responsive
//! while a connect attempt is in flight.
//!
//! ## Failure policy
//!
//! No command failure is fatal.  Every external call is bounded by the
//! configured timeout; failures are logged, connect failures are classified
//! into a [`ConnectFailure`], and the hotspot is always brought back so the
//! user can retry.

pub mod failure;
pub mod nmcli;
pub mod scan;
pub mod state;

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::adapters::device_id::{self, ApSsid};
use crate::app::events::AppEvent;
use crate::app::ports::{CommandOutput, CommandRunner, EventSink};
use crate::config::PixieConfig;
use crate::error::{CommandError, ProvisioningError};

use failure::ConnectFailure;
use nmcli::WIFI_TYPE;
use scan::Network;
use state::{ProvisioningInput, ProvisioningState};

const NMCLI: &str = "nmcli";
const IPTABLES: &str = "iptables";

#[derive(Debug)]
struct Status {
    state: ProvisioningState,
    address: Option<String>,
}

pub struct ProvisioningManager {
    interface: String,
    ap_connection: String,
    ap_address: Ipv4Addr,
    ap_prefix: u8,
    portal_port: u16,
    timeout: Duration,
    ap_ssid: ApSsid,
    runner: Arc<dyn CommandRunner>,
    events: Arc<dyn EventSink>,
    status: Mutex<Status>,
    radio: Mutex<()>,
}

impl ProvisioningManager {
    /// Build the manager and derive the AP SSID from the interface MAC.
    pub fn new(
        config: &PixieConfig,
        runner: Arc<dyn CommandRunner>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let timeout = config.command_timeout();
        let ap_ssid = read_ap_ssid(runner.as_ref(), &config.wifi_interface, timeout);
        info!("NET: device hotspot name is '{}'", ap_ssid);
        Self {
            interface: config.wifi_interface.clone(),
            ap_connection: config.ap_connection_name.clone(),
            ap_address: config.ap_address,
            ap_prefix: config.ap_prefix,
            portal_port: config.portal_port,
            timeout,
            ap_ssid,
            runner,
            events,
            status: Mutex::new(Status {
                state: ProvisioningState::Unprovisioned,
                address: None,
            }),
            radio: Mutex::new(()),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn ap_ssid(&self) -> &str {
        &self.ap_ssid
    }

    pub fn ap_address(&self) -> Ipv4Addr {
        self.ap_address
    }

    pub fn state(&self) -> ProvisioningState {
        self.status().state
    }

    /// Address acquired by the last successful connect.
    pub fn address(&self) -> Option<String> {
        self.status().address.clone()
    }

    /// Payload for a QR code that joins the provisioning hotspot.
    pub fn wifi_qr_payload(&self) -> String {
        format!("WIFI:S:{};T:nopass;;", self.ap_ssid)
    }

    /// True iff the interface has an activated WiFi link that is not our hotspot.
    pub fn is_connected(&self) -> bool {
        let Some(out) = self.exec(
            NMCLI,
            &["-t", "-f", "TYPE,STATE,NAME", "connection", "show", "--active"],
            true,
        ) else {
            return false;
        };
        out.success()
            && nmcli::records(&out.stdout).any(|f| {
                f.len() >= 3
                    && f[0] == WIFI_TYPE
                    && f[1] == "activated"
                    && f[2] != self.ap_connection
            })
    }

    /// SSID of the network the station link is on, if any.
    pub fn current_network(&self) -> Option<String> {
        let out = self.exec(
            NMCLI,
            &["-t", "-f", "active,ssid", "dev", "wifi", "list", "ifname", self.interface.as_str()],
            true,
        )?;
        if !out.success() {
            return None;
        }
        nmcli::records(&out.stdout)
            .find(|f| f.len() >= 2 && f[0] == "yes")
            .map(|f| f[1].clone())
    }

    /// First IPv4 address on the interface.
    pub fn ip_address(&self) -> Option<Ipv4Addr> {
        let out = self.exec(
            NMCLI,
            &["-t", "-f", "IP4.ADDRESS", "device", "show", self.interface.as_str()],
            true,
        )?;
        if !out.success() {
            return None;
        }
        nmcli::first_ipv4(&out.stdout)
    }

    /// Fresh scan.  Never fails: command errors yield an empty list.
    pub fn scan_networks(&self) -> Vec<Network> {
        let _ = self.exec(NMCLI, &["dev", "wifi", "rescan", "ifname", self.interface.as_str()], false);
        let Some(out) = self.exec(
            NMCLI,
            &["-t", "-f", "SSID,SIGNAL,SECURITY,FREQ", "dev", "wifi", "list", "ifname", self.interface.as_str()],
            true,
        ) else {
            return Vec::new();
        };
        if !out.success() {
            return Vec::new();
        }
        let networks = scan::collect_networks(&out.stdout, &self.ap_ssid);
        debug!("NET: scan found {} network(s)", networks.len());
        networks
    }

    /// Saved WiFi profiles, excluding the hotspot profile.
    pub fn saved_networks(&self) -> Vec<String> {
        let Some(out) = self.exec(NMCLI, &["-t", "-f", "NAME,TYPE", "connection", "show"], true)
        else {
            return Vec::new();
        };
        if !out.success() {
            return Vec::new();
        }
        nmcli::records(&out.stdout)
            .filter(|f| f.len() >= 2 && f[1] == WIFI_TYPE && f[0] != self.ap_connection)
            .map(|mut f| f.swap_remove(0))
            .collect()
    }

    /// Delete a saved profile.  The hotspot profile cannot be forgotten.
    pub fn forget_network(&self, name: &str) -> bool {
        if name == self.ap_connection {
            warn!("NET: refusing to forget reserved profile '{}'", name);
            return false;
        }
        let ok = self
            .exec(NMCLI, &["connection", "delete", name], true)
            .is_some_and(|o| o.success());
        if ok {
            info!("NET: forgot network '{}'", name);
        }
        ok
    }

    // ── Radio transitions ─────────────────────────────────────

    /// Replace any stale hotspot profile with a fresh one and bring it up.
    pub fn start_access_point(&self) -> Result<(), ProvisioningError> {
        let _radio = self.radio();
        self.start_ap_locked()
    }

    /// Tear down the hotspot and its redirect rule.  Safe to call at any time.
    pub fn stop_access_point(&self) {
        let _radio = self.radio();
        self.stop_ap_locked();
    }

    /// Join `ssid`.  Returns the acquired address, or the classified failure
    /// after the hotspot has been restored.
    pub fn connect(&self, ssid: &str, password: Option<&str>) -> Result<String, ConnectFailure> {
        let _radio = self.radio();

        if self.state() == ProvisioningState::Connected {
            if let Some(address) = self.address() {
                info!("NET: already connected ({}), ignoring connect to '{}'", address, ssid);
                return Ok(address);
            }
        }

        info!("NET: attempting to connect to '{}'", ssid);
        self.stop_ap_locked();
        self.apply(ProvisioningInput::ConnectRequested);

        let mut args = vec!["dev", "wifi", "connect", ssid];
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            args.extend(["password", password]);
        }
        args.extend(["ifname", self.interface.as_str()]);

        let failure = match self.runner.run(NMCLI, &args, self.timeout) {
            Ok(out) if out.success() => {
                let address = self
                    .ip_address()
                    .map_or_else(|| "Connected".to_string(), |ip| ip.to_string());
                self.status().address = Some(address.clone());
                self.apply(ProvisioningInput::ConnectSucceeded);
                self.events.emit(&AppEvent::Connected {
                    ssid: ssid.to_string(),
                    address: address.clone(),
                });
                return Ok(address);
            }
            Ok(out) => {
                error!("NET: connect to '{}' failed: {}", ssid, out.stderr.trim());
                ConnectFailure::classify(&out.stderr)
            }
            Err(CommandError::TimedOut) => {
                error!("NET: connect to '{}' timed out after {:?}", ssid, self.timeout);
                ConnectFailure::TimedOut
            }
            Err(e) => {
                error!("NET: connect to '{}' could not run: {}", ssid, e);
                ConnectFailure::Failed
            }
        };

        self.events.emit(&AppEvent::ConnectFailed {
            ssid: ssid.to_string(),
            failure,
        });
        self.apply(ProvisioningInput::ConnectFailed);

        // Restart AP so the user can try again.
        if let Err(e) = self.start_ap_locked() {
            error!("NET: could not restore AP after failed connect: {}", e);
        }
        Err(failure)
    }

    // ── Internal ──────────────────────────────────────────────

    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn radio(&self) -> MutexGuard<'_, ()> {
        self.radio.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed `input` to the state machine; invalid inputs leave the state alone.
    fn apply(&self, input: ProvisioningInput) -> ProvisioningState {
        let mut status = self.status();
        let from = status.state;
        let Some(to) = from.next(input) else {
            debug!("NET: {:?} ignored in {:?}", input, from);
            return from;
        };
        status.state = to;
        drop(status);
        self.events.emit(&AppEvent::ProvisioningChanged { from, to });
        to
    }

    /// Run a command, logging timeouts and (when `check`) non-zero exits.
    fn exec(&self, program: &str, args: &[&str], check: bool) -> Option<CommandOutput> {
        match self.runner.run(program, args, self.timeout) {
            Ok(out) => {
                if check && !out.success() {
                    error!(
                        "NET: command failed: {} {}\nstderr: {}",
                        program,
                        args.join(" "),
                        out.stderr.trim()
                    );
                }
                Some(out)
            }
            Err(CommandError::TimedOut) => {
                error!("NET: command timed out: {} {}", program, args.join(" "));
                None
            }
            Err(e) => {
                error!("NET: {} {}: {}", program, args.join(" "), e);
                None
            }
        }
    }

    fn start_ap_locked(&self) -> Result<(), ProvisioningError> {
        info!("NET: starting AP mode '{}'", self.ap_ssid);
        let conn = self.ap_connection.as_str();

        let _ = self.exec(NMCLI, &["connection", "delete", conn], false);

        let address = format!("{}/{}", self.ap_address, self.ap_prefix);
        let created = self.exec(
            NMCLI,
            &[
                "connection", "add", "type", "wifi", "ifname", self.interface.as_str(),
                "con-name", conn, "autoconnect", "no", "ssid", self.ap_ssid.as_str(),
                "--", "wifi.mode", "ap", "wifi.band", "bg",
                "ipv4.method", "shared", "ipv4.addresses", address.as_str(),
            ],
            true,
        );
        if !created.is_some_and(|o| o.success()) {
            error!("NET: failed to create AP connection");
            return Err(ProvisioningError::ApCreateFailed);
        }

        let up = self.exec(NMCLI, &["connection", "up", conn], true);
        if !up.is_some_and(|o| o.success()) {
            error!("NET: failed to activate AP");
            return Err(ProvisioningError::ApActivateFailed);
        }

        info!("NET: AP active: {} on {}", self.ap_ssid, self.ap_address);
        // A crash while the hotspot was up leaves the old rule behind.
        self.remove_redirect();
        self.install_redirect();
        self.apply(ProvisioningInput::ApStarted);
        Ok(())
    }

    fn stop_ap_locked(&self) {
        info!("NET: stopping AP mode");
        self.remove_redirect();
        let conn = self.ap_connection.as_str();
        let _ = self.exec(NMCLI, &["connection", "down", conn], false);
        let _ = self.exec(NMCLI, &["connection", "delete", conn], false);
        self.apply(ProvisioningInput::ApStopped);
    }

    fn redirect_args<'a>(&'a self, op: &'a str, target: &'a str, port: &'a str) -> [&'a str; 15] {
        [
            "-t", "nat", op, "PREROUTING", "-i", self.interface.as_str(), "-p", "tcp",
            "--dport", port, "-j", "DNAT", "--to-destination", target, "-w",
        ]
    }

    /// Send all port-80 traffic from hotspot clients to the portal.
    fn install_redirect(&self) {
        let target = format!("{}:{}", self.ap_address, self.portal_port);
        let ok = self
            .exec(IPTABLES, &self.redirect_args("-A", &target, "80"), false)
            .is_some_and(|o| o.success());
        if ok {
            debug!("NET: captive redirect installed → {}", target);
        } else {
            warn!("NET: could not install captive redirect");
        }
    }

    fn remove_redirect(&self) {
        let target = format!("{}:{}", self.ap_address, self.portal_port);
        let _ = self.exec(IPTABLES, &self.redirect_args("-D", &target, "80"), false);
    }
}

/// `Pixie-XXXX` from the interface MAC, or the fallback name.
fn read_ap_ssid(runner: &dyn CommandRunner, interface: &str, timeout: Duration) -> ApSsid {
    let mac = runner
        .run(NMCLI, &["-t", "-f", "GENERAL.HWADDR", "device", "show", interface], timeout)
        .ok()
        .filter(CommandOutput::success)
        .and_then(|out| {
            nmcli::records(&out.stdout)
                .find(|f| f.len() >= 2 && f[0].starts_with("GENERAL.HWADDR"))
                .and_then(|f| device_id::parse_mac(&f[1..].join(":")))
        });
    match mac {
        Some(mac) => device_id::ap_ssid(&mac),
        None => {
            warn!("NET: could not read {} MAC, using fallback name", interface);
            device_id::fallback_ap_ssid()
        }
    }
}
