//! Helpers for NetworkManager's terse (`-t`) output.
//!
//! Terse mode separates fields with `:` and escapes literal colons and
//! backslashes inside a field as `\:` and `\\`.  SSIDs and MAC addresses
//! routinely contain colons, so naive splitting is wrong.

use std::net::Ipv4Addr;

/// `nmcli` connection type for WiFi profiles.
pub const WIFI_TYPE: &str = "802-11-wireless";

/// Split one terse line into unescaped fields.
pub fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Non-empty lines of `stdout`, each split into fields.
pub fn records(stdout: &str) -> impl Iterator<Item = Vec<String>> + '_ {
    stdout.lines().filter(|l| !l.trim().is_empty()).map(split_terse)
}

/// First dotted-quad IPv4 address anywhere in `text`
/// (e.g. `IP4.ADDRESS[1]:192.168.1.23/24`).
pub fn first_ipv4(text: &str) -> Option<Ipv4Addr> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|token| token.matches('.').count() == 3)
        .find_map(|token| token.parse().ok())
}
