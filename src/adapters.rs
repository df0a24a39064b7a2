// ============================================
// adapters.rs - Adapter records extracted from ipconfig /all
// ============================================
//
// ipconfig /all prints one block per network adapter:
//
//   Ethernet adapter Ethernet:
//
//      Media State . . . . . . . . . . . : Connected
//      Physical Address. . . . . . . . . : AA-BB-CC-DD-EE-FF
//      IPv4 Address. . . . . . . . . . . : 192.168.1.10(Preferred)
//      Subnet Mask . . . . . . . . . . . : 255.255.255.0
//      Default Gateway . . . . . . . . . : fe80::1%12
//                                          192.168.1.1
//
// We scan the text once, top to bottom. A header line opens a block and
// every following field line belongs to that adapter until the next header.
// Lines before the first header, and lines we don't recognise, are skipped.
// Nothing in here can fail: bad input just produces fewer fields.
// ============================================

use indexmap::IndexMap;
use serde::Serialize;

use crate::labels::{CompiledLabels, FieldKind};

// ============================================
// DATA STRUCTURES
// ============================================

/// Link state of an adapter, taken from its media state line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LinkStatus {
    Connected,
    #[default]
    Disconnected,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Connected => "Connected",
            LinkStatus::Disconnected => "Disconnected",
        }
    }
}

/// One field of an adapter record.
///
/// `NotSeen` and `Blank` both print as "N/A", but they are different facts:
/// the first means ipconfig never printed the line, the second means it
/// printed the label with nothing after the colon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    #[default]
    NotSeen,
    Blank,
    Value(String),
}

impl FieldValue {
    pub fn value(&self) -> Option<&str> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::NotSeen | FieldValue::Blank => None,
        }
    }
}

/// Everything we know about one adapter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AdapterRecord {
    /// Display name as printed by ipconfig, e.g. "Wi-Fi" or "Ethernet 2"
    pub name: String,
    pub status: LinkStatus,
    pub ipv4: FieldValue,
    pub subnet_mask: FieldValue,
    pub gateway: FieldValue,
    pub mac: FieldValue,
}

impl AdapterRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn field_mut(&mut self, kind: FieldKind) -> &mut FieldValue {
        match kind {
            FieldKind::Ipv4 => &mut self.ipv4,
            FieldKind::SubnetMask => &mut self.subnet_mask,
            FieldKind::DefaultGateway => &mut self.gateway,
            FieldKind::PhysicalAddress => &mut self.mac,
        }
    }
}

/// Adapters keyed by name, in the order ipconfig printed them.
pub type AdapterMap = IndexMap<String, AdapterRecord>;

// ============================================
// SCANNER STATE
// ============================================

/// Where the scan currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// No header seen yet: field lines are ignored
    NoAdapter,
    /// Inside an adapter block
    InAdapter {
        name: String,
        /// The gateway line printed an IPv6 address; the IPv4 gateway
        /// (if any) follows on its own unlabelled line.
        awaiting_gateway: bool,
    },
}

/// Single-pass scanner over ipconfig /all text.
pub struct AdapterScanner<'a> {
    labels: &'a CompiledLabels,
    state: ScanState,
    adapters: AdapterMap,
}

impl<'a> AdapterScanner<'a> {
    pub fn new(labels: &'a CompiledLabels) -> Self {
        Self {
            labels,
            state: ScanState::NoAdapter,
            adapters: AdapterMap::new(),
        }
    }

    /// Feed one line of output.
    pub fn feed_line(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = self.labels.header_rest(line) {
            if self.start_adapter(rest) {
                return;
            }
        }

        let ScanState::InAdapter {
            name,
            awaiting_gateway,
        } = &mut self.state
        else {
            return;
        };

        // Headers always come first, so this can't miss. If it ever does,
        // drop the line instead of creating an orphan record.
        let Some(record) = self.adapters.get_mut(name.as_str()) else {
            return;
        };

        let pending_gateway = std::mem::take(awaiting_gateway);

        if let Some(value) = self.labels.media_state_value(line) {
            record.status = classify_media_state(self.labels, value);
            return;
        }

        if let Some((kind, raw)) = self.labels.field(line) {
            match extract_value(kind, raw) {
                Extracted::Value(v) => *record.field_mut(kind) = FieldValue::Value(v),
                Extracted::Blank => *record.field_mut(kind) = FieldValue::Blank,
                Extracted::Unparsed => {
                    if kind == FieldKind::DefaultGateway {
                        *awaiting_gateway = true;
                    }
                }
            }
            return;
        }

        if pending_gateway {
            if let Some(ip) = whole_line_ipv4(line) {
                record.gateway = FieldValue::Value(ip);
            }
        }
    }

    /// Handle a header line. Returns false if no adapter name could be
    /// pulled out of it, in which case the line is not a header after all.
    fn start_adapter(&mut self, rest: &str) -> bool {
        let Some((name, trailing)) = split_header(rest) else {
            return false;
        };

        let record = self
            .adapters
            .entry(name.clone())
            .or_insert_with(|| AdapterRecord::new(&name));

        if let Some(value) = self.labels.media_state_in(trailing) {
            record.status = classify_media_state(self.labels, value);
        }

        self.state = ScanState::InAdapter {
            name,
            awaiting_gateway: false,
        };
        true
    }

    /// Stop scanning and hand back the records.
    pub fn finish(self) -> AdapterMap {
        self.adapters
    }
}

/// Scan a whole dump. Same input, same output: no I/O, no shared state.
pub fn parse_adapters(text: &str, labels: &CompiledLabels) -> AdapterMap {
    // Files saved by Notepad or PowerShell start with a byte order mark
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut scanner = AdapterScanner::new(labels);
    for line in text.lines() {
        scanner.feed_line(line);
    }

    let adapters = scanner.finish();
    log::debug!("[Adapters] Parsed {} adapter block(s)", adapters.len());
    adapters
}

// ============================================
// LINE HELPERS
// ============================================

/// Split the text after a header label into (name, trailing text).
///
///   " Ethernet 2:"                         -> ("Ethernet 2", "")
///   " Wi-Fi: Media State . . : Connected"  -> ("Wi-Fi", " Media State . . : Connected")
///   ": Ethernet"                           -> ("Ethernet", "")
///
/// The last form appears when the label itself is followed by a colon;
/// then only the text after the final colon is the name.
fn split_header(rest: &str) -> Option<(String, &str)> {
    let (before, after) = rest.split_once(':')?;

    let name = before.trim();
    if !name.is_empty() {
        return Some((name.to_string(), after));
    }

    let name = rest.rsplit(':').next().unwrap_or("").trim();
    if name.is_empty() {
        None
    } else {
        Some((name.to_string(), ""))
    }
}

fn classify_media_state(labels: &CompiledLabels, value: &str) -> LinkStatus {
    if labels.is_disconnected(value) {
        LinkStatus::Disconnected
    } else {
        LinkStatus::Connected
    }
}

enum Extracted {
    Value(String),
    Blank,
    /// Something was printed but it isn't a value we understand
    Unparsed,
}

fn extract_value(kind: FieldKind, raw: &str) -> Extracted {
    let raw = raw.trim();
    if raw.is_empty() {
        return Extracted::Blank;
    }

    let value = match kind {
        FieldKind::Ipv4 | FieldKind::SubnetMask | FieldKind::DefaultGateway => {
            leading_ipv4(raw)
        }
        FieldKind::PhysicalAddress => leading_mac(raw),
    };

    match value {
        Some(v) => Extracted::Value(v),
        None => Extracted::Unparsed,
    }
}

/// Dotted quad at the start of `raw`: "192.168.1.10(Preferred)" -> "192.168.1.10"
fn leading_ipv4(raw: &str) -> Option<String> {
    let end = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let candidate = &raw[..end];

    let octets: Vec<&str> = candidate.split('.').collect();
    let valid = octets.len() == 4
        && octets
            .iter()
            .all(|o| !o.is_empty() && o.len() <= 3 && o.parse::<u8>().is_ok());

    if valid {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// A line holding nothing but an IPv4 address (gateway continuation line).
fn whole_line_ipv4(line: &str) -> Option<String> {
    let trimmed = line.trim();
    leading_ipv4(trimmed).filter(|ip| ip.len() == trimmed.len())
}

/// Six hex pairs joined by '-' or ':' at the start of `raw`.
fn leading_mac(raw: &str) -> Option<String> {
    let candidate: String = raw.chars().take(17).collect();
    if candidate.len() != 17 {
        return None;
    }

    let bytes = candidate.as_bytes();
    let separator = bytes[2];
    if separator != b'-' && separator != b':' {
        return None;
    }

    let valid = bytes.chunks(3).all(|chunk| {
        chunk[0].is_ascii_hexdigit()
            && chunk[1].is_ascii_hexdigit()
            && (chunk.len() == 2 || chunk[2] == separator)
    });

    // "AA-BB-CC-DD-EE-FF-00-00" is a tunnel's 8-byte address, not a MAC
    let followed_by_more = raw[candidate.len()..].starts_with(|c: char| c == '-' || c == ':');

    if valid && !followed_by_more {
        Some(candidate)
    } else {
        None
    }
}

// ============================================
// TESTS
// ============================================
