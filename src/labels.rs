// ============================================
// labels.rs - Locale label tables for ipconfig output
// ============================================
//
// ipconfig prints its labels in the language of the Windows install:
//
//   English:     IPv4 Address. . . . . . . . . . . : 192.168.1.10(Preferred)
//   Portuguese:  Endereço IPv4. . . . . . . . . . . : 192.168.1.10(Preferencial)
//
// The parser never hardcodes those strings. Instead it works from a
// LabelTable: plain lists of phrases per field. The built-in table knows
// English and Brazilian Portuguese; anything else can be added with a
// wintools_labels.toml file next to the EXE:
//
//   header = ["Ethernet-Adapter", "Drahtlos-LAN-Adapter"]
//   ipv4 = ["IPv4-Adresse"]
//
// Keys left out of the file keep their built-in values.
// ============================================

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

// ============================================
// LABEL TABLE
// ============================================

/// Phrases that identify each kind of line in an ipconfig /all dump.
/// Matching is always case-insensitive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelTable {
    /// Start of an adapter header line, e.g. "Ethernet adapter"
    pub header: Vec<String>,

    /// Label of the media state line, e.g. "Media State"
    pub media_state: Vec<String>,

    /// Value text meaning the cable/radio is down, e.g. "Media disconnected"
    pub disconnected: Vec<String>,

    pub ipv4: Vec<String>,
    pub subnet_mask: Vec<String>,
    pub default_gateway: Vec<String>,
    pub physical_address: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl LabelTable {
    /// Labels printed by an English Windows install.
    pub fn english() -> Self {
        Self {
            header: strings(&[
                "Ethernet adapter",
                "Wireless LAN adapter",
                "Local Area Connection adapter",
                "Loopback adapter",
                "Tunnel adapter",
                "PPP adapter",
            ]),
            media_state: strings(&["Media State"]),
            disconnected: strings(&["Media disconnected"]),
            ipv4: strings(&["IPv4 Address", "IP Address"]),
            subnet_mask: strings(&["Subnet Mask"]),
            default_gateway: strings(&["Default Gateway"]),
            physical_address: strings(&["Physical Address"]),
        }
    }

    /// Labels printed by a Brazilian Portuguese Windows install.
    pub fn portuguese() -> Self {
        Self {
            header: strings(&[
                "Adaptador Ethernet",
                "Adaptador de Rede Sem Fio",
                "Adaptador de Rede Local",
                "Adaptador de Loopback",
                "Adaptador de Túnel",
            ]),
            media_state: strings(&["Estado da mídia"]),
            disconnected: strings(&["Mídia desconectada"]),
            ipv4: strings(&["Endereço IPv4", "Endereço IP"]),
            subnet_mask: strings(&["Máscara de Sub-rede"]),
            default_gateway: strings(&["Gateway Padrão"]),
            physical_address: strings(&["Endereço Físico"]),
        }
    }

    /// Append every label of `other` that this table doesn't already have.
    pub fn merge(mut self, other: LabelTable) -> Self {
        fn extend(into: &mut Vec<String>, from: Vec<String>) {
            for label in from {
                if !into.iter().any(|l| l.eq_ignore_ascii_case(&label)) {
                    into.push(label);
                }
            }
        }

        extend(&mut self.header, other.header);
        extend(&mut self.media_state, other.media_state);
        extend(&mut self.disconnected, other.disconnected);
        extend(&mut self.ipv4, other.ipv4);
        extend(&mut self.subnet_mask, other.subnet_mask);
        extend(&mut self.default_gateway, other.default_gateway);
        extend(&mut self.physical_address, other.physical_address);
        self
    }

    /// Parse a table from TOML text. Missing keys keep the built-in labels.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: LabelTable =
            toml::from_str(content).context("Failed to parse label table TOML")?;
        Ok(table)
    }

    /// Load a table from a TOML file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read label file: {}", path.display()))?;
        let table = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid label file: {}", path.display()))?;

        log::info!("[Labels] Loaded label table from: {}", path.display());
        Ok(table)
    }

    /// Turn the phrase lists into the regexes the parser runs.
    pub fn compile(&self) -> Result<CompiledLabels> {
        let header = Regex::new(&format!(
            r"(?i)^\s*(?:{})(?P<rest>.*)$",
            alternation(&self.header)
        ))
        .context("Invalid header labels")?;

        Ok(CompiledLabels {
            header,
            media_state: field_regex(&self.media_state).context("Invalid media state labels")?,
            ipv4: field_regex(&self.ipv4).context("Invalid IPv4 labels")?,
            subnet_mask: field_regex(&self.subnet_mask).context("Invalid subnet mask labels")?,
            default_gateway: field_regex(&self.default_gateway)
                .context("Invalid default gateway labels")?,
            physical_address: field_regex(&self.physical_address)
                .context("Invalid physical address labels")?,
            media_state_anywhere: Regex::new(&format!(
                r"(?i)(?:{})[\s.]*:(?P<value>.*)$",
                alternation(&self.media_state)
            ))
            .context("Invalid media state labels")?,
            disconnected: self.disconnected.iter().map(|s| s.to_lowercase()).collect(),
        })
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::english().merge(Self::portuguese())
    }
}

/// Escaped `a|b|c`. An empty list becomes a pattern that can never match,
/// so a table with no labels for a field simply never fills that field.
fn alternation(labels: &[String]) -> String {
    let parts: Vec<String> = labels
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(regex::escape)
        .collect();

    if parts.is_empty() {
        r"\b\B".to_string()
    } else {
        parts.join("|")
    }
}

/// `Label . . . . : value` anchored at the start of the line.
/// ipconfig pads labels with a variable run of ". " before the colon.
fn field_regex(labels: &[String]) -> Result<Regex> {
    let re = Regex::new(&format!(
        r"(?i)^\s*(?:{})[\s.]*:\s*(?P<value>.*?)\s*$",
        alternation(labels)
    ))?;
    Ok(re)
}

// ============================================
// COMPILED MATCHERS
// ============================================

/// Ready-to-run form of a LabelTable.
#[derive(Debug, Clone)]
pub struct CompiledLabels {
    header: Regex,
    media_state: Regex,
    media_state_anywhere: Regex,
    ipv4: Regex,
    subnet_mask: Regex,
    default_gateway: Regex,
    physical_address: Regex,
    /// Lowercased disconnected markers
    disconnected: Vec<String>,
}

/// Which labelled field a line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Ipv4,
    SubnetMask,
    DefaultGateway,
    PhysicalAddress,
}

impl CompiledLabels {
    /// Built-in English + Portuguese matchers.
    pub fn builtin() -> Result<Self> {
        LabelTable::default().compile()
    }

    /// Everything after the header label, if `line` is a header line.
    pub fn header_rest<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.header
            .captures(line)
            .and_then(|c| c.name("rest"))
            .map(|m| m.as_str())
    }

    /// Value of a standalone `Media State . . . : value` line.
    pub fn media_state_value<'a>(&self, line: &'a str) -> Option<&'a str> {
        capture_value(&self.media_state, line)
    }

    /// Value of a media state label found anywhere in `text`
    /// (used for the trailing text of a header line).
    pub fn media_state_in<'a>(&self, text: &'a str) -> Option<&'a str> {
        capture_value(&self.media_state_anywhere, text).map(str::trim)
    }

    /// True if a media state value says the link is down.
    pub fn is_disconnected(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        self.disconnected.iter().any(|marker| value.contains(marker.as_str()))
    }

    /// First field label matching `line`, in fixed priority order:
    /// IPv4, subnet mask, default gateway, physical address.
    pub fn field<'a>(&self, line: &'a str) -> Option<(FieldKind, &'a str)> {
        [
            (FieldKind::Ipv4, &self.ipv4),
            (FieldKind::SubnetMask, &self.subnet_mask),
            (FieldKind::DefaultGateway, &self.default_gateway),
            (FieldKind::PhysicalAddress, &self.physical_address),
        ]
        .into_iter()
        .find_map(|(kind, re)| capture_value(re, line).map(|value| (kind, value)))
    }
}

fn capture_value<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line)
        .and_then(|c| c.name("value"))
        .map(|m| m.as_str())
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_both_languages() {
        let table = LabelTable::default();
        assert!(table.header.iter().any(|l| l == "Ethernet adapter"));
        assert!(table.header.iter().any(|l| l == "Adaptador Ethernet"));
        assert!(table.ipv4.iter().any(|l| l == "Endereço IPv4"));
    }

    #[test]
    fn test_field_tolerates_dot_padding() {
        let labels = CompiledLabels::builtin().unwrap();

        let (kind, value) = labels
            .field("   Subnet Mask . . . . . . . . . . . : 255.255.255.0")
            .unwrap();
        assert_eq!(kind, FieldKind::SubnetMask);
        assert_eq!(value, "255.255.255.0");

        let (kind, value) = labels.field("Default Gateway:10.0.0.1").unwrap();
        assert_eq!(kind, FieldKind::DefaultGateway);
        assert_eq!(value, "10.0.0.1");
    }

    #[test]
    fn test_field_is_anchored_at_line_start() {
        let labels = CompiledLabels::builtin().unwrap();

        // APIPA addresses use a different label and must not count as IPv4
        assert!(labels
            .field("   Autoconfiguration IPv4 Address. . : 169.254.10.20(Preferred)")
            .is_none());
    }

    #[test]
    fn test_header_is_case_insensitive() {
        let labels = CompiledLabels::builtin().unwrap();
        assert_eq!(labels.header_rest("ETHERNET ADAPTER Ethernet 2:"), Some(" Ethernet 2:"));
        assert_eq!(labels.header_rest("   Description . . . : Intel"), None);
    }

    #[test]
    fn test_disconnected_marker() {
        let labels = CompiledLabels::builtin().unwrap();
        assert!(labels.is_disconnected("Media disconnected"));
        assert!(labels.is_disconnected("MÍDIA DESCONECTADA"));
        assert!(!labels.is_disconnected("Connected"));
    }

    #[test]
    fn test_toml_missing_keys_keep_builtins() {
        let table = LabelTable::from_toml_str(
            r#"
            header = ["Ethernet-Adapter"]
            ipv4 = ["IPv4-Adresse"]
            "#,
        )
        .unwrap();

        assert_eq!(table.header, vec!["Ethernet-Adapter".to_string()]);
        assert_eq!(table.ipv4, vec!["IPv4-Adresse".to_string()]);
        assert_eq!(table.subnet_mask, LabelTable::default().subnet_mask);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(LabelTable::from_toml_str("header = 12").is_err());
    }

    #[test]
    fn test_empty_label_list_never_matches() {
        let mut table = LabelTable::english();
        table.physical_address.clear();
        let labels = table.compile().unwrap();
        assert!(labels.field("Physical Address. . . : AA-BB-CC-DD-EE-FF").is_none());
    }
}
