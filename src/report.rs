// ============================================
// report.rs - Filtered local IP report
// ============================================
//
// Turns parsed adapter records into the text shown to the user.
// Only adapters that are connected AND have a real IPv4 address make it
// into the report. Everything else (disconnected Wi-Fi, tunnels, loopback)
// is noise for someone asking "what is my IP?".
//
// Output looks like:
//
//   Local IP Information (filtered):
//   ========================================
//   Adapter: Ethernet
//     Status: Connected
//     IPv4: 192.168.1.10
//     Subnet Mask: 255.255.255.0
//     Gateway: 192.168.1.1
//     MAC: AA-BB-CC-DD-EE-FF
// ============================================

use std::fmt::Write as _;

use anyhow::Result;

use crate::adapters::{parse_adapters, AdapterMap, AdapterRecord, FieldValue, LinkStatus};
use crate::labels::CompiledLabels;

// ============================================
// CONSTANTS
// ============================================

/// First line of every successful report
pub const REPORT_TITLE: &str = "Local IP Information (filtered):";

/// Shown for any field ipconfig didn't give us
pub const PLACEHOLDER: &str = "N/A";

/// Never reported, even when the adapter claims to be connected
pub const LOOPBACK_IPV4: &str = "127.0.0.1";

const SEPARATOR_WIDTH: usize = 40;

/// The scan finished but no adapter passed the filter
pub const NO_ADAPTER_MESSAGE: &str =
    "Could not extract local IP information (IPv4, Subnet Mask, Gateway, MAC) \
     for a connected adapter.";

/// ipconfig ran but printed nothing
pub const NO_OUTPUT_MESSAGE: &str = "Could not obtain the ipconfig output.";

// ============================================
// FILTER + RENDER
// ============================================

/// Connected, with an IPv4 address that isn't loopback.
pub fn is_qualifying(record: &AdapterRecord) -> bool {
    record.status == LinkStatus::Connected
        && record
            .ipv4
            .value()
            .is_some_and(|ip| ip != LOOPBACK_IPV4)
}

fn field_text(field: &FieldValue) -> &str {
    field.value().unwrap_or(PLACEHOLDER)
}

/// Render the qualifying adapters, in the order ipconfig listed them.
pub fn render_report(adapters: &AdapterMap) -> String {
    let qualifying: Vec<&AdapterRecord> =
        adapters.values().filter(|r| is_qualifying(r)).collect();

    if qualifying.is_empty() {
        return NO_ADAPTER_MESSAGE.to_string();
    }

    let mut out = String::from(REPORT_TITLE);
    for record in qualifying {
        // Writing into a String can't fail
        let _ = write!(
            out,
            "\n{separator}\
             \nAdapter: {name}\
             \n  Status: {status}\
             \n  IPv4: {ipv4}\
             \n  Subnet Mask: {mask}\
             \n  Gateway: {gateway}\
             \n  MAC: {mac}",
            separator = "=".repeat(SEPARATOR_WIDTH),
            name = record.name,
            status = record.status.as_str(),
            ipv4 = field_text(&record.ipv4),
            mask = field_text(&record.subnet_mask),
            gateway = field_text(&record.gateway),
            mac = field_text(&record.mac),
        );
    }
    out
}

/// Parse an ipconfig /all dump and render the filtered report.
pub fn parse(text: &str, labels: &CompiledLabels) -> String {
    render_report(&parse_adapters(text, labels))
}

/// Report for text that came from somewhere that may have failed
/// (running ipconfig, reading a file). The caller always gets a message.
pub fn report_from_source(source: Result<String>, labels: &CompiledLabels) -> String {
    match source {
        Ok(text) if text.trim().is_empty() => NO_OUTPUT_MESSAGE.to_string(),
        Ok(text) => parse(&text, labels),
        Err(e) => format!("Unexpected error while extracting local IP information:\n{:#}", e),
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn labels() -> CompiledLabels {
        CompiledLabels::builtin().unwrap()
    }

    fn block(header: &str, media: &str, ip: &str) -> String {
        format!(
            "{header}\n\n\
             \x20  Media State . . . . . . . . . . . : {media}\n\
             \x20  Physical Address. . . . . . . . . : AA-BB-CC-DD-EE-FF\n\
             \x20  IPv4 Address. . . . . . . . . . . : {ip}(Preferred)\n\
             \x20  Subnet Mask . . . . . . . . . . . : 255.255.255.0\n\
             \x20  Default Gateway . . . . . . . . . : 192.168.1.1\n\n"
        )
    }

    #[test]
    fn test_no_headers_gives_fixed_message() {
        assert_eq!(parse("", &labels()), NO_ADAPTER_MESSAGE);
        assert_eq!(
            parse("   IPv4 Address. . . . : 192.168.1.10\n", &labels()),
            NO_ADAPTER_MESSAGE
        );
    }

    #[test]
    fn test_single_connected_adapter() {
        let text = block("Ethernet adapter Ethernet:", "Connected", "192.168.1.10");
        let report = parse(&text, &labels());

        let expected = format!(
            "Local IP Information (filtered):\n{}\nAdapter: Ethernet\n  Status: Connected\n  \
             IPv4: 192.168.1.10\n  Subnet Mask: 255.255.255.0\n  Gateway: 192.168.1.1\n  \
             MAC: AA-BB-CC-DD-EE-FF",
            "=".repeat(40)
        );
        assert_eq!(report, expected);
        assert_eq!(report.matches("Adapter:").count(), 1);
    }

    #[test]
    fn test_loopback_is_excluded() {
        let text = block("Loopback adapter Loopback:", "Connected", "127.0.0.1");
        assert_eq!(parse(&text, &labels()), NO_ADAPTER_MESSAGE);
    }

    #[test]
    fn test_disconnected_is_excluded() {
        let text = block("Ethernet adapter Ethernet:", "Media disconnected", "192.168.1.10");
        assert_eq!(parse(&text, &labels()), NO_ADAPTER_MESSAGE);

        let no_media_line = "\
Ethernet adapter Ethernet:
   IPv4 Address. . . . . . . . . . . : 192.168.1.10
";
        assert_eq!(parse(no_media_line, &labels()), NO_ADAPTER_MESSAGE);
    }

    #[test]
    fn test_missing_fields_use_placeholder() {
        let text = "\
Wireless LAN adapter Wi-Fi:
   Media State . . . . . . . . . . . : Connected
   IPv4 Address. . . . . . . . . . . : 10.0.0.7
   Default Gateway . . . . . . . . . :
";
        let report = parse(text, &labels());
        assert!(report.contains("  Subnet Mask: N/A"));
        assert!(report.contains("  Gateway: N/A"));
        assert!(report.contains("  MAC: N/A"));
    }

    #[test]
    fn test_duplicate_name_reported_once() {
        let mut text = block("Ethernet adapter Ethernet:", "Connected", "192.168.1.10");
        text.push_str(&block("Ethernet adapter Ethernet:", "Connected", "192.168.1.99"));

        let report = parse(&text, &labels());
        assert_eq!(report.matches("Adapter: Ethernet").count(), 1);
        assert!(report.contains("IPv4: 192.168.1.99"));
        assert!(!report.contains("192.168.1.10"));
    }

    #[test]
    fn test_order_follows_input() {
        let mut text = block("Wireless LAN adapter Wi-Fi:", "Connected", "10.0.0.2");
        text.push_str(&block("Ethernet adapter Disconnected:", "Media disconnected", "10.0.0.3"));
        text.push_str(&block("Ethernet adapter Ethernet:", "Connected", "10.0.0.4"));

        let report = parse(&text, &labels());
        let wifi = report.find("Adapter: Wi-Fi").unwrap();
        let eth = report.find("Adapter: Ethernet").unwrap();
        assert!(wifi < eth);
        assert!(!report.contains("Adapter: Disconnected"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = block("Ethernet adapter Ethernet:", "Connected", "192.168.1.10");
        let labels = labels();
        assert_eq!(parse(&text, &labels), parse(&text, &labels));
    }

    #[test]
    fn test_report_from_source_failures() {
        let labels = labels();

        assert_eq!(report_from_source(Ok("  \r\n".to_string()), &labels), NO_OUTPUT_MESSAGE);

        let msg = report_from_source(Err(anyhow!("ipconfig timed out")), &labels);
        assert!(msg.starts_with("Unexpected error while extracting local IP information:"));
        assert!(msg.contains("ipconfig timed out"));
    }
}
