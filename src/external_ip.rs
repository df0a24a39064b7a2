// ============================================
// external_ip.rs - Public IP and rough location
// ============================================
// ipconfig only knows the LAN side. To see the address the internet sees
// (and which ISP it belongs to) we ask ip-api.com, a free JSON endpoint
// that needs no API key.
//
// Like everything user-facing in WinTools, this never fails outward:
// network problems come back as a readable message.
// ============================================

use serde::Deserialize;

// ============================================
// CONSTANTS
// ============================================

/// Only the fields we display (plus status/message for errors)
const IP_API_URL: &str = "http://ip-api.com/json/?fields=status,message,country,countryCode,regionName,city,lat,lon,isp,query";

// ============================================
// DATA STRUCTURES
// ============================================

/// Response from ip-api.com.
/// On failure only `status` ("fail") and `message` are filled in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIpInfo {
    /// "success" or "fail"
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    /// The public IP address
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub isp: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

// ============================================
// LOOKUP
// ============================================

/// Query ip-api.com and describe the result.
///
/// BLOCKING - waits up to 10 seconds for the HTTP response.
pub fn lookup_external_ip() -> String {
    log::info!("[ExternalIp] Querying {}", IP_API_URL);

    // Build HTTP client
    let client = match reqwest::blocking::Client::builder()
        .user_agent(concat!("WinTools/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
    {
        Ok(c) => c,
        Err(e) => return format!("Connection error while querying external IP:\n{}", e),
    };

    let response = match client.get(IP_API_URL).send() {
        Ok(r) => r,
        Err(e) => return format!("Connection error while querying external IP:\n{}", e),
    };

    if !response.status().is_success() {
        return format!("HTTP error while querying external IP: {}", response.status());
    }

    // Read as text, then parse (same as the rest of WinTools: no reqwest "json" feature)
    let body_text = match response.text() {
        Ok(t) => t,
        Err(e) => return format!("Connection error while querying external IP:\n{}", e),
    };

    match serde_json::from_str::<ExternalIpInfo>(&body_text) {
        Ok(info) => format_external_ip(&info),
        Err(e) => format!("API error: invalid response ({})", e),
    }
}

/// Describe an ip-api.com answer.
pub fn format_external_ip(info: &ExternalIpInfo) -> String {
    if info.status != "success" {
        return format!(
            "API error: {}",
            info.message.as_deref().unwrap_or("status was not success")
        );
    }

    let show = |field: &Option<String>| field.clone().unwrap_or_else(|| "N/A".to_string());

    let mut text = format!(
        "External IP Address: {}\nProvider (ISP): {}\nLocation: {}, {}, {}",
        show(&info.query),
        show(&info.isp),
        show(&info.city),
        show(&info.region_name),
        show(&info.country),
    );
    if let Some(code) = &info.country_code {
        text.push_str(&format!(" ({})", code));
    }
    if let (Some(lat), Some(lon)) = (info.lat, info.lon) {
        text.push_str(&format!("\nCoordinates: {}, {}", lat, lon));
    }
    text
}

// ============================================
// TESTS
// ============================================
