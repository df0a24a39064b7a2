// ============================================
// ipconfig.rs - Getting the raw ipconfig /all text
// ============================================
//
// The parser only ever sees a String. This module is where that String
// comes from:
//   - running `ipconfig /all` (live system), or
//   - reading a saved dump from a file or stdin (`wintools parse dump.txt`)
//
// The console writes ipconfig output in the OEM code page, not UTF-8.
// On a Portuguese install that is code page 850, so "Endereço" arrives as
// the byte 0x87 for "ç". We try UTF-8 first and fall back to cp850.
// ============================================

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use crate::labels::CompiledLabels;
use crate::report;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

// ============================================
// CONSTANTS
// ============================================

/// How long ipconfig gets before we give up on it
pub const IPCONFIG_TIMEOUT: Duration = Duration::from_secs(10);

/// How often we check whether ipconfig has exited
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Hide the console window that would otherwise flash up
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Code page 850, bytes 0x80..=0xFF
const CP850_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '×', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '®', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'À', '©', '╣', '║', '╗', '╝', '¢', '¥', '┐',
    '└', '┴', '┬', '├', '─', '┼', 'ã', 'Ã', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤',
    'ð', 'Ð', 'Ê', 'Ë', 'È', 'ı', 'Í', 'Î', 'Ï', '┘', '┌', '█', '▄', '¦', 'Ì', '▀',
    'Ó', 'ß', 'Ô', 'Ò', 'õ', 'Õ', 'µ', 'þ', 'Þ', 'Ú', 'Û', 'Ù', 'ý', 'Ý', '¯', '´',
    '\u{AD}', '±', '‗', '¾', '¶', '§', '÷', '¸', '°', '¨', '·', '¹', '³', '²', '■', '\u{A0}',
];

// ============================================
// DECODING
// ============================================

/// Decode console output.
///
/// Checked in order: UTF-16LE with BOM (what `ipconfig /all > dump.txt`
/// writes from Windows PowerShell 5), UTF-8 (BOM stripped), then cp850.
pub fn decode_console_output(bytes: &[u8]) -> String {
    if let Some(wide) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = wide
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes
            .iter()
            .map(|&b| {
                if b < 0x80 {
                    b as char
                } else {
                    CP850_HIGH[(b - 0x80) as usize]
                }
            })
            .collect(),
    }
}

// ============================================
// RUNNING IPCONFIG
// ============================================

/// Run `ipconfig /all` and return its decoded stdout.
///
/// BLOCKING - waits up to `timeout` for ipconfig to finish, then kills it.
///
/// # Returns
/// * `Ok(String)` - everything ipconfig printed (may be empty)
/// * `Err` - ipconfig could not be started, timed out, or failed
pub fn run_ipconfig_all(timeout: Duration) -> Result<String> {
    log::info!("[IpConfig] Running: ipconfig /all");

    let mut command = Command::new("ipconfig");
    command
        .arg("/all")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(windows)]
    command.creation_flags(CREATE_NO_WINDOW);

    let mut child = command
        .spawn()
        .context("Failed to run ipconfig. Is this a Windows system?")?;

    // Drain both pipes on helper threads so a full pipe can't stall
    // ipconfig while we wait on it.
    let stdout = child.stdout.take().context("ipconfig stdout was not captured")?;
    let stderr = child.stderr.take().context("ipconfig stderr was not captured")?;
    let stdout_reader = spawn_drain(stdout);
    let stderr_reader = spawn_drain(stderr);

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().context("Failed to wait for ipconfig")? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            bail!("ipconfig did not finish within {} seconds", timeout.as_secs());
        }
        thread::sleep(POLL_INTERVAL);
    };

    let bytes = match stdout_reader.join() {
        Ok(result) => result.context("Failed to read ipconfig output")?,
        Err(_) => bail!("ipconfig output reader panicked"),
    };
    // stderr is only used to explain a failure, so a bad read just leaves it empty
    let stderr_bytes = match stderr_reader.join() {
        Ok(Ok(buf)) => buf,
        _ => Vec::new(),
    };

    let stdout = decode_console_output(&bytes);
    if !status.success() && stdout.trim().is_empty() {
        bail!(
            "ipconfig failed (exit code {}): {}",
            status.code().unwrap_or(-1),
            decode_console_output(&stderr_bytes).trim()
        );
    }

    log::info!("[IpConfig] Captured {} bytes of output", bytes.len());
    Ok(stdout)
}

/// Read a pipe to the end on its own thread.
fn spawn_drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).map(|_| buf)
    })
}

/// Read a saved ipconfig /all dump. `-` means stdin.
pub fn read_dump(path: &Path) -> Result<String> {
    let bytes = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read ipconfig output from stdin")?;
        buf
    } else {
        fs::read(path).with_context(|| format!("Failed to read dump: {}", path.display()))?
    };

    log::info!("[IpConfig] Read {} bytes from {}", bytes.len(), path.display());
    Ok(decode_console_output(&bytes))
}

/// Filtered local IP report for this machine. Always returns a message,
/// even when ipconfig can't be run.
pub fn local_ip_report(labels: &CompiledLabels) -> String {
    let source = run_ipconfig_all(IPCONFIG_TIMEOUT);
    if let Err(e) = &source {
        log::warn!("[IpConfig] {:#}", e);
    }
    report::report_from_source(source, labels)
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_passthrough() {
        let text = "Endereço IPv4 . . . : 10.0.0.1";
        assert_eq!(decode_console_output(text.as_bytes()), text);
    }

    #[test]
    fn test_decode_cp850_fallback() {
        // "Endereço Físico" and "Máscara" as the console writes them
        let bytes = b"Endere\x87o F\xa1sico\r\nM\xa0scara de Sub-rede";
        assert_eq!(
            decode_console_output(bytes),
            "Endereço Físico\r\nMáscara de Sub-rede"
        );
    }

    #[test]
    fn test_decode_cp850_portuguese_media_state() {
        // "Estado da mídia" / "Mídia desconectada"
        let bytes = b"Estado da m\xa1dia: M\xa1dia desconectada";
        assert_eq!(
            decode_console_output(bytes),
            "Estado da mídia: Mídia desconectada"
        );
    }

    #[test]
    fn test_decode_utf16le_with_bom() {
        let text = "Ethernet adapter Ethernet:\r\n   IPv4 Address. . . : 192.168.1.5\r\n";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_console_output(&bytes), text);
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let bytes = b"\xEF\xBB\xBFEthernet adapter Ethernet:";
        assert_eq!(decode_console_output(bytes), "Ethernet adapter Ethernet:");
    }

    #[test]
    fn test_utf16_dump_through_report() {
        let text = "Ethernet adapter Ethernet:\r\n\r\n   Media State . . . . . . . . . . . : Connected\r\n   IPv4 Address. . . . . . . . . . . : 192.168.1.5(Preferred)\r\n";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let labels = CompiledLabels::builtin().unwrap();
        let report = report::report_from_source(Ok(decode_console_output(&bytes)), &labels);
        assert!(report.contains("Adapter: Ethernet"));
        assert!(report.contains("IPv4: 192.168.1.5"));
    }

    #[test]
    fn test_cp850_table_spot_checks() {
        assert_eq!(CP850_HIGH[0x80 - 0x80], 'Ç');
        assert_eq!(CP850_HIGH[0xC6 - 0x80], 'ã');
        assert_eq!(CP850_HIGH[0xE0 - 0x80], 'Ó');
        assert_eq!(CP850_HIGH[0xFF - 0x80], '\u{A0}');
    }

    #[test]
    fn test_cp850_dump_through_report() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"Adaptador Ethernet Ethernet:\r\n\r\n");
        bytes.extend_from_slice(b"   Estado da m\xa1dia. . . . . . . . . : Conectado\r\n");
        bytes.extend_from_slice(b"   Endere\x87o F\xa1sico . . . . . . . . : 11-22-33-44-55-66\r\n");
        bytes.extend_from_slice(b"   Endere\x87o IPv4. . . . . . . . . . : 192.168.15.3(Preferencial)\r\n");
        bytes.extend_from_slice(b"   M\xa0scara de Sub-rede . . . . . . . : 255.255.255.0\r\n");
        bytes.extend_from_slice(b"   Gateway Padr\xc6o. . . . . . . . . . : 192.168.15.1\r\n");

        let labels = CompiledLabels::builtin().unwrap();
        let text = report::report_from_source(Ok(decode_console_output(&bytes)), &labels);

        assert!(text.contains("Adapter: Ethernet"));
        assert!(text.contains("IPv4: 192.168.15.3"));
        assert!(text.contains("Subnet Mask: 255.255.255.0"));
        assert!(text.contains("Gateway: 192.168.15.1"));
        assert!(text.contains("MAC: 11-22-33-44-55-66"));
    }

    #[test]
    fn test_spawn_drain_reads_whole_pipe() {
        // Larger than a Windows pipe buffer, which is what used to block ipconfig
        let data = vec![b'x'; 256 * 1024];
        let drained = spawn_drain(io::Cursor::new(data.clone())).join().unwrap().unwrap();
        assert_eq!(drained, data);
    }

    #[test]
    fn test_read_dump_missing_file() {
        let err = read_dump(Path::new("definitely/not/here/ipconfig.txt")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read dump"));
    }
}
