//! Environment readiness check.

use crate::config::Config;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check OS, Chromium availability, configuration, and available memory.
pub async fn run() -> Result<()> {
    println!("LPSE Scraper Doctor");
    println!("===================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let config = match Config::from_env() {
        Ok(config) => {
            println!("[OK] Configuration loads (base URL: {})", config.base_url);
            Some(config)
        }
        Err(e) => {
            println!("[!!] Configuration error: {e:#}");
            None
        }
    };

    let chromium = config
        .as_ref()
        .and_then(|c| c.chromium_path.clone())
        .or_else(find_chromium);
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Run `lpse install` to download Chrome for Testing."
        ),
    }

    match available_memory_mb() {
        Some(mb) if mb >= 512 => println!("[OK] Available memory: {mb}MB (>= 512MB required)"),
        Some(mb) => println!("[!!] Available memory: {mb}MB (< 512MB, Chromium may be killed)"),
        None => println!("[??] Could not determine available memory"),
    }

    println!();
    if chromium.is_some() && config.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}

/// Available memory in MB (best effort, platform-specific).
fn available_memory_mb() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
        for line in meminfo.lines() {
            if let Some(rest) = line.strip_prefix("MemAvailable:") {
                let kb: u64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
                return Some(kb / 1024);
            }
        }
        None
    }
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("sysctl")
            .args(["-n", "hw.memsize"])
            .output()
            .ok()?;
        let bytes: u64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
        Some(bytes / 1024 / 1024)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
