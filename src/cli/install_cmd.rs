//! `lpse install` — download Chrome for Testing into `~/.lpse/chromium/`.
//!
//! The scraper treats a resolvable Chromium binary as a precondition; this
//! command is the provisioning collaborator that establishes it.

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Chrome for Testing release feed.
const VERSIONS_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/last-known-good-versions-with-downloads.json";

/// Where downloaded builds land.
pub fn install_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".lpse/chromium")
}

fn platform_key() -> Result<&'static str> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => Ok("linux64"),
        ("macos", "aarch64") => Ok("mac-arm64"),
        ("macos", "x86_64") => Ok("mac-x64"),
        ("windows", "x86_64") => Ok("win64"),
        (os, arch) => bail!("unsupported platform: {os}/{arch}"),
    }
}

pub async fn run(force: bool) -> Result<()> {
    if !force {
        if let Some(existing) = crate::renderer::chromium::find_chromium() {
            println!("Chromium already installed: {}", existing.display());
            println!("Use --force to reinstall.");
            return Ok(());
        }
    }

    let platform = platform_key()?;
    println!("Resolving latest stable Chrome for Testing ({platform})...");

    let client = reqwest::Client::new();
    let feed: serde_json::Value = client
        .get(VERSIONS_URL)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("failed to parse the Chrome for Testing version feed")?;

    let stable = &feed["channels"]["Stable"];
    let version = stable["version"]
        .as_str()
        .context("version feed missing the Stable channel")?
        .to_string();
    let url = stable["downloads"]["chrome"]
        .as_array()
        .context("version feed missing chrome downloads")?
        .iter()
        .find(|d| d["platform"].as_str() == Some(platform))
        .and_then(|d| d["url"].as_str())
        .with_context(|| format!("no chrome build for platform {platform}"))?
        .to_string();

    let dir = install_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    println!("Downloading Chrome for Testing {version}...");
    let response = client.get(&url).send().await?.error_for_status()?;
    let total = response.content_length().unwrap_or(0);
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} ({eta})")
            .expect("progress template is valid"),
    );

    let archive_path = dir.join("chrome.zip");
    let mut file = std::fs::File::create(&archive_path)
        .with_context(|| format!("failed to create {}", archive_path.display()))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("download interrupted")?;
        file.write_all(&chunk)?;
        bar.inc(chunk.len() as u64);
    }
    bar.finish();

    println!("Unpacking into {}...", dir.display());
    unpack_zip(&archive_path, &dir)?;
    let _ = std::fs::remove_file(&archive_path);

    match crate::renderer::chromium::find_chromium() {
        Some(path) => {
            println!("Chromium installed: {}", path.display());
            Ok(())
        }
        None => bail!(
            "archive unpacked but no chrome executable was found under {}",
            dir.display()
        ),
    }
}

/// Extract a zip archive, preserving unix permissions so the chrome
/// binary stays executable. Entries that would escape `dest` are skipped.
fn unpack_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive)
        .with_context(|| format!("failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("invalid zip archive")?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(rel) = entry.enclosed_name() else {
            continue;
        };
        let out = dest.join(rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut target = std::fs::File::create(&out)
            .with_context(|| format!("failed to create {}", out.display()))?;
        std::io::copy(&mut entry, &mut target)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}
