//! Locating and binding the pdfium shared library.
//!
//! `pdfium-render` loads pdfium dynamically, so something has to find the
//! library first. [`bind`] tries, in order:
//!
//! 1. an explicit path (config or `--pdfium-lib`),
//! 2. `PDFIUM_LIB_PATH`,
//! 3. the per-version cache directory ([`engine_cache_dir`]),
//! 4. with the `fetch-engine` feature, a fresh download from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//!    into that cache; without it, the system library search path.
//!
//! `PDFSTACK_ENGINE_CACHE` replaces the base of the cache directory.

use crate::error::PdfStackError;
use pdfium_render::prelude::Pdfium;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// pdfium-binaries release tag (`chromium/<VERSION>`).
pub const PDFIUM_VERSION: &str = "7690";

/// Receives `(bytes_downloaded, total_bytes)` while the library downloads.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Release asset for one OS/architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAsset {
    pub os: &'static str,
    pub arch: &'static str,
    /// Archive name in the GitHub release.
    pub archive: &'static str,
    /// Library path inside the archive.
    pub member: &'static str,
    /// File name written to the cache.
    pub lib_name: &'static str,
}

const fn asset(
    os: &'static str,
    arch: &'static str,
    archive: &'static str,
    member: &'static str,
    lib_name: &'static str,
) -> PlatformAsset {
    PlatformAsset {
        os,
        arch,
        archive,
        member,
        lib_name,
    }
}

const ASSETS: &[PlatformAsset] = &[
    asset("macos", "aarch64", "pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
    asset("macos", "x86_64", "pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
    asset("linux", "x86_64", "pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so"),
    asset("linux", "aarch64", "pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so"),
    asset("windows", "x86_64", "pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll"),
    asset("windows", "aarch64", "pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll"),
    asset("windows", "x86", "pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll"),
];

/// Release asset for `os`/`arch`, if pdfium-binaries publishes one.
pub fn asset_for(os: &str, arch: &str) -> Option<&'static PlatformAsset> {
    ASSETS.iter().find(|a| a.os == os && a.arch == arch)
}

/// Release asset for the running platform.
pub fn current_asset() -> Option<&'static PlatformAsset> {
    asset_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Directory holding the cached library for [`PDFIUM_VERSION`].
///
/// - **Linux**: `~/.cache/pdfstack/pdfium-{VERSION}/`
/// - **macOS**: `~/Library/Caches/pdfstack/pdfium-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\pdfstack\pdfium-{VERSION}\`
pub fn engine_cache_dir() -> PathBuf {
    cache_dir_under(std::env::var_os("PDFSTACK_ENGINE_CACHE"))
}

fn cache_dir_under(base_override: Option<OsString>) -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Some(base) = base_override {
        return PathBuf::from(base).join(versioned);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("pdfstack")
        .join(versioned)
}

/// Find an existing pdfium library without touching the network.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    if let Some(p) = std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from) {
        if p.exists() {
            return Some(p);
        }
        debug!("PDFIUM_LIB_PATH '{}' does not exist; ignoring", p.display());
    }
    let cached = engine_cache_dir().join(current_asset()?.lib_name);
    cached.exists().then_some(cached)
}

/// Whether [`bind`] can succeed without downloading anything.
pub fn is_available_offline(explicit: Option<&Path>) -> bool {
    locate(explicit).is_some()
}

/// Bind pdfium, downloading it first if needed (see module docs).
pub fn bind(
    explicit: Option<&Path>,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Pdfium, PdfStackError> {
    if let Some(path) = locate(explicit) {
        return bind_at(&path);
    }
    fallback(on_progress)
}

/// Bind the pdfium library at `path`.
pub fn bind_at(path: &Path) -> Result<Pdfium, PdfStackError> {
    debug!("Binding pdfium at {}", path.display());
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfStackError::PdfiumBindingFailed(format!("{}: {e}", path.display())))
}

#[cfg(feature = "fetch-engine")]
fn fallback(on_progress: Option<DownloadProgress<'_>>) -> Result<Pdfium, PdfStackError> {
    let path = fetch::download_to_cache(on_progress)?;
    bind_at(&path)
}

#[cfg(not(feature = "fetch-engine"))]
fn fallback(_on_progress: Option<DownloadProgress<'_>>) -> Result<Pdfium, PdfStackError> {
    debug!("No pdfium found locally; trying the system library");
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| PdfStackError::PdfiumBindingFailed(format!("system library: {e}")))
}

#[cfg(feature = "fetch-engine")]
mod fetch {
    use super::*;
    use std::io::Read;
    use tracing::info;

    const RELEASES: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

    /// Download the platform archive and extract the library into the cache.
    pub(super) fn download_to_cache(
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<PathBuf, PdfStackError> {
        let asset = current_asset().ok_or_else(|| {
            PdfStackError::PdfiumBindingFailed(format!(
                "no prebuilt pdfium for {}/{}",
                std::env::consts::OS,
                std::env::consts::ARCH
            ))
        })?;

        let cache = engine_cache_dir();
        std::fs::create_dir_all(&cache).map_err(|e| {
            PdfStackError::PdfiumBindingFailed(format!(
                "cannot create cache dir '{}': {e}",
                cache.display()
            ))
        })?;

        let url = format!("{RELEASES}/chromium%2F{PDFIUM_VERSION}/{}", asset.archive);
        info!("Downloading pdfium from {}", url);
        let archive = fetch_bytes(&url, on_progress)?;

        let dest = cache.join(asset.lib_name);
        unpack_member(&archive, asset.member, &dest)?;
        info!("pdfium cached at {}", dest.display());
        Ok(dest)
    }

    fn fetch_bytes(
        url: &str,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<Vec<u8>, PdfStackError> {
        let failed = |detail: String| PdfStackError::PdfiumBindingFailed(format!("download: {detail}"));

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pdfstack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| failed(e.to_string()))?;
        let mut response = client
            .get(url)
            .send()
            .map_err(|e| failed(format!("GET {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {} for {url}", response.status())));
        }

        let total = response.content_length();
        let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = [0u8; 64 * 1024];
        loop {
            let n = match response.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(failed(e.to_string())),
            };
            body.extend_from_slice(&chunk[..n]);
            if let Some(cb) = on_progress {
                cb(body.len() as u64, total);
            }
        }
        Ok(body)
    }

    fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfStackError> {
        let failed = |detail: String| PdfStackError::PdfiumBindingFailed(format!("extract: {detail}"));

        let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
        for entry in tar.entries().map_err(|e| failed(e.to_string()))? {
            let mut entry = entry.map_err(|e| failed(e.to_string()))?;
            let is_member = entry
                .path()
                .map(|p| p.to_string_lossy() == member)
                .unwrap_or(false);
            if is_member {
                entry.unpack(dest).map_err(|e| failed(e.to_string()))?;
                return Ok(());
            }
        }
        Err(failed(format!("'{member}' not found in archive")))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use flate2::{write::GzEncoder, Compression};

        fn tgz_with(member: &str, contents: &[u8]) -> Vec<u8> {
            let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, member, contents).unwrap();
            builder.into_inner().unwrap().finish().unwrap()
        }

        #[test]
        fn unpacks_the_named_member() {
            let archive = tgz_with("lib/libpdfium.so", b"ELF");
            let dir = tempfile::tempdir().unwrap();
            let dest = dir.path().join("libpdfium.so");
            unpack_member(&archive, "lib/libpdfium.so", &dest).unwrap();
            assert_eq!(std::fs::read(dest).unwrap(), b"ELF");
        }

        #[test]
        fn missing_member_is_reported() {
            let archive = tgz_with("include/fpdfview.h", b"//");
            let dir = tempfile::tempdir().unwrap();
            let err = unpack_member(&archive, "lib/libpdfium.so", &dir.path().join("x"))
                .unwrap_err();
            assert!(err.to_string().contains("not found in archive"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dir_is_versioned_under_pdfstack() {
        let d = cache_dir_under(None);
        assert!(d.ends_with(format!("pdfstack/pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn cache_dir_override_replaces_base() {
        let d = cache_dir_under(Some(OsString::from("/tmp/engines")));
        assert_eq!(d, PathBuf::from(format!("/tmp/engines/pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn known_platforms_have_assets() {
        let linux = asset_for("linux", "x86_64").unwrap();
        assert_eq!(linux.lib_name, "libpdfium.so");
        assert_eq!(asset_for("windows", "x86").unwrap().member, "bin/pdfium.dll");
        assert!(asset_for("plan9", "mips").is_none());
    }

    #[test]
    fn explicit_path_wins() {
        let p = Path::new("/opt/pdfium/libpdfium.so");
        assert_eq!(locate(Some(p)), Some(p.to_path_buf()));
        assert!(is_available_offline(Some(p)));
    }
}
