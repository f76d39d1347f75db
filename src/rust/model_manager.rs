use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::{BuiltinTokenizer, TokenizerInfo};

/// Environment variable overriding the cache root.
pub const CACHE_ENV: &str = "HATE_DETECTOR_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Tokenizer not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Tokenizer verification failed: {0}")]
    VerificationFailed(String),
}

/// Resolves tokenizer identifiers to cached `tokenizer.json` files, downloading
/// them on first use.
///
/// Each download records a SHA-256 sidecar next to the artifact; later runs
/// verify the cached file against it and re-download on mismatch.
#[derive(Clone, Debug)]
pub struct ModelManager {
    cache_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default cache directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_cache_dir())
    }

    /// Returns the default cache directory path
    pub fn get_default_cache_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(CACHE_ENV) {
            return PathBuf::from(path).join("tokenizers");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("hate-detector").join("tokenizers");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("hate-detector").join("tokenizers");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("hate-detector").join("tokenizers")
    }

    pub fn new<P: AsRef<Path>>(cache_dir: P) -> io::Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn get_tokenizer_path(&self, tokenizer: BuiltinTokenizer) -> PathBuf {
        self.tokenizer_path_for(&tokenizer.get_tokenizer_info())
    }

    fn tokenizer_path_for(&self, info: &TokenizerInfo) -> PathBuf {
        self.cache_dir.join(&info.name).join("tokenizer.json")
    }

    fn checksum_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".sha256");
        PathBuf::from(name)
    }

    pub fn is_tokenizer_downloaded(&self, tokenizer: BuiltinTokenizer) -> bool {
        let path = self.get_tokenizer_path(tokenizer);
        log::info!("Checking if tokenizer is downloaded:");
        log::info!("  Tokenizer path: {:?} (exists: {})", path, path.exists());
        path.exists()
    }

    fn hash_file(path: &Path) -> Result<String, ModelError> {
        let bytes = fs::read(path)?;
        Ok(Self::hash_bytes(&bytes))
    }

    fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Records the current hash of `path` in its sidecar file.
    pub fn record_checksum(&self, path: &Path) -> Result<String, ModelError> {
        let hash = Self::hash_file(path)?;
        fs::write(Self::checksum_path(path), &hash)?;
        log::debug!("Recorded checksum {} for {:?}", hash, path);
        Ok(hash)
    }

    /// Checks a cached file against its recorded checksum.
    ///
    /// Returns `Ok(false)` when the file or its sidecar is missing or the hashes differ.
    pub fn verify_file(&self, path: &Path) -> Result<bool, ModelError> {
        let sidecar = Self::checksum_path(path);
        if !path.exists() || !sidecar.exists() {
            log::info!("Cannot verify {:?}: file or checksum missing", path);
            return Ok(false);
        }
        let expected = fs::read_to_string(&sidecar)?.trim().to_string();
        let actual = Self::hash_file(path)?;
        log::info!("Calculated hash: {}", actual);
        log::info!("Expected hash:   {}", expected);
        Ok(actual == expected)
    }

    pub fn verify_tokenizer(&self, tokenizer: BuiltinTokenizer) -> Result<bool, ModelError> {
        self.verify_file(&self.get_tokenizer_path(tokenizer))
    }

    /// Returns the cached tokenizer path, failing if it has not been fetched yet.
    pub fn require_tokenizer(&self, tokenizer: BuiltinTokenizer) -> Result<PathBuf, ModelError> {
        let path = self.get_tokenizer_path(tokenizer);
        if path.exists() {
            Ok(path)
        } else {
            Err(ModelError::NotDownloaded(tokenizer.identifier().to_string()))
        }
    }

    pub async fn download_tokenizer(&self, tokenizer: BuiltinTokenizer) -> Result<PathBuf, ModelError> {
        let info = tokenizer.get_tokenizer_info();
        let _lock = self.download_lock.lock().await;

        log::info!("Downloading tokenizer file from {}", info.tokenizer_url);
        let response = reqwest::get(&info.tokenizer_url).await?.error_for_status()?;
        log::info!("Download response status: {}", response.status());
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        self.store_tokenizer(tokenizer, &bytes)
    }

    /// Writes tokenizer bytes into the cache together with their checksum.
    ///
    /// The bytes must parse as JSON; an error page or a cut-off body is rejected
    /// before anything is written.
    pub fn store_tokenizer(&self, tokenizer: BuiltinTokenizer, bytes: &[u8]) -> Result<PathBuf, ModelError> {
        if let Err(e) = serde_json::from_slice::<serde_json::Value>(bytes) {
            log::error!("Downloaded tokenizer for {} is not valid JSON: {}", tokenizer, e);
            return Err(ModelError::VerificationFailed(format!("{} is not a tokenizer.json: {}", tokenizer, e)));
        }

        let path = self.get_tokenizer_path(tokenizer);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;

        let hash = Self::hash_bytes(bytes);
        fs::write(Self::checksum_path(&path), &hash)?;
        log::info!("Tokenizer {} stored with checksum {}", tokenizer, hash);
        Ok(path)
    }

    pub fn remove_download(&self, tokenizer: BuiltinTokenizer) -> Result<(), ModelError> {
        let path = self.get_tokenizer_path(tokenizer);
        let sidecar = Self::checksum_path(&path);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        if sidecar.exists() {
            fs::remove_file(&sidecar)?;
        }
        Ok(())
    }

    /// Ensures that a tokenizer is downloaded and verified.
    /// If it doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_tokenizer_downloaded(&self, tokenizer: BuiltinTokenizer) -> Result<PathBuf, ModelError> {
        log::info!("Checking if tokenizer {} is downloaded...", tokenizer);
        if !self.is_tokenizer_downloaded(tokenizer) {
            log::info!("Tokenizer not found, downloading...");
            return self.download_tokenizer(tokenizer).await;
        }

        if self.verify_tokenizer(tokenizer)? {
            log::info!("Tokenizer verification successful");
            Ok(self.get_tokenizer_path(tokenizer))
        } else {
            log::warn!("Tokenizer verification failed, re-downloading...");
            self.remove_download(tokenizer)?;
            self.download_tokenizer(tokenizer).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_dir() {
        env::set_var(CACHE_ENV, "/tmp/hate-detector-test-cache");
        let path = ModelManager::get_default_cache_dir();
        assert!(path.to_str().unwrap().contains("/tmp/hate-detector-test-cache/tokenizers"));
        env::remove_var(CACHE_ENV);

        let path = ModelManager::get_default_cache_dir();
        assert!(path.to_str().unwrap().contains("tokenizers"));
    }

    #[test]
    fn test_checksum_path() {
        let path = ModelManager::checksum_path(Path::new("/cache/bert/tokenizer.json"));
        assert_eq!(path, PathBuf::from("/cache/bert/tokenizer.json.sha256"));
    }
}
