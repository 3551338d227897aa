//! Model artifact provisioning with auto-download

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use whisker_core::{ModelConfig, ModelError};

const MAX_MODEL_SIZE: usize = 2_000_000_000;
/// Anything smaller is a truncated download or an error page
const MIN_MODEL_SIZE: usize = 1024;
const MAX_URL_LEN: usize = 2048;
const DOWNLOAD_TIMEOUT_SECS: u64 = 3600;

/// Locates model artifacts on disk and fetches missing ones
pub struct ModelManager {
    config: ModelConfig,
}

impl ModelManager {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// `<model_dir>/<name>.onnx`
    pub fn artifact_path(&self) -> Result<PathBuf, ModelError> {
        validate_name(&self.config.name)?;
        Ok(self.config.model_dir.join(format!("{}.onnx", self.config.name)))
    }

    pub fn ensure_model_dir(&self) -> Result<PathBuf, ModelError> {
        let dir = &self.config.model_dir;
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            info!("Created model directory: {:?}", dir);
        }
        Ok(dir.clone())
    }

    /// Path to a usable artifact, downloading it first if absent
    pub async fn ensure_model(&self) -> Result<PathBuf, ModelError> {
        let path = self.artifact_path()?;
        if path.exists() {
            if let Some(expected) = self.expected_checksum() {
                verify_checksum(&path, expected)?;
            }
            info!("Model {} found at {:?}", self.config.name, path);
            return Ok(path);
        }

        let url = match self.config.download_url.as_deref() {
            Some(url) => url,
            None => {
                return Err(ModelError::NotFound(format!(
                    "{:?} is missing and no download URL is configured",
                    path
                )))
            }
        };
        validate_url(url)?;

        self.ensure_model_dir()?;
        info!("Downloading model {} from {}", self.config.name, url);
        let bytes = fetch(url).await?;
        self.install(&bytes)
    }

    /// Validate downloaded bytes and move them into place atomically
    pub fn install(&self, bytes: &[u8]) -> Result<PathBuf, ModelError> {
        if bytes.len() > MAX_MODEL_SIZE {
            return Err(ModelError::Download(format!(
                "Downloaded model too large: {} bytes (max {} bytes)",
                bytes.len(),
                MAX_MODEL_SIZE
            )));
        }
        if bytes.len() < MIN_MODEL_SIZE {
            return Err(ModelError::Download(
                "Downloaded file too small, likely corrupted".to_string(),
            ));
        }

        match self.expected_checksum() {
            Some(expected) => {
                check_digest(&sha256_hex(bytes), expected)?;
                info!("Verified checksum for model {}", self.config.name);
            }
            None => warn!(
                "Downloaded {} bytes for model {} without checksum verification",
                bytes.len(),
                self.config.name
            ),
        }

        self.ensure_model_dir()?;
        let path = self.artifact_path()?;
        let temp_path = path.with_extension("onnx.tmp");
        fs::write(&temp_path, bytes)?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        info!("Model {} saved to {:?}", self.config.name, path);
        Ok(path)
    }

    fn expected_checksum(&self) -> Option<&str> {
        self.config
            .checksum
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Ensure the artifact and open it as a detector
    #[cfg(feature = "onnx")]
    pub async fn provision(&self) -> Result<super::YoloDetector, ModelError> {
        let path = self.ensure_model().await?;
        super::YoloDetector::load(&path, super::YoloParams::from(&self.config))
    }
}

/// Reject names that could escape the model directory
pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.is_empty() || name.len() > 255 {
        return Err(ModelError::InvalidName(format!("{:?}", name)));
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ModelError::InvalidName(format!(
            "{:?} contains path separators",
            name
        )));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), ModelError> {
    if url.is_empty() || url.len() > MAX_URL_LEN {
        return Err(ModelError::Download("Invalid URL".to_string()));
    }
    if !url.starts_with("https://") {
        return Err(ModelError::Download(
            "Only HTTPS URLs are allowed for model downloads".to_string(),
        ));
    }
    Ok(())
}

async fn fetch(url: &str) -> Result<Vec<u8>, ModelError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()
        .map_err(|e| ModelError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ModelError::Download(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ModelError::Download(format!("HTTP {}", response.status())));
    }
    if let Some(length) = response.content_length() {
        if length > MAX_MODEL_SIZE as u64 {
            return Err(ModelError::Download(format!(
                "Model too large: {} bytes (max {} bytes)",
                length, MAX_MODEL_SIZE
            )));
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ModelError::Download(e.to_string()))?;
    Ok(bytes.to_vec())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn check_digest(actual: &str, expected: &str) -> Result<(), ModelError> {
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ModelError::Checksum {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

/// Compare the SHA-256 of a file on disk against a hex digest
pub fn verify_checksum(path: &Path, expected: &str) -> Result<(), ModelError> {
    let bytes = fs::read(path)?;
    check_digest(&sha256_hex(&bytes), expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &Path) -> ModelManager {
        ModelManager::new(ModelConfig {
            name: "tiny".to_string(),
            model_dir: dir.join("models"),
            ..ModelConfig::default()
        })
    }

    #[test]
    fn test_artifact_path() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(dir.path());
        assert_eq!(
            manager.artifact_path().unwrap(),
            dir.path().join("models").join("tiny.onnx")
        );
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("../evil").is_err());
        assert!(validate_name("model/name").is_err());
        assert!(validate_name("model\\name").is_err());
        assert!(validate_name("yolo11n").is_ok());
    }

    #[test]
    fn test_ensure_model_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(dir.path());
        manager.ensure_model_dir().unwrap();
        manager.ensure_model_dir().unwrap();
        assert!(dir.path().join("models").is_dir());
    }

    #[tokio::test]
    async fn test_missing_model_without_url() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(dir.path());
        assert!(matches!(manager.ensure_model().await, Err(ModelError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_plain_http_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager_in(dir.path());
        manager.config.download_url = Some("http://example.com/tiny.onnx".to_string());
        assert!(matches!(manager.ensure_model().await, Err(ModelError::Download(_))));

        manager.config.download_url = Some("ftp://example.com/tiny.onnx".to_string());
        assert!(manager.ensure_model().await.is_err());
    }

    #[tokio::test]
    async fn test_existing_model_is_used() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(dir.path());
        let installed = manager.install(&[7u8; 2048]).unwrap();
        assert_eq!(manager.ensure_model().await.unwrap(), installed);
    }

    #[tokio::test]
    async fn test_existing_model_with_wrong_checksum() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager_in(dir.path());
        manager.install(&[7u8; 2048]).unwrap();
        manager.config.checksum = Some("00".repeat(32));
        assert!(matches!(
            manager.ensure_model().await,
            Err(ModelError::Checksum { .. })
        ));
    }

    #[test]
    fn test_install_verifies_checksum() {
        let dir = TempDir::new().unwrap();
        let bytes = vec![1u8; 4096];
        let mut manager = manager_in(dir.path());

        manager.config.checksum = Some(sha256_hex(&[2u8; 4096]));
        assert!(matches!(manager.install(&bytes), Err(ModelError::Checksum { .. })));
        assert!(!manager.artifact_path().unwrap().exists());

        manager.config.checksum = Some(sha256_hex(&bytes).to_uppercase());
        let path = manager.install(&bytes).unwrap();
        assert_eq!(fs::read(&path).unwrap(), bytes);
        assert!(!path.with_extension("onnx.tmp").exists());
    }

    #[test]
    fn test_install_rejects_tiny_files() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(dir.path());
        assert!(matches!(manager.install(b"<html>"), Err(ModelError::Download(_))));
    }

    #[test]
    fn test_verify_checksum_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob");
        fs::write(&path, b"hello").unwrap();
        let digest = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        verify_checksum(&path, digest).unwrap();
        assert!(verify_checksum(&path, &"0".repeat(64)).is_err());
    }
}
