//! Company branding: the display name and logo printed on receipts.
//!
//! ```text
//! {settings_path}/
//!   company.json   {"companyName": "...", "updatedAt": "..."}
//!   logo.png       re-encoded upload
//! ```

use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::pdf::layout::Branding;
use crate::pdf::RgbImage;

const COMPANY_FILE: &str = "company.json";
const LOGO_FILE: &str = "logo.png";

/// Largest accepted logo upload (5MB)
pub const LOGO_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Longest edge of the logo as embedded in PDFs
const LOGO_EMBED_EDGE: u32 = 300;

const COMPANY_NAME_MAX: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    pub company_name: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of a logo upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoInfo {
    pub filename: &'static str,
    pub size: usize,
    pub width: u32,
    pub height: u32,
}

/// File-backed settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SettingsStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn company_path(&self) -> PathBuf {
        self.dir.join(COMPANY_FILE)
    }

    fn logo_path(&self) -> PathBuf {
        self.dir.join(LOGO_FILE)
    }

    /// Current company settings; an empty name when never set.
    pub async fn company(&self) -> CompanySettings {
        let raw = match tokio::fs::read(self.company_path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return CompanySettings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read company settings");
                return CompanySettings::default();
            }
        };

        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Company settings file is corrupt, ignoring");
            CompanySettings::default()
        })
    }

    /// Stores the company name. An empty name clears it.
    pub async fn set_company_name(&self, name: &str) -> ApiResult<CompanySettings> {
        let name = name.trim();
        if name.chars().count() > COMPANY_NAME_MAX {
            return Err(ApiError::validation(format!(
                "companyName must be at most {COMPANY_NAME_MAX} characters"
            )));
        }

        let settings = CompanySettings {
            company_name: name.to_string(),
            updated_at: Some(Utc::now()),
        };
        let json = serde_json::to_vec_pretty(&settings)
            .map_err(|e| ApiError::internal(format!("Failed to serialize settings: {e}")))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.company_path(), json).await?;

        info!(company_name = %settings.company_name, "Company name updated");
        Ok(settings)
    }

    /// Validates an uploaded image and stores it as PNG.
    pub async fn save_logo(&self, data: Vec<u8>) -> ApiResult<LogoInfo> {
        if data.is_empty() {
            return Err(ApiError::bad_request("No file uploaded"));
        }
        if data.len() > LOGO_MAX_BYTES {
            return Err(ApiError::new(
                ErrorCode::PayloadTooLarge,
                format!("Logo too large: {} bytes (max {LOGO_MAX_BYTES})", data.len()),
            ));
        }

        let (png, width, height) = tokio::task::spawn_blocking(move || encode_png(&data))
            .await
            .map_err(|e| ApiError::internal(format!("Logo processing failed: {e}")))??;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.logo_path(), &png).await?;

        info!(width, height, size = png.len(), "Logo uploaded");
        Ok(LogoInfo {
            filename: LOGO_FILE,
            size: png.len(),
            width,
            height,
        })
    }

    /// Stored logo bytes, if any.
    pub async fn logo(&self) -> ApiResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.logo_path()).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the logo. `false` when there was none.
    pub async fn delete_logo(&self) -> ApiResult<bool> {
        match tokio::fs::remove_file(self.logo_path()).await {
            Ok(()) => {
                info!("Logo deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Name and logo for rendering. A logo that fails to load is skipped.
    pub async fn branding(&self) -> Branding {
        let company_name = self.company().await.company_name;

        let logo = match self.logo().await {
            Ok(Some(bytes)) => tokio::task::spawn_blocking(move || embed_logo(&bytes))
                .await
                .ok()
                .flatten(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read logo, rendering without it");
                None
            }
        };

        Branding { company_name, logo }
    }
}

fn encode_png(data: &[u8]) -> ApiResult<(Vec<u8>, u32, u32)> {
    let img = image::load_from_memory(data)
        .map_err(|e| ApiError::new(ErrorCode::UnsupportedMediaType, format!("Invalid image: {e}")))?;
    let (width, height) = img.dimensions();

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ApiError::internal(format!("Image encoding failed: {e}")))?;

    Ok((png, width, height))
}

/// Decodes, shrinks and flattens onto white for embedding.
fn embed_logo(bytes: &[u8]) -> Option<RgbImage> {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, "Stored logo does not decode, rendering without it");
            return None;
        }
    };
    let img = shrink(img);
    let rgba = img.to_rgba8();

    let mut pixels = Vec::with_capacity(rgba.width() as usize * rgba.height() as usize * 3);
    for p in rgba.pixels() {
        let [r, g, b, a] = p.0;
        let a = u16::from(a);
        for c in [r, g, b] {
            pixels.push(((u16::from(c) * a + 255 * (255 - a)) / 255) as u8);
        }
    }

    RgbImage::new(rgba.width(), rgba.height(), pixels)
}

fn shrink(img: DynamicImage) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= LOGO_EMBED_EDGE && h <= LOGO_EMBED_EDGE {
        img
    } else {
        img.thumbnail(LOGO_EMBED_EDGE, LOGO_EMBED_EDGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(pixel)));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
        out
    }

    #[tokio::test]
    async fn test_company_name_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings"));

        assert_eq!(store.company().await, CompanySettings::default());

        let saved = store.set_company_name("  Acme Trading ").await.unwrap();
        assert_eq!(saved.company_name, "Acme Trading");

        let loaded = store.company().await;
        assert_eq!(loaded.company_name, "Acme Trading");
        assert!(loaded.updated_at.is_some());

        let cleared = store.set_company_name("").await.unwrap();
        assert_eq!(cleared.company_name, "");
    }

    #[tokio::test]
    async fn test_company_name_too_long() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());
        let err = store.set_company_name(&"x".repeat(201)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_corrupt_settings_read_as_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(COMPANY_FILE), b"{not json").unwrap();
        let store = SettingsStore::new(dir.path());
        assert_eq!(store.company().await.company_name, "");
    }

    #[tokio::test]
    async fn test_logo_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());

        assert!(store.logo().await.unwrap().is_none());
        assert!(!store.delete_logo().await.unwrap());

        let info = store.save_logo(png_bytes(8, 4, [10, 20, 30, 255])).await.unwrap();
        assert_eq!((info.width, info.height), (8, 4));

        let stored = store.logo().await.unwrap().unwrap();
        assert!(stored.starts_with(b"\x89PNG"));

        let branding = store.branding().await;
        let logo = branding.logo.unwrap();
        assert_eq!((logo.width, logo.height), (8, 4));
        assert_eq!(&logo.pixels[..3], &[10, 20, 30]);

        assert!(store.delete_logo().await.unwrap());
        assert!(store.branding().await.logo.is_none());
    }

    #[tokio::test]
    async fn test_logo_rejects_non_images() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());

        let err = store.save_logo(b"plain text".to_vec()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedMediaType);

        let err = store.save_logo(Vec::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadRequest);

        let err = store.save_logo(vec![0; LOGO_MAX_BYTES + 1]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PayloadTooLarge);
    }

    #[test]
    fn test_embed_flattens_transparency_and_shrinks() {
        let logo = embed_logo(&png_bytes(600, 300, [0, 0, 0, 0])).unwrap();
        assert_eq!((logo.width, logo.height), (300, 150));
        assert!(logo.pixels.iter().all(|&c| c == 255));
    }
}
