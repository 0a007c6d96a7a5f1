//! Poster images: download, resize, convert to JPEG and link from the note.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use crate::config::PosterConfig;
use crate::error::{Result, ShelfError};
use crate::frontmatter::{self, Frontmatter};
use crate::provider::http_client;

pub const POSTER_KEY: &str = "poster";

/// `"Heat (1995).md"` → `"Heat (1995).jpg"`
pub fn poster_file_name(note_path: &Path) -> String {
    let stem = note_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{stem}.jpg")
}

/// Poster file that sits beside a note.
pub fn poster_path(note_path: &Path) -> PathBuf {
    note_path.with_file_name(poster_file_name(note_path))
}

/// Note has no usable `poster` key, or `refresh` forces a new download.
pub fn needs_poster(text: &str, refresh: bool) -> bool {
    if refresh {
        return true;
    }
    let (fm, _) = frontmatter::parse(text);
    !fm.is_some_and(|fm| fm.has_value(POSTER_KEY))
}

/// Resize to `width` keeping the aspect ratio, flatten transparency onto white
/// and encode as JPEG.
pub fn process_image(bytes: &[u8], width: u32, quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).map_err(|e| ShelfError::Image(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ShelfError::Image("image has no pixels".into()));
    }

    let height = (u64::from(img.height()) * u64::from(width) / u64::from(img.width())).max(1);
    let height = u32::try_from(height).map_err(|_| ShelfError::Image("image too tall".into()))?;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);

    let rgb = if resized.color().has_alpha() {
        flatten_on_white(&resized)
    } else {
        resized.to_rgb8()
    };

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| ShelfError::Image(e.to_string()))?;
    Ok(out)
}

fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = u32::from(px[3]);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    rgb
}

/// Point the note's `poster` key at `file_name` and, when `embed` is set, show
/// the image right after the frontmatter. A note without frontmatter gets one.
pub fn attach_poster(text: &str, file_name: &str, embed: bool) -> Result<String> {
    let (fm, body) = frontmatter::parse(text);
    let mut fm = fm.unwrap_or_else(Frontmatter::empty);
    fm.set(POSTER_KEY, format!("[[{file_name}]]"))?;

    let embed_link = format!("![[{file_name}]]");
    if !embed || body.contains(&embed_link) {
        return Ok(frontmatter::serialize(Some(&fm), &body));
    }

    let body = format!("\n{embed_link}\n\n{}", body.trim_start());
    Ok(frontmatter::serialize(Some(&fm), &body))
}

/// Downloads and stores posters for one run.
#[derive(Debug)]
pub struct PosterFetcher {
    client: reqwest::Client,
    config: PosterConfig,
}

impl PosterFetcher {
    pub fn new(config: &PosterConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(None)?,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &PosterConfig {
        &self.config
    }

    /// Download `url`, convert it and write it to `dest`.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::debug!(url, "downloading poster");
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let bytes = resp.bytes().await?;
        let jpeg = process_image(&bytes, self.config.width, self.config.quality)?;
        fs::write(dest, jpeg)?;
        tracing::info!(path = %dest.display(), "saved poster");
        Ok(())
    }
}
