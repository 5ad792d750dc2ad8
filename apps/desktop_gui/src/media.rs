//! Image decoding for the visualization panel and clipboard.

use std::{borrow::Cow, path::Path};

use arboard::{Clipboard, ImageData};
use client_core::AnalysisResult;

const MAX_PREVIEW_EDGE: u32 = 1024;

#[derive(Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// Decoded visualization plus the original bytes for saving/copying.
#[derive(Clone)]
pub struct DecodedVisualization {
    pub preview: PreviewImage,
    pub original_bytes: Vec<u8>,
}

pub fn decode_visualization(
    result: &AnalysisResult,
) -> Result<Option<DecodedVisualization>, String> {
    let Some(bytes) = result.decode_image().map_err(|err| err.to_string())? else {
        return Ok(None);
    };
    let preview = decode_preview_image(&bytes)?;
    Ok(Some(DecodedVisualization {
        preview,
        original_bytes: bytes,
    }))
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = dynamic.thumbnail(MAX_PREVIEW_EDGE, MAX_PREVIEW_EDGE).to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

pub fn write_clipboard_image(bytes: &[u8]) -> Result<(), String> {
    let decoded = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let rgba = decoded.to_rgba8();
    let mut clipboard = Clipboard::new().map_err(|err| err.to_string())?;
    clipboard
        .set_image(ImageData {
            width: rgba.width() as usize,
            height: rgba.height() as usize,
            bytes: Cow::Owned(rgba.into_raw()),
        })
        .map_err(|err| err.to_string())
}

/// `"Nocturne in E-flat"` -> `"nocturne_in_e-flat.png"`.
pub fn suggested_image_file_name(result: &AnalysisResult) -> String {
    let mut stem: String = result
        .display_title()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    stem = stem.trim_matches('_').to_string();
    if stem.is_empty() {
        stem = "visualization".to_string();
    }
    if let Some(style) = result.prompt_name.as_deref().filter(|s| !s.is_empty()) {
        stem = format!("{stem}-{style}");
    }
    format!("{stem}.png")
}

pub fn media_type_for_path(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(str::to_string)
}
