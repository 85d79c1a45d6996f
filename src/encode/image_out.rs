use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    accumulate::buffer::PixelBuffer,
    config::OutputFormat,
    foundation::{
        core::{BufferShape, FrameIndex},
        error::{BlurError, BlurResult},
    },
};

/// `<prefix><frame:04><ext>`, e.g. `renders/shot_0012.exr`.
pub fn frame_output_path(prefix: &str, frame: FrameIndex, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!("{prefix}{:04}{}", frame.0, format.extension()))
}

pub fn ensure_parent_dir(path: &Path) -> BlurResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Top-down rows, as image files store them.
fn rows_top_down(buffer: &PixelBuffer) -> impl Iterator<Item = &[f32]> {
    let shape = buffer.shape();
    let row_len = (shape.width * shape.channels) as usize;
    buffer.data().chunks_exact(row_len.max(1)).rev()
}

fn unit_to_int(v: f32, max: f32) -> f32 {
    (v.clamp(0.0, 1.0) * max).round()
}

/// Encode `buffer` (RGBA, bottom-up rows) to `path`.
///
/// Integer formats clamp to `[0, 1]`; OpenEXR keeps the raw linear values.
pub fn save_pixel_buffer(buffer: &PixelBuffer, path: &Path, format: OutputFormat) -> BlurResult<()> {
    let shape = buffer.shape();
    if shape.channels != BufferShape::RGBA {
        return Err(BlurError::io(format!(
            "only RGBA buffers can be saved (got {} channels)",
            shape.channels
        )));
    }
    if shape.width == 0 || shape.height == 0 {
        return Err(BlurError::io("cannot save an empty image"));
    }
    ensure_parent_dir(path)?;

    match format {
        OutputFormat::Png8 => {
            let bytes: Vec<u8> = rows_top_down(buffer)
                .flatten()
                .map(|&v| unit_to_int(v, 255.0) as u8)
                .collect();
            image::save_buffer_with_format(
                path,
                &bytes,
                shape.width,
                shape.height,
                image::ColorType::Rgba8,
                image::ImageFormat::Png,
            )
            .with_context(|| format!("write png '{}'", path.display()))?;
        }
        OutputFormat::Png16 => {
            let words: Vec<u16> = rows_top_down(buffer)
                .flatten()
                .map(|&v| unit_to_int(v, 65535.0) as u16)
                .collect();
            let img = image::ImageBuffer::<image::Rgba<u16>, _>::from_raw(
                shape.width,
                shape.height,
                words,
            )
            .ok_or_else(|| BlurError::io("png16 buffer size mismatch"))?;
            img.save_with_format(path, image::ImageFormat::Png)
                .with_context(|| format!("write png '{}'", path.display()))?;
        }
        OutputFormat::OpenExr => {
            let floats: Vec<f32> = rows_top_down(buffer).flatten().copied().collect();
            let img = image::Rgba32FImage::from_raw(shape.width, shape.height, floats)
                .ok_or_else(|| BlurError::io("exr buffer size mismatch"))?;
            img.save_with_format(path, image::ImageFormat::OpenExr)
                .with_context(|| format!("write exr '{}'", path.display()))?;
        }
    }
    tracing::debug!(path = %path.display(), ?format, "saved frame");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/image_out.rs"]
mod tests;
