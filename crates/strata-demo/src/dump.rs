//! PNG export of a chunk's height fields.

use std::path::{Path, PathBuf};

use strata_stream::TerrainChunk;
use strata_terrain::HeightField;
use strata_terrain::texture::{BLACK, Rgba, WHITE, texture_from_height_field};

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("failed to create output directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("texture buffer does not match its dimensions")]
    BufferSize,

    #[error("image encode error: {0}")]
    Encode(#[from] image::ImageError),
}

/// Write `field` as a two-colour gradient PNG.
pub fn write_height_png(field: &HeightField, low: Rgba, high: Rgba, path: &Path) -> Result<(), DumpError> {
    let texture = texture_from_height_field(field, low, high);
    let image = image::RgbaImage::from_raw(texture.width, texture.height, texture.pixels)
        .ok_or(DumpError::BufferSize)?;
    image.save(path)?;
    Ok(())
}

/// Write every height field of `chunk`, plus its combined terrain field when
/// present, into `dir`. Returns the files written.
pub fn dump_chunk(chunk: &TerrainChunk, dir: &Path) -> Result<Vec<PathBuf>, DumpError> {
    std::fs::create_dir_all(dir).map_err(DumpError::CreateDir)?;
    let coord = chunk.coord();
    let mut written = Vec::new();

    let mut layers: Vec<_> = chunk.height_fields().iter().collect();
    layers.sort_by(|a, b| a.0.cmp(b.0));
    let combined = chunk.combined_field().map(|field| ("combined", field));

    for (name, field) in layers
        .into_iter()
        .map(|(id, field)| (id.as_str(), field))
        .chain(combined)
    {
        let path = dir.join(format!("chunk_{}_{}_{name}.png", coord.x, coord.y));
        write_height_png(field, BLACK, WHITE, &path)?;
        written.push(path);
    }
    Ok(written)
}
