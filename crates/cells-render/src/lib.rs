//! Rasterises a world into one pixel per tile and encodes frames as PNG.

use std::io::Cursor;
use std::path::Path;

use cells_core::{Gene, Tile, World};
use image::{ColorType, ImageBuffer, ImageFormat};
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

/// One RGBA8 pixel.
pub type Rgba = [u8; 4];

/// Colour of a tile that holds nothing: transparent white.
pub const EMPTY_COLOR: Rgba = [0xff, 0xff, 0xff, 0];

const BYTES_PER_PIXEL: usize = 4;

/// Errors raised while encoding or writing frames.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Channel layout written to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    Rgb,
    #[default]
    Rgba,
}

impl Encoding {
    const fn color_type(self) -> ColorType {
        match self {
            Self::Rgb => ColorType::Rgb8,
            Self::Rgba => ColorType::Rgba8,
        }
    }
}

/// Row-major RGBA8 image, row 0 holding the tiles with `y == 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Colour at `(x, y)`, or `None` outside the frame.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let mut rgba = [0; BYTES_PER_PIXEL];
        rgba.copy_from_slice(&self.pixels[start..start + BYTES_PER_PIXEL]);
        Some(rgba)
    }

    /// The same pixels with alpha dropped.
    #[must_use]
    pub fn to_rgb(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(BYTES_PER_PIXEL)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect()
    }

    fn encoded_bytes(&self, encoding: Encoding) -> Vec<u8> {
        match encoding {
            Encoding::Rgb => self.to_rgb(),
            Encoding::Rgba => self.pixels.clone(),
        }
    }

    /// Encode into an in-memory PNG.
    pub fn encode_png(&self, encoding: Encoding) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Vec::new();
        let mut cursor = Cursor::new(&mut bytes);
        match encoding {
            Encoding::Rgb => {
                let raw = self.to_rgb();
                let expected = self.width as usize * self.height as usize * 3;
                let actual = raw.len();
                let image = ImageBuffer::<image::Rgb<u8>, _>::from_raw(self.width, self.height, raw)
                    .ok_or(RenderError::BufferSize { expected, actual })?;
                image.write_to(&mut cursor, ImageFormat::Png)?;
            }
            Encoding::Rgba => {
                let expected = self.width as usize * self.height as usize * BYTES_PER_PIXEL;
                let actual = self.pixels.len();
                let image = ImageBuffer::<image::Rgba<u8>, _>::from_raw(
                    self.width,
                    self.height,
                    self.pixels.as_slice(),
                )
                .ok_or(RenderError::BufferSize { expected, actual })?;
                image.write_to(&mut cursor, ImageFormat::Png)?;
            }
        }
        Ok(bytes)
    }

    /// Write the frame to `path` as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>, encoding: Encoding) -> Result<(), RenderError> {
        let path = path.as_ref();
        image::save_buffer_with_format(
            path,
            &self.encoded_bytes(encoding),
            self.width,
            self.height,
            encoding.color_type(),
            ImageFormat::Png,
        )?;
        debug!(path = %path.display(), ?encoding, "frame written");
        Ok(())
    }
}

/// Colour every tile of `world` with `color_fn`, one pixel per tile.
///
/// Rows are coloured in parallel; the result does not depend on scheduling.
pub fn render<F>(world: &World, color_fn: F) -> Frame
where
    F: Fn(&Tile) -> Rgba + Sync,
{
    let grid = world.grid();
    let width = grid.width();
    let height = grid.height();
    let mut pixels = vec![0u8; grid.area() * BYTES_PER_PIXEL];

    pixels
        .par_chunks_mut(width as usize * BYTES_PER_PIXEL)
        .enumerate()
        .for_each(|(y, row)| {
            for (px, tile) in row
                .chunks_exact_mut(BYTES_PER_PIXEL)
                .zip(grid.row(y as u32))
            {
                px.copy_from_slice(&color_fn(tile));
            }
        });

    Frame {
        width,
        height,
        pixels,
    }
}

/// Channel value derived from a gene's population count.
fn gene_channel(gene: Gene) -> u8 {
    let ones = gene.raw().count_ones();
    let hashed = if ones == 0 { 1 } else { (2 * ones.pow(3)).isqrt() };
    hashed.min(0xff) as u8
}

/// Opacity or intensity rising with energy, from 63 up to 255.
fn energy_shade(energy: u32) -> u8 {
    (63 + energy.min(192)) as u8
}

/// Default palette: transparent white for empty tiles, red shaded by
/// energy for food, gene-hashed colours with energy-keyed alpha for agents.
#[must_use]
pub fn default_color(tile: &Tile) -> Rgba {
    match tile {
        Tile::Empty => EMPTY_COLOR,
        Tile::Food(food) => [energy_shade(food.energy), 0, 0, 0xff],
        Tile::Agent(cell) => [
            gene_channel(cell.genome[0]),
            gene_channel(cell.genome[1]),
            gene_channel(cell.genome[2]),
            energy_shade(cell.energy),
        ],
    }
}
