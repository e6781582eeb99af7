//! ThumbHash Placeholder Codec
//!
//! Decodes the ThumbHash binary layout into a small RGBA raster and renders
//! it as a self-contained `data:image/png;base64,` URL. The bit layout, the
//! DCT reconstruction, and the hand-assembled PNG (stored-deflate IDAT,
//! adler32 checksum, CRC-32 chunk trailers) follow the published reference
//! format. Treat this module as a fixed codec, not a design surface.
//!
//! Decoding is a pure function: the same bytes always produce the same
//! data URL.

use std::f32::consts::PI;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{PipelineError, Result};

// == Decoded Raster ==
/// RGBA raster reconstructed from a placeholder record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    /// Row-major RGBA bytes, `width * height * 4` long
    pub pixels: Vec<u8>,
}

// == Data URL ==
/// Decodes a placeholder byte record and renders it as a PNG data URL.
pub fn data_url(hash: &[u8]) -> Result<String> {
    let raster = to_rgba(hash)?;
    Ok(rgba_to_png_data_url(&raster))
}

// == RGBA Decode ==
/// Reconstructs the low-resolution RGBA raster from a placeholder record.
///
/// The record packs DC terms, per-channel scales and the size class into a
/// 5-byte header (6 with alpha), followed by 4-bit AC coefficients. Output
/// is at most 32 pixels on the longer axis, proportioned to the encoded
/// aspect ratio.
pub fn to_rgba(hash: &[u8]) -> Result<Raster> {
    if hash.len() < 5 {
        return Err(PipelineError::MalformedPlaceholder(format!(
            "expected at least 5 bytes, got {}",
            hash.len()
        )));
    }

    let h24 = hash[0] as u32 | (hash[1] as u32) << 8 | (hash[2] as u32) << 16;
    let h16 = hash[3] as u32 | (hash[4] as u32) << 8;

    let l_dc = (h24 & 63) as f32 / 63.0;
    let p_dc = ((h24 >> 6) & 63) as f32 / 31.5 - 1.0;
    let q_dc = ((h24 >> 12) & 63) as f32 / 31.5 - 1.0;
    let l_scale = ((h24 >> 18) & 31) as f32 / 31.0;
    let has_alpha = (h24 >> 23) != 0;
    let p_scale = ((h16 >> 3) & 63) as f32 / 63.0;
    let q_scale = ((h16 >> 9) & 63) as f32 / 63.0;
    let is_landscape = (h16 >> 15) != 0;

    // Luminance channel size class; the shorter axis is encoded in the
    // header, the longer one is fixed by the alpha flag.
    let encoded_axis = (h16 & 7) as usize;
    let long_axis = if has_alpha { 5 } else { 7 };
    let (lx, ly) = if is_landscape {
        (long_axis.max(3), encoded_axis.max(3))
    } else {
        (encoded_axis.max(3), long_axis.max(3))
    };

    let (a_dc, a_scale) = if has_alpha {
        if hash.len() < 6 {
            return Err(PipelineError::MalformedPlaceholder(
                "alpha flag set but alpha byte missing".to_string(),
            ));
        }
        ((hash[5] & 15) as f32 / 15.0, (hash[5] >> 4) as f32 / 15.0)
    } else {
        (1.0, 0.0)
    };

    let mut reader = AcReader {
        hash,
        start: if has_alpha { 6 } else { 5 },
        index: 0,
    };
    let l_ac = reader.read_channel(lx, ly, l_scale)?;
    let p_ac = reader.read_channel(3, 3, p_scale * 1.25)?;
    let q_ac = reader.read_channel(3, 3, q_scale * 1.25)?;
    let a_ac = if has_alpha {
        Some(reader.read_channel(5, 5, a_scale)?)
    } else {
        None
    };

    // Output dimensions from the approximate aspect ratio (the un-clamped
    // size class of the header).
    let (ratio_x, ratio_y) = if is_landscape {
        (long_axis, encoded_axis)
    } else {
        (encoded_axis, long_axis)
    };
    if ratio_x == 0 || ratio_y == 0 {
        return Err(PipelineError::MalformedPlaceholder(
            "degenerate aspect ratio".to_string(),
        ));
    }
    let ratio = ratio_x as f32 / ratio_y as f32;
    let (width, height) = if ratio > 1.0 {
        (32, (32.0 / ratio).round() as usize)
    } else {
        ((32.0 * ratio).round() as usize, 32)
    };

    let mut pixels = vec![0u8; width * height * 4];
    let mut fx = vec![0f32; lx.max(if has_alpha { 5 } else { 3 })];
    let mut fy = vec![0f32; ly.max(if has_alpha { 5 } else { 3 })];

    for y in 0..height {
        for (cy, f) in fy.iter_mut().enumerate() {
            *f = (PI / height as f32 * (y as f32 + 0.5) * cy as f32).cos();
        }
        for x in 0..width {
            for (cx, f) in fx.iter_mut().enumerate() {
                *f = (PI / width as f32 * (x as f32 + 0.5) * cx as f32).cos();
            }

            let mut l = l_dc;
            let mut p = p_dc;
            let mut q = q_dc;
            let mut a = a_dc;

            // Luminance
            let mut j = 0;
            for cy in 0..ly {
                let fy2 = fy[cy] * 2.0;
                let mut cx = usize::from(cy == 0);
                while cx * ly < lx * (ly - cy) {
                    l += l_ac[j] * fx[cx] * fy2;
                    j += 1;
                    cx += 1;
                }
            }

            // Chroma
            let mut j = 0;
            for cy in 0..3 {
                let fy2 = fy[cy] * 2.0;
                for cx in usize::from(cy == 0)..(3 - cy) {
                    let f = fx[cx] * fy2;
                    p += p_ac[j] * f;
                    q += q_ac[j] * f;
                    j += 1;
                }
            }

            // Alpha
            if let Some(a_ac) = &a_ac {
                let mut j = 0;
                for cy in 0..5 {
                    let fy2 = fy[cy] * 2.0;
                    for cx in usize::from(cy == 0)..(5 - cy) {
                        a += a_ac[j] * fx[cx] * fy2;
                        j += 1;
                    }
                }
            }

            let b = l - 2.0 / 3.0 * p;
            let r = (3.0 * l - b + q) / 2.0;
            let g = r - q;

            let i = (y * width + x) * 4;
            pixels[i] = (255.0 * r.clamp(0.0, 1.0)) as u8;
            pixels[i + 1] = (255.0 * g.clamp(0.0, 1.0)) as u8;
            pixels[i + 2] = (255.0 * b.clamp(0.0, 1.0)) as u8;
            pixels[i + 3] = (255.0 * a.clamp(0.0, 1.0)) as u8;
        }
    }

    Ok(Raster {
        width,
        height,
        pixels,
    })
}

// == AC Coefficient Reader ==
/// Sequential 4-bit coefficient reader. The nibble stream is shared across
/// channels, so one reader instance decodes them all in order.
struct AcReader<'a> {
    hash: &'a [u8],
    start: usize,
    index: usize,
}

impl AcReader<'_> {
    fn read_channel(&mut self, nx: usize, ny: usize, scale: f32) -> Result<Vec<f32>> {
        let mut ac = Vec::new();
        for cy in 0..ny {
            let mut cx = usize::from(cy == 0);
            while cx * ny < nx * (ny - cy) {
                let byte = self
                    .hash
                    .get(self.start + (self.index >> 1))
                    .copied()
                    .ok_or_else(|| {
                        PipelineError::MalformedPlaceholder(
                            "truncated coefficient data".to_string(),
                        )
                    })?;
                let nibble = (byte >> ((self.index & 1) << 2)) & 15;
                self.index += 1;
                ac.push((nibble as f32 / 7.5 - 1.0) * scale);
                cx += 1;
            }
        }
        Ok(ac)
    }
}

// == PNG Assembly ==
/// Wraps an RGBA raster in a minimal PNG and returns it as a data URL.
///
/// Pixel data goes into a single IDAT chunk as raw stored-deflate blocks,
/// one per row, with filter type 0. No compression: at 32 pixels a side the
/// base64 overhead dwarfs anything deflate could win back.
fn rgba_to_png_data_url(raster: &Raster) -> String {
    let (w, h) = (raster.width, raster.height);
    let row = w * 4 + 1;
    let idat_len = 6 + h * (5 + row);

    let mut png = Vec::with_capacity(57 + idat_len);
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR: 8-bit RGBA, no interlace
    png.extend_from_slice(&13u32.to_be_bytes());
    let ihdr_start = png.len();
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&(w as u32).to_be_bytes());
    png.extend_from_slice(&(h as u32).to_be_bytes());
    png.extend_from_slice(&[8, 6, 0, 0, 0]);
    let crc = png_crc(&png[ihdr_start..]);
    png.extend_from_slice(&crc.to_be_bytes());

    // IDAT
    png.extend_from_slice(&(idat_len as u32).to_be_bytes());
    let idat_start = png.len();
    png.extend_from_slice(b"IDAT");
    png.extend_from_slice(&[120, 1]); // zlib header, no compression preset

    let (mut a, mut b) = (1u32, 0u32);
    for y in 0..h {
        let is_last = y + 1 == h;
        png.push(u8::from(is_last));
        png.extend_from_slice(&[
            (row & 255) as u8,
            (row >> 8) as u8,
            (!row & 255) as u8,
            ((row >> 8) ^ 255) as u8,
        ]);
        png.push(0); // filter: none
        b = (b + a) % 65521;
        for &byte in &raster.pixels[y * w * 4..(y + 1) * w * 4] {
            png.push(byte);
            a = (a + byte as u32) % 65521;
            b = (b + a) % 65521;
        }
    }
    png.extend_from_slice(&[(b >> 8) as u8, (b & 255) as u8, (a >> 8) as u8, (a & 255) as u8]);
    let crc = png_crc(&png[idat_start..]);
    png.extend_from_slice(&crc.to_be_bytes());

    // IEND
    png.extend_from_slice(&[0, 0, 0, 0]);
    png.extend_from_slice(b"IEND");
    png.extend_from_slice(&0xAE42_6082u32.to_be_bytes());

    format!("data:image/png;base64,{}", BASE64.encode(&png))
}

/// CRC-32 over a PNG chunk type + data (ISO 3309 polynomial).
fn png_crc(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}
