// ============================================================================
// QR DECODER - Decodificación en Rust puro con rqrr
// ============================================================================

use crate::models::{DecodedResult, Point};
use crate::scanner::traits::{InversionMode, QrDecoder};

/// Decoder QR sobre píxeles RGBA del canvas
#[derive(Debug, Clone, Default)]
pub struct RqrrDecoder {
    inversion: InversionMode,
}

impl RqrrDecoder {
    pub fn new(inversion: InversionMode) -> Self {
        Self { inversion }
    }

    pub fn inversion(&self) -> InversionMode {
        self.inversion
    }
}

impl QrDecoder for RqrrDecoder {
    fn decode(&self, rgba: &[u8], width: u32, height: u32) -> Option<DecodedResult> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return None;
        }

        let expected = w * h * 4;
        if rgba.len() < expected {
            log::debug!("🔍 [DECODER] Buffer demasiado pequeño: {} < {}", rgba.len(), expected);
            return None;
        }

        let luma = rgba_to_luma(&rgba[..expected]);
        self.inversion
            .passes()
            .iter()
            .find_map(|&inverted| decode_luma(&luma, w, h, inverted))
    }
}

/// Luminancia BT.709 en enteros (54 + 183 + 19 = 256)
pub fn rgba_to_luma(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .map(|px| {
            let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
            ((r * 54 + g * 183 + b * 19) >> 8) as u8
        })
        .collect()
}

fn decode_luma(luma: &[u8], width: usize, height: usize, inverted: bool) -> Option<DecodedResult> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        let value = luma[y * width + x];
        if inverted { 255 - value } else { value }
    });

    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_meta, text)) => {
                return Some(DecodedResult {
                    text,
                    bounding_quad: grid.bounds.map(|p| Point::new(p.x, p.y)),
                });
            }
            Err(e) => {
                log::debug!("🔍 [DECODER] Grid detectado pero no decodificable: {:?}", e);
            }
        }
    }

    None
}
