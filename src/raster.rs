use image::RgbaImage;

/// Source-over blend of one straight-alpha colour into the canvas. Pixels
/// outside the canvas are skipped.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, src: [u8; 4]) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    let alpha = u16::from(src[3]);
    if alpha == 0 {
        return;
    }

    let inv_alpha = 255_u16.saturating_sub(alpha);
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for channel in 0..3 {
        let dst_c = u16::from(dst[channel]);
        let src_c = u16::from(src[channel]);
        dst[channel] = ((src_c * alpha + dst_c * inv_alpha + 127) / 255) as u8;
    }
    dst[3] = 255;
}

/// Blends a coverage mask (one byte per pixel) tinted with `color`.
///
/// `shear` slants rows to the right towards the top of the mask, which is
/// how italics are faked with a single upright face.
pub fn blend_mask(
    canvas: &mut RgbaImage,
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    mask: &[u8],
    color: [u8; 4],
    shear: f32,
) {
    for row in 0..height {
        let py = y + row as i32;
        let slant = (shear * (height - row) as f32).round() as i32;

        for col in 0..width {
            let coverage = mask[row * width + col];
            if coverage == 0 {
                continue;
            }
            let alpha = ((u16::from(coverage) * u16::from(color[3])) / 255) as u8;
            blend_pixel(
                canvas,
                x + col as i32 + slant,
                py,
                [color[0], color[1], color[2], alpha],
            );
        }
    }
}

/// Draws `src` with its top-left corner at (`x`, `y`), honouring its alpha.
pub fn blit(canvas: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    for (sx, sy, pixel) in src.enumerate_pixels() {
        blend_pixel(canvas, x + sx as i32, y + sy as i32, pixel.0);
    }
}

/// An opaque black canvas.
pub fn black(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]))
}
