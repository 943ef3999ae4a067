//! Renders the source raster through rotation, flip and colour filters at
//! native resolution.
//!
//! The canvas keeps the source's dimensions; whatever rotation pushes
//! outside it is clipped and uncovered areas stay transparent. The same
//! function feeds the live preview and the export, so what is shown while
//! cropping is what gets cut.

use image::RgbaImage;
use rayon::prelude::*;

use crate::adjust::AdjustmentSettings;

/// Bakes `source` through `adj`. Pure: same input, same bytes.
pub fn bake(source: &RgbaImage, adj: &AdjustmentSettings) -> RgbaImage {
    let adj = adj.clamped();
    let mut out = if adj.has_geometry() {
        draw_transformed(source, adj.rotation, adj.flip_x, adj.flip_y)
    } else {
        source.clone()
    };
    apply_color_filters(&mut out, &adj);
    if adj.blur > 0.0 {
        out = gaussian_blur(&out, adj.blur);
    }
    out
}

/// Exact sin/cos for quarter turns, free of trigonometric drift.
fn rotation_sin_cos(degrees: f32) -> (f32, f32) {
    if degrees % 90.0 == 0.0 {
        match ((degrees / 90.0) as i32).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        degrees.to_radians().sin_cos()
    }
}

/// Draws `src` onto a same-sized transparent canvas under
/// translate(center) * rotate * scale(flip) * translate(-center).
/// Each destination pixel is inverse-mapped and bilinearly sampled.
fn draw_transformed(src: &RgbaImage, rotation: f32, flip_x: bool, flip_y: bool) -> RgbaImage {
    let (w, h) = src.dimensions();
    let mut dst = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return dst;
    }
    let cx = w as f32 * 0.5;
    let cy = h as f32 * 0.5;
    let (sin, cos) = rotation_sin_cos(rotation);
    let fx = if flip_x { -1.0 } else { 1.0 };
    let fy = if flip_y { -1.0 } else { 1.0 };

    let src_w = w as i32;
    let src_h = h as i32;
    let src_stride = w as usize * 4;
    let src_raw = src.as_raw();
    let row_bytes = w as usize * 4;

    dst.as_mut().par_chunks_mut(row_bytes).enumerate().for_each(|(dy, row)| {
        let v = dy as f32 + 0.5 - cy;
        for dx in 0..w as usize {
            let u = dx as f32 + 0.5 - cx;

            // Inverse rotation, then inverse flip (a flip is its own inverse).
            let ru = u * cos + v * sin;
            let rv = -u * sin + v * cos;
            let src_x = ru * fx + cx - 0.5;
            let src_y = rv * fy + cy - 0.5;

            let x0 = src_x.floor() as i32;
            let y0 = src_y.floor() as i32;
            if x0 < -1 || y0 < -1 || x0 >= src_w || y0 >= src_h {
                continue;
            }
            let tx = src_x - x0 as f32;
            let ty = src_y - y0 as f32;

            // Premultiplied, so transparent neighbours don't darken edges.
            let sample = |sx: i32, sy: i32| -> [f32; 4] {
                if sx < 0 || sy < 0 || sx >= src_w || sy >= src_h {
                    [0.0; 4]
                } else {
                    let idx = sy as usize * src_stride + sx as usize * 4;
                    let a = src_raw[idx + 3] as f32;
                    let k = a / 255.0;
                    [
                        src_raw[idx] as f32 * k,
                        src_raw[idx + 1] as f32 * k,
                        src_raw[idx + 2] as f32 * k,
                        a,
                    ]
                }
            };

            let tl = sample(x0, y0);
            let tr = sample(x0 + 1, y0);
            let bl = sample(x0, y0 + 1);
            let br = sample(x0 + 1, y0 + 1);

            let mut out = [0.0f32; 4];
            for (c, o) in out.iter_mut().enumerate() {
                let top = tl[c] + (tr[c] - tl[c]) * tx;
                let bot = bl[c] + (br[c] - bl[c]) * tx;
                *o = top + (bot - top) * ty;
            }
            let alpha = out[3].clamp(0.0, 255.0);
            if alpha <= 0.0 {
                continue;
            }
            let px = dx * 4;
            let unpremul = 255.0 / alpha;
            for c in 0..3 {
                row[px + c] = (out[c] * unpremul).round().clamp(0.0, 255.0) as u8;
            }
            row[px + 3] = alpha.round() as u8;
        }
    });
    dst
}

type Matrix3 = [[f32; 3]; 3];

fn saturate_matrix(s: f32) -> Matrix3 {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix3 {
    let a = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
        [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
        [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix3 {
    let (s, c) = degrees.to_radians().sin_cos();
    [
        [0.213 + c * 0.787 - s * 0.213, 0.715 - c * 0.715 - s * 0.715, 0.072 - c * 0.072 + s * 0.928],
        [0.213 - c * 0.213 + s * 0.143, 0.715 + c * 0.285 + s * 0.140, 0.072 - c * 0.072 - s * 0.283],
        [0.213 - c * 0.213 - s * 0.787, 0.715 - c * 0.715 + s * 0.715, 0.072 + c * 0.928 + s * 0.072],
    ]
}

fn apply_matrix(m: &Matrix3, rgb: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (o, row) in out.iter_mut().zip(m) {
        *o = (row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2]).clamp(0.0, 1.0);
    }
    out
}

/// brightness, contrast, saturate, then sepia or hue-rotate for warmth.
/// Each step clamps to `[0, 1]`, as a chain of CSS filter functions does.
fn apply_color_filters(img: &mut RgbaImage, adj: &AdjustmentSettings) {
    if adj.brightness == 100.0
        && adj.contrast == 100.0
        && adj.saturation == 100.0
        && adj.warmth == 0.0
    {
        return;
    }
    let brightness = adj.brightness / 100.0;
    let contrast = adj.contrast / 100.0;
    let saturate = (adj.saturation != 100.0).then(|| saturate_matrix(adj.saturation / 100.0));
    let tint = if adj.warmth > 0.0 {
        Some(sepia_matrix(adj.warmth * 0.5 / 100.0))
    } else if adj.warmth < 0.0 {
        Some(hue_rotate_matrix(adj.warmth * 0.5))
    } else {
        None
    };

    let row_bytes = img.width() as usize * 4;
    if row_bytes == 0 {
        return;
    }
    img.as_mut().par_chunks_mut(row_bytes).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let mut rgb = [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            ];
            for c in rgb.iter_mut() {
                *c = (*c * brightness).clamp(0.0, 1.0);
                *c = ((*c - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
            }
            if let Some(m) = &saturate {
                rgb = apply_matrix(m, rgb);
            }
            if let Some(m) = &tint {
                rgb = apply_matrix(m, rgb);
            }
            for (dst, v) in px.iter_mut().zip(rgb) {
                *dst = (v * 255.0).round() as u8;
            }
        }
    });
}

/// 1-D Gaussian kernel truncated at ceil(3*sigma).
fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Separable Gaussian blur on premultiplied colour. Outside the canvas is
/// transparent, so edges fade out instead of smearing.
fn gaussian_blur(src: &RgbaImage, sigma: f32) -> RgbaImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }
    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() as isize / 2;

    let premul: Vec<f32> = src
        .as_raw()
        .chunks_exact(4)
        .flat_map(|p| {
            let a = p[3] as f32 / 255.0;
            [p[0] as f32 * a, p[1] as f32 * a, p[2] as f32 * a, p[3] as f32]
        })
        .collect();

    let convolve = |input: &[f32], out: &mut [f32], horizontal: bool| {
        out.par_chunks_mut(w * 4).enumerate().for_each(|(y, row_out)| {
            for x in 0..w {
                let mut acc = [0.0f32; 4];
                for (ki, &kv) in kernel.iter().enumerate() {
                    let off = ki as isize - radius;
                    let (sx, sy) = if horizontal {
                        (x as isize + off, y as isize)
                    } else {
                        (x as isize, y as isize + off)
                    };
                    if sx < 0 || sy < 0 || sx >= w as isize || sy >= h as isize {
                        continue;
                    }
                    let idx = (sy as usize * w + sx as usize) * 4;
                    for c in 0..4 {
                        acc[c] += input[idx + c] * kv;
                    }
                }
                row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
            }
        });
    };

    let mut pass_h = vec![0.0f32; premul.len()];
    convolve(&premul, &mut pass_h, true);
    let mut pass_v = vec![0.0f32; premul.len()];
    convolve(&pass_h, &mut pass_v, false);

    let mut out = RgbaImage::new(w as u32, h as u32);
    for (dst, p) in out.as_mut().chunks_exact_mut(4).zip(pass_v.chunks_exact(4)) {
        let alpha = p[3].clamp(0.0, 255.0);
        if alpha <= 0.0 {
            continue;
        }
        let unpremul = 255.0 / alpha;
        for c in 0..3 {
            dst[c] = (p[c] * unpremul).round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = alpha.round() as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const A: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const B: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const C: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const D: Rgba<u8> = Rgba([255, 255, 0, 255]);

    fn quad() -> RgbaImage {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, A);
        img.put_pixel(1, 0, B);
        img.put_pixel(0, 1, C);
        img.put_pixel(1, 1, D);
        img
    }

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 90, 255]))
    }

    #[test]
    fn identity_is_a_copy() {
        let src = gradient(17, 9);
        assert_eq!(bake(&src, &AdjustmentSettings::default()), src);
    }

    #[test]
    fn rotate_clockwise_quarter() {
        let adj = AdjustmentSettings {
            rotation: 90.0,
            ..Default::default()
        };
        let out = bake(&quad(), &adj);
        assert_eq!(*out.get_pixel(0, 0), C);
        assert_eq!(*out.get_pixel(1, 0), A);
        assert_eq!(*out.get_pixel(0, 1), D);
        assert_eq!(*out.get_pixel(1, 1), B);
    }

    #[test]
    fn flips_mirror_about_center() {
        let flip_x = AdjustmentSettings {
            flip_x: true,
            ..Default::default()
        };
        let out = bake(&quad(), &flip_x);
        assert_eq!(*out.get_pixel(0, 0), B);
        assert_eq!(*out.get_pixel(1, 1), C);

        let flip_y = AdjustmentSettings {
            flip_y: true,
            ..Default::default()
        };
        let out = bake(&quad(), &flip_y);
        assert_eq!(*out.get_pixel(0, 0), C);
        assert_eq!(*out.get_pixel(1, 0), D);
    }

    #[test]
    fn flip_is_applied_before_rotation() {
        // translate * rotate * scale: the source is mirrored, then rotated.
        let adj = AdjustmentSettings {
            rotation: 90.0,
            flip_x: true,
            ..Default::default()
        };
        let out = bake(&quad(), &adj);
        // Mirrored: B A / D C; rotated clockwise: D B / C A.
        assert_eq!(*out.get_pixel(0, 0), D);
        assert_eq!(*out.get_pixel(1, 0), B);
        assert_eq!(*out.get_pixel(0, 1), C);
        assert_eq!(*out.get_pixel(1, 1), A);
    }

    #[test]
    fn rotation_keeps_extents_and_clips() {
        let src = RgbaImage::from_pixel(40, 20, A);
        let adj = AdjustmentSettings {
            rotation: 45.0,
            ..Default::default()
        };
        let out = bake(&src, &adj);
        assert_eq!(out.dimensions(), (40, 20));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(*out.get_pixel(20, 10), A);
    }

    #[test]
    fn rotated_edges_keep_their_colour() {
        let src = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
        let adj = AdjustmentSettings {
            rotation: 30.0,
            ..Default::default()
        };
        let out = bake(&src, &adj);
        let mut partial = 0;
        for p in out.pixels().filter(|p| p[3] > 0 && p[3] < 255) {
            partial += 1;
            assert_eq!([p[0], p[1], p[2]], [255, 255, 255], "{p:?}");
        }
        assert!(partial > 0);
    }

    #[test]
    fn half_transparent_source_survives_rotation() {
        let src = RgbaImage::from_pixel(9, 9, Rgba([200, 40, 10, 128]));
        let adj = AdjustmentSettings {
            rotation: 90.0,
            ..Default::default()
        };
        assert_eq!(*bake(&src, &adj).get_pixel(4, 4), Rgba([200, 40, 10, 128]));
    }

    #[test]
    fn bake_is_deterministic() {
        let src = gradient(31, 23);
        let adj = AdjustmentSettings {
            rotation: 90.0,
            flip_x: true,
            brightness: 150.0,
            blur: 1.5,
            ..Default::default()
        };
        assert_eq!(bake(&src, &adj), bake(&src, &adj));
    }

    #[test]
    fn brightness_and_contrast_follow_filter_formulas() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let bright = AdjustmentSettings {
            brightness: 150.0,
            ..Default::default()
        };
        assert_eq!(*bake(&src, &bright).get_pixel(0, 0), Rgba([150, 150, 150, 255]));

        let contrast = AdjustmentSettings {
            contrast: 150.0,
            ..Default::default()
        };
        assert_eq!(*bake(&src, &contrast).get_pixel(0, 0), Rgba([86, 86, 86, 255]));
    }

    #[test]
    fn zero_saturation_is_luminance_gray() {
        let src = RgbaImage::from_pixel(1, 1, A);
        let adj = AdjustmentSettings {
            saturation: 0.0,
            ..Default::default()
        };
        assert_eq!(*bake(&src, &adj).get_pixel(0, 0), Rgba([54, 54, 54, 255]));
    }

    #[test]
    fn warmth_tints_towards_sepia() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let adj = AdjustmentSettings {
            warmth: 30.0,
            ..Default::default()
        };
        let p = *bake(&src, &adj).get_pixel(0, 0);
        assert_eq!(p[0], 255);
        assert!(p[2] < 255);
    }

    #[test]
    fn blur_spreads_alpha_without_shifting_colour() {
        let mut src = RgbaImage::new(7, 7);
        src.put_pixel(3, 3, C);
        let adj = AdjustmentSettings {
            blur: 1.0,
            ..Default::default()
        };
        let out = bake(&src, &adj);
        let center = out.get_pixel(3, 3);
        let side = out.get_pixel(4, 3);
        assert!(center[3] < 255);
        assert!(side[3] > 0);
        assert_eq!(side[2], 255);
        assert_eq!(side[0], 0);
    }

    #[test]
    fn kernel_is_normalized() {
        let k = build_gaussian_kernel(2.0);
        assert_eq!(k.len(), 13);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(build_gaussian_kernel(0.0), vec![1.0]);
    }
}
