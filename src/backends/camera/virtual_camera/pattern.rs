// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic frames for the virtual camera

use crate::backends::camera::types::{CameraFacing, CameraFrame, FrameData, PixelFormat};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;

/// SMPTE-like bar colours, left to right
const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

/// Colour bars scrolling with `phase`; the front camera shows them mirrored
pub fn color_bars(width: u32, height: u32, phase: u32, facing: CameraFacing, dim: bool) -> RgbaImage {
    let bar_width = (width / BARS.len() as u32).max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        let x = match facing {
            CameraFacing::Back => x,
            CameraFacing::Front => width - 1 - x,
        };
        let index = (((x + phase) / bar_width) as usize) % BARS.len();
        let [mut r, mut g, mut b] = BARS[index];
        // Bottom strip is a luma ramp
        if y >= height - height / 8 {
            let level = (x * 255 / width.max(1)) as u8;
            (r, g, b) = (level, level, level);
        }
        if dim {
            (r, g, b) = (r / 8, g / 8, b / 8);
        }
        image::Rgba([r, g, b, 255])
    })
}

/// Wrap an RGBA image as a camera frame
pub fn frame_from_image(image: RgbaImage) -> CameraFrame {
    let (width, height) = image.dimensions();
    CameraFrame::from_rgba(width, height, image.into_raw())
}

/// Sample an RGBA image through a Bayer colour filter array
pub fn bayer_mosaic(image: &RgbaImage, format: PixelFormat) -> CameraFrame {
    let (width, height) = image.dimensions();
    // Channel index for (even row, even col), (even, odd), (odd, even), (odd, odd)
    let cfa: [usize; 4] = match format {
        PixelFormat::BayerBGGR => [2, 1, 1, 0],
        PixelFormat::BayerGRBG => [1, 0, 2, 1],
        PixelFormat::BayerGBRG => [1, 2, 0, 1],
        _ => [0, 1, 1, 2],
    };
    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let site = ((y % 2) * 2 + (x % 2)) as usize;
            data.push(image.get_pixel(x, y).0[cfa[site]]);
        }
    }
    CameraFrame {
        width,
        height,
        data: FrameData::Copied(Arc::from(data)),
        format: if format.is_bayer() {
            format
        } else {
            PixelFormat::BayerRGGB
        },
        stride: width,
        captured_at: Instant::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_pattern_is_mirrored() {
        let back = color_bars(70, 8, 0, CameraFacing::Back, false);
        let front = color_bars(70, 8, 0, CameraFacing::Front, false);
        assert_eq!(back.get_pixel(0, 0), front.get_pixel(69, 0));
    }

    #[test]
    fn test_dim_pattern_is_dark() {
        let frame = frame_from_image(color_bars(64, 32, 0, CameraFacing::Back, true));
        assert!(frame.mean_luma().unwrap() < 30.0);
    }

    #[test]
    fn test_rggb_mosaic_samples_expected_channels() {
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let raw = bayer_mosaic(&image, PixelFormat::BayerRGGB);
        assert_eq!(&raw.data[..], &[10, 20, 20, 30]);
        assert_eq!(raw.stride, 2);
    }
}
