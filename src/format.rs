//! Preview pixel formats and still picture types.

use crate::geometry::Size;

/// Pixel layout of raw preview frames delivered by the capture source.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PreviewFormat {
    /// YCrCb 4:2:0 semi-planar. The format every camera must support.
    #[default]
    Nv21,
    /// YCrCb 4:2:0 planar.
    Yv12,
    /// YCbCr 4:2:2 semi-planar.
    Nv16,
    /// YCbCr 4:2:2 packed.
    Yuy2,
    /// 16-bit RGB.
    Rgb565,
}

impl PreviewFormat {
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Nv21 | Self::Yv12 => 12,
            Self::Nv16 | Self::Yuy2 | Self::Rgb565 => 16,
        }
    }

    /// Byte length of one frame of `size` in this format.
    pub const fn frame_len(self, size: Size) -> usize {
        (size.area() * self.bits_per_pixel() as u64 / 8) as usize
    }

    /// Number of bytes holding the luma (or only) plane.
    pub const fn luma_len(self, size: Size) -> usize {
        match self {
            Self::Rgb565 | Self::Yuy2 => self.frame_len(size),
            Self::Nv21 | Self::Yv12 | Self::Nv16 => size.area() as usize,
        }
    }
}

/// Encoding of a still picture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PictureType {
    #[default]
    Jpeg,
    Raw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nv21_frame_len() {
        // 1280×720 at 12 bpp
        assert_eq!(PreviewFormat::Nv21.frame_len(Size::new(1280, 720)), 1_382_400);
        assert_eq!(PreviewFormat::Nv21.luma_len(Size::new(1280, 720)), 921_600);
    }

    #[test]
    fn sixteen_bit_formats() {
        let s = Size::new(640, 480);
        assert_eq!(PreviewFormat::Yuy2.frame_len(s), 614_400);
        assert_eq!(PreviewFormat::Rgb565.frame_len(s), 614_400);
        assert_eq!(PreviewFormat::Nv16.luma_len(s), 307_200);
    }

    #[test]
    fn odd_size_truncates() {
        // 3×3 at 12 bpp = 13.5 bytes
        assert_eq!(PreviewFormat::Nv21.frame_len(Size::new(3, 3)), 13);
    }

    #[test]
    fn empty_size() {
        assert_eq!(PreviewFormat::Yv12.frame_len(Size::new(0, 480)), 0);
    }
}
