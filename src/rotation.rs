//! Display rotation, sensor orientation, and the width/height swap rule.

use tracing::warn;

use crate::geometry::Size;

/// Display rotation relative to the device's natural orientation.
///
/// The discriminant is the platform surface rotation code (0-3).
///
/// ```text
///     Rotate0      Rotate90     Rotate180    Rotate270
///     ┌───┐        ┌─────┐      ┌───┐        ┌─────┐
///     │ ▲ │        │  ▶  │      │ ▼ │        │  ◀  │
///     │   │        └─────┘      │   │        └─────┘
///     └───┘                     └───┘
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Rotation {
    #[default]
    Rotate0 = 0,
    Rotate90 = 1,
    Rotate180 = 2,
    Rotate270 = 3,
}

impl Rotation {
    const ALL: [Self; 4] = [
        Self::Rotate0,
        Self::Rotate90,
        Self::Rotate180,
        Self::Rotate270,
    ];

    /// From a surface rotation code (0-3). Returns `None` for other values.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// From degrees. Only exact multiples of 90 in `0..360` are accepted.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        u8::try_from(degrees / 90).ok().and_then(Self::from_code)
    }

    /// Surface rotation code (0-3).
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn degrees(self) -> u32 {
        self.code() as u32 * 90
    }

    /// Whether this rotation turns landscape into portrait or back.
    pub fn swaps_axes(self) -> bool {
        self.code() % 2 == 1
    }

    /// Apply `self`, then `other`.
    pub fn compose(self, other: Self) -> Self {
        Self::ALL[((self.code() + other.code()) & 3) as usize]
    }

    /// The rotation that undoes `self`.
    pub fn inverse(self) -> Self {
        Self::ALL[((4 - self.code()) & 3) as usize]
    }

    /// Whether a sensor mounted at `sensor_orientation` degrees delivers
    /// frames whose width/height are swapped relative to the display at
    /// this rotation.
    ///
    /// Sensors mounted at 90/270 are swapped on a 0/180 display, and sensors
    /// at 0/180 are swapped on a 90/270 display. Any other sensor value is
    /// treated as unswapped.
    pub fn swaps_with_sensor(self, sensor_orientation: u32) -> bool {
        let sensor_sideways = matches!(sensor_orientation, 90 | 270);
        let sensor_upright = matches!(sensor_orientation, 0 | 180);
        if self.swaps_axes() {
            sensor_upright
        } else {
            sensor_sideways
        }
    }

    /// Transform sensor-space dimensions to display-space dimensions.
    pub fn transform_dimensions(self, size: Size) -> Size {
        if self.swaps_axes() { size.swapped() } else { size }
    }
}

/// Decide whether preview width/height must be swapped before sizing.
///
/// Both arguments are in degrees. An invalid display rotation is logged and
/// treated as not swapped.
///
/// ```
/// use previewfit::resolve_swapped_dimensions;
///
/// assert!(resolve_swapped_dimensions(90, 0));
/// assert!(!resolve_swapped_dimensions(90, 90));
/// assert!(resolve_swapped_dimensions(0, 90));
/// assert!(!resolve_swapped_dimensions(0, 0));
/// ```
pub fn resolve_swapped_dimensions(sensor_orientation: u32, display_rotation: u32) -> bool {
    match Rotation::from_degrees(display_rotation) {
        Some(rotation) => rotation.swaps_with_sensor(sensor_orientation),
        None => {
            warn!(display_rotation, "display rotation is invalid");
            false
        }
    }
}
