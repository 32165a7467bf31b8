//! Pixel sizes and rectangles shared by every preview computation.
//!
//! [`Size`] doubles as a camera resolution, a view size and a screen size.
//! Pure integer geometry, `no_std` compatible.

/// Width × height dimensions in pixels.
///
/// Equality is component-wise. Compare by [`Size::area`] for ordering;
/// two sizes with equal area are not equal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels. Computed in `u64` so sensor-scale sizes never overflow.
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Same size with width and height exchanged.
    pub const fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Whether either dimension is zero.
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether this size has exactly the aspect ratio of `reference`.
    ///
    /// Uses truncating integer math, `height == width * ref.height / ref.width`,
    /// so 1280×720 and 1366×768 both match 1920×1080. A reference with
    /// zero width matches nothing.
    pub const fn matches_aspect(self, reference: Size) -> bool {
        if reference.width == 0 {
            return false;
        }
        let expected = self.width as u64 * reference.height as u64 / reference.width as u64;
        self.height as u64 == expected
    }

    /// Whether both dimensions are ≤ the corresponding dimension of `max`.
    pub const fn fits_within(self, max: Size) -> bool {
        self.width <= max.width && self.height <= max.height
    }

    /// Whether both dimensions are ≥ the corresponding dimension of `target`.
    pub const fn covers(self, target: Size) -> bool {
        self.width >= target.width && self.height >= target.height
    }

    /// Measure a view of this available size locked to `ratio`.
    ///
    /// Returns the largest size with the ratio's proportions that fits inside
    /// `self`. A ratio with a zero component means "no ratio" and returns
    /// `self` unchanged.
    pub const fn fit_aspect(self, ratio: Size) -> Size {
        if ratio.width == 0 || ratio.height == 0 {
            return self;
        }
        let (w, h) = (self.width as u64, self.height as u64);
        let (rw, rh) = (ratio.width as u64, ratio.height as u64);
        if w < h * rw / rh {
            Size::new(self.width, (w * rh / rw) as u32)
        } else {
            Size::new((h * rw / rh) as u32, self.height)
        }
    }
}

/// Largest size by area. The first maximum in input order wins.
pub fn largest_by_area(sizes: &[Size]) -> Option<Size> {
    let mut iter = sizes.iter().copied();
    let first = iter.next()?;
    Some(iter.fold(first, |best, s| if s.area() > best.area() { s } else { best }))
}

/// Smallest size by area. The first minimum in input order wins.
pub fn smallest_by_area(sizes: impl IntoIterator<Item = Size>) -> Option<Size> {
    sizes
        .into_iter()
        .reduce(|best, s| if s.area() < best.area() { s } else { best })
}

/// Axis-aligned rectangle with edge coordinates, right/bottom exclusive.
///
/// Signed so it can also carry camera metering coordinates, which live in
/// `[-1000, 1000]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a rect from its four edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rect at the origin covering `size`.
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width as i32, size.height as i32)
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Center point, rounded toward the top-left.
    pub const fn center(&self) -> (i32, i32) {
        (
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }

    /// Whether `(x, y)` lies inside (right/bottom exclusive).
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}
