//! Row-major 2D pixel buffers.

use std::ops::{Index, IndexMut};

use image::{GrayImage, Luma, RgbImage};

/// Binary mask raster: 1 = inside, 0 = outside.
pub type Mask = Raster<u8>;

/// Three-channel byte image patch.
pub type RgbRaster = Raster<[u8; 3]>;

/// A row-major 2D buffer of pixels.
///
/// Coordinates are local: `(0, 0)` is the top-left pixel. Signed accessors
/// (`get_signed`, `set_signed`) exist for callers that translate global
/// coordinates and may land outside the extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Raster<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.pixels
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    /// Same-sized raster produced by applying `f` to every pixel.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Raster<U> {
        Raster {
            pixels: self.pixels.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    pub fn same_size<U>(&self, other: &Raster<U>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl<T: Copy> Raster<T> {
    /// Pixel at signed local coordinates, `None` outside the extent.
    #[inline]
    pub fn get_signed(&self, x: i32, y: i32) -> Option<T> {
        self.in_bounds(x, y)
            .then(|| self.pixels[y as usize * self.width + x as usize])
    }

    /// Writes a pixel at signed local coordinates; returns `false` (and
    /// writes nothing) outside the extent.
    #[inline]
    pub fn set_signed(&mut self, x: i32, y: i32, value: T) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = y as usize * self.width + x as usize;
        self.pixels[idx] = value;
        true
    }
}

impl<T: Default + Clone> Raster<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![T::default(); width * height],
            width,
            height,
        }
    }
}

impl<T: Clone> Raster<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn fill(&mut self, value: T) {
        self.pixels.fill(value);
    }
}

impl Raster<u8> {
    /// Number of non-zero pixels.
    pub fn count_nonzero(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }

    /// Whether any pixel is non-zero.
    pub fn any(&self) -> bool {
        self.pixels.iter().any(|&p| p != 0)
    }

    /// Builds a mask from rows of `0`/`1` (anything non-zero counts as 1).
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut pixels = Vec::with_capacity(width * height);
        for row in rows {
            let row = row.as_ref();
            assert_eq!(row.len(), width, "ragged mask rows");
            pixels.extend(row.iter().map(|&v| u8::from(v != 0)));
        }
        Self::new(width, height, pixels)
    }

    /// Same pixels as an `image` gray buffer, for the `imageproc` routines.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            Luma([self[(x as usize, y as usize)]])
        })
    }

    pub fn from_gray_image(image: &GrayImage) -> Self {
        let (w, h) = image.dimensions();
        Self::new(w as usize, h as usize, image.as_raw().clone())
    }
}

impl Raster<[u8; 3]> {
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let (w, h) = image.dimensions();
        let pixels = image.pixels().map(|p| p.0).collect();
        Self::new(w as usize, h as usize, pixels)
    }
}

impl<T> Index<(usize, usize)> for Raster<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Raster<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.pixels[y * self.width + x]
    }
}

impl<T> Index<usize> for Raster<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.pixels[idx]
    }
}

impl<T> IndexMut<usize> for Raster<T> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        &mut self.pixels[idx]
    }
}
