use crate::{
    error::{Error, Result},
    format::ImageFormat,
    pixel::{Pixel, Rgba},
};
use std::{fs::File, io::Read, num::NonZeroU32, path::Path};

/// A high-level image representation.
///
/// This represents a static, single-frame image: a dense, row-major grid of pixels whose
/// dimensions never change once created. See [`ImageSequence`][crate::ImageSequence] for
/// information on opening animated or multi-frame images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image<P: Pixel = Rgba> {
    pub(crate) width: NonZeroU32,
    pub(crate) height: NonZeroU32,
    pub(crate) data: Vec<P>,
    pub(crate) format: ImageFormat,
}

fn non_zero_dimensions(width: u32, height: u32) -> Result<(NonZeroU32, NonZeroU32)> {
    match (NonZeroU32::new(width), NonZeroU32::new(height)) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(Error::InvalidDimensions { width, height }),
    }
}

impl<P: Pixel> Image<P> {
    /// Creates a new image with the given width and height, with all pixels being set
    /// intially to `fill`.
    ///
    /// # Errors
    /// * `InvalidDimensions`: The width or height is zero.
    pub fn new(width: u32, height: u32, fill: P) -> Result<Self> {
        let (width, height) = non_zero_dimensions(width, height)?;

        Ok(Self {
            width,
            height,
            data: vec![fill; width.get() as usize * height.get() as usize],
            format: ImageFormat::default(),
        })
    }

    /// Creates a new image shaped with the given width and height, with each pixel computed from
    /// its coordinates by the given function.
    ///
    /// # Errors
    /// * `InvalidDimensions`: The width or height is zero.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> P) -> Result<Self> {
        let (width, height) = non_zero_dimensions(width, height)?;

        Ok(Self {
            width,
            height,
            data: (0..height.get())
                .flat_map(|y| (0..width.get()).map(move |x| (x, y)))
                .map(|(x, y)| f(x, y))
                .collect(),
            format: ImageFormat::default(),
        })
    }

    /// Creates a new image from row-major pixel data. The height is inferred from the length of
    /// the data.
    ///
    /// # Errors
    /// * `InvalidDimensions`: The width is zero.
    /// * `IncompatibleImageData`: The data is empty or its length is not a multiple of `width`.
    pub fn from_pixels(width: u32, data: Vec<P>) -> Result<Self> {
        let width = NonZeroU32::new(width).ok_or(Error::InvalidDimensions { width, height: 0 })?;
        let height = u32::try_from(data.len() / width.get() as usize)
            .ok()
            .and_then(NonZeroU32::new);

        match height {
            Some(height) if data.len() % width.get() as usize == 0 => Ok(Self {
                width,
                height,
                data,
                format: ImageFormat::default(),
            }),
            _ => Err(Error::IncompatibleImageData {
                width: width.get(),
                height: u32::try_from(data.len() / width.get() as usize).unwrap_or(u32::MAX),
                received: data.len(),
            }),
        }
    }

    /// Decodes an image with the explicitly given image encoding from the raw byte stream.
    /// For animated images, this is the first composited frame.
    ///
    /// # Errors
    /// * The image could not be decoded, see [`Error`] for the possible causes.
    /// * `UnknownEncodingFormat`: There is no decoder for the given format.
    pub fn from_reader(format: ImageFormat, bytes: impl Read) -> Result<Self> {
        format.run_decoder(bytes)
    }

    /// Decodes an image with the explicitly given image encoding from the given bytes.
    /// Could be useful in conjunction with the `include_bytes!` macro.
    ///
    /// # Errors
    /// * The image could not be decoded, see [`Error`] for the possible causes.
    /// * `UnknownEncodingFormat`: There is no decoder for the given format.
    pub fn from_bytes(format: ImageFormat, bytes: impl AsRef<[u8]>) -> Result<Self> {
        format.run_decoder(bytes.as_ref())
    }

    /// Decodes an image from the given bytes, inferring its encoding from its magic bytes.
    ///
    /// # Errors
    /// * The image could not be decoded, see [`Error`] for the possible causes.
    /// * `UnknownEncodingFormat`: The encoding could not be inferred.
    pub fn from_bytes_inferred(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let bytes = bytes.as_ref();

        ImageFormat::infer_encoding(bytes).run_decoder(bytes)
    }

    /// Opens a file from the given path and decodes it into an image.
    ///
    /// The encoding of the image is inferred from the file extension, falling back to the
    /// contents of the file.
    ///
    /// # Errors
    /// * An error occured while reading the file.
    /// * The image could not be decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;
        let format = match ImageFormat::from_path(path) {
            ImageFormat::Unknown => {
                let mut buffer = Vec::new();
                file.read_to_end(&mut buffer)?;

                return Self::from_bytes_inferred(buffer);
            }
            format => format,
        };

        format.run_decoder(file)
    }

    #[inline]
    pub(crate) const fn resolve_coordinate(&self, x: u32, y: u32) -> usize {
        y as usize * self.width.get() as usize + x as usize
    }

    #[inline]
    fn check_bounds(&self, x: u32, y: u32) -> Result<()> {
        if x < self.width() && y < self.height() {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                x,
                y,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    /// Checks that the `width` by `height` region at `(x, y)` lies completely within the image.
    fn check_region(&self, x: u32, y: u32, width: u32, height: u32) -> Result<()> {
        let fits = |offset: u32, length: u32, bound: u32| {
            offset.checked_add(length).map_or(false, |end| end <= bound)
        };

        if fits(x, width, self.width()) && fits(y, height, self.height()) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                x: x.saturating_add(width.saturating_sub(1)),
                y: y.saturating_add(height.saturating_sub(1)),
                width: self.width(),
                height: self.height(),
            })
        }
    }

    /// Returns the width of the image.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width.get()
    }

    /// Returns the height of the image.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height.get()
    }

    /// Returns the dimensions of the image as `(width, height)`.
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Returns the amount of pixels in the image.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false, since images cannot have a width or height of zero.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the encoding format of the image. This is nothing more but metadata about the
    /// image, [`ImageFormat::Unknown`] for images created by hand.
    #[inline]
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Sets the encoding format of this image. This is more or less image metadata.
    pub fn set_format(&mut self, format: ImageFormat) {
        self.format = format;
    }

    /// Returns an iterator over every pixel of the image in row-major order.
    ///
    /// Every call returns a new iterator starting from the first pixel.
    #[inline]
    pub fn pixels(&self) -> std::slice::Iter<'_, P> {
        self.data.iter()
    }

    /// Returns an iterator over the rows of the image. Each row is a slice of `width` pixels.
    #[inline]
    pub fn rows(&self) -> std::slice::ChunksExact<'_, P> {
        self.data.chunks_exact(self.width() as usize)
    }

    /// Returns the raw, row-major pixel data of the image.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[P] {
        &self.data
    }

    /// Returns the pixel at the given coordinates.
    ///
    /// # Errors
    /// * `OutOfBounds`: `x` or `y` lies outside of the image.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<P> {
        self.check_bounds(x, y)?;

        Ok(self.data[self.resolve_coordinate(x, y)])
    }

    /// Returns a mutable reference to the pixel at the given coordinates.
    ///
    /// # Errors
    /// * `OutOfBounds`: `x` or `y` lies outside of the image.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> Result<&mut P> {
        self.check_bounds(x, y)?;
        let pos = self.resolve_coordinate(x, y);

        Ok(&mut self.data[pos])
    }

    /// Sets the pixel at the given coordinates to the given pixel.
    ///
    /// # Errors
    /// * `OutOfBounds`: `x` or `y` lies outside of the image.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: P) -> Result<()> {
        *self.pixel_mut(x, y)? = pixel;
        Ok(())
    }

    /// Sets every pixel in the `width` by `height` region at `(x, y)` to `pixel`.
    ///
    /// # Errors
    /// * `OutOfBounds`: The region does not fit in the image. Nothing is changed.
    pub fn fill_region(&mut self, x: u32, y: u32, width: u32, height: u32, pixel: P) -> Result<()> {
        self.check_region(x, y, width, height)?;

        for row in y..y + height {
            let start = self.resolve_coordinate(x, row);
            self.data[start..start + width as usize].fill(pixel);
        }
        Ok(())
    }

    /// Copies the `width` by `height` region at `(x, y)` of `source` into the same region of
    /// this image.
    ///
    /// # Errors
    /// * `OutOfBounds`: The region does not fit in this image.
    /// * `IncompatibleImageData`: `source` has different dimensions than this image.
    pub fn copy_region_from(
        &mut self,
        source: &Self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if source.dimensions() != self.dimensions() {
            return Err(Error::IncompatibleImageData {
                width: self.width(),
                height: self.height(),
                received: source.len(),
            });
        }
        self.check_region(x, y, width, height)?;

        for row in y..y + height {
            let start = self.resolve_coordinate(x, row);
            let end = start + width as usize;
            self.data[start..end].copy_from_slice(&source.data[start..end]);
        }
        Ok(())
    }

    /// Returns the image with each pixel in the image mapped to the given function.
    ///
    /// The function should take the pixel and return another pixel.
    pub fn map_pixels<T: Pixel>(self, f: impl Fn(P) -> T) -> Image<T> {
        Image {
            width: self.width,
            height: self.height,
            data: self.data.into_iter().map(f).collect(),
            format: self.format,
        }
    }

    /// Converts the image into an image with the given pixel type.
    pub fn convert<T: Pixel>(self) -> Image<T> {
        self.map_pixels(|pixel| T::from_rgba(pixel.as_rgba()))
    }
}
