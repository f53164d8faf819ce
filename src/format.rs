use crate::{error::Result, FrameIterator, Image, Pixel};
use std::{ffi::OsStr, fmt, fmt::Display, io::Read, path::Path};

#[cfg(feature = "gif")]
use crate::{encodings::gif, Decoder};

/// Represents the underlying encoding format of an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// No known encoding is known for the image.
    ///
    /// This is usually because the image was created manually. See [`Image::set_format`]
    /// to manually set the encoding format.
    #[default]
    Unknown,

    /// The image is encoded in the GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns whether the extension is unknown.
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self == &Self::Unknown
    }

    /// Parses the given extension and returns the corresponding image format.
    ///
    /// Unknown extensions, and extensions that are not valid UTF-8, resolve to
    /// [`ImageFormat::Unknown`].
    #[must_use]
    pub fn from_extension(ext: impl AsRef<OsStr>) -> Self {
        match ext.as_ref().to_str().map(str::to_ascii_lowercase).as_deref() {
            Some("gif") => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Returns the format specified by the given path.
    ///
    /// This uses [`ImageFormat::from_extension`] to parse the extension. See
    /// [`ImageFormat::infer_encoding`] for an implementation that can resolve the format from
    /// the data.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .map_or(Self::Unknown, Self::from_extension)
    }

    /// Returns the format specified by the given MIME type.
    #[must_use]
    pub fn from_mime_type(mime: impl AsRef<str>) -> Self {
        match mime.as_ref() {
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Infers the encoding format from the given data via its magic bytes.
    #[must_use]
    pub fn infer_encoding(sample: &[u8]) -> Self {
        if sample.starts_with(b"GIF8") {
            Self::Gif
        } else {
            Self::Unknown
        }
    }

    /// Decodes the image data into an image. For animated images this is the first frame.
    ///
    /// # Errors
    /// * An error occured while decoding.
    /// * `UnknownEncodingFormat`: No decoder implementation is available for this format. Did
    ///   you forget to enable the feature?
    #[cfg_attr(not(feature = "gif"), allow(unused_variables))]
    pub fn run_decoder<P: Pixel>(&self, stream: impl Read) -> Result<Image<P>> {
        match self {
            #[cfg(feature = "gif")]
            Self::Gif => gif::GifDecoder::new().decode(stream),
            _ => Err(crate::Error::UnknownEncodingFormat),
        }
    }

    /// Decodes the image sequence data into a lazy frame iterator.
    ///
    /// # Errors
    /// * An error occured while decoding the header of the stream.
    /// * `UnknownEncodingFormat`: No decoder implementation is available for this format.
    #[cfg_attr(not(feature = "gif"), allow(unused_variables))]
    pub fn run_sequence_decoder<'a, P: Pixel + 'a, R: Read + 'a>(
        &self,
        stream: R,
    ) -> Result<Box<dyn FrameIterator<P> + 'a>> {
        Ok(match self {
            #[cfg(feature = "gif")]
            Self::Gif => Box::new(gif::GifDecoder::new().decode_sequence(stream)?),
            _ => return Err(crate::Error::UnknownEncodingFormat),
        })
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Gif => "gif",
                Self::Unknown => "",
            }
        )
    }
}
