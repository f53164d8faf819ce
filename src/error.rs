//! Common error types.

use std::fmt;

/// A shortcut type equivalent to `Result<T, ril_gif::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error that occurs within the crate.
#[derive(Debug)]
pub enum Error {
    /// Tried to create an image (or decode a logical screen or frame) with a width or height of
    /// zero.
    InvalidDimensions {
        /// The requested width.
        width: u32,
        /// The requested height.
        height: u32,
    },

    /// A color channel was constructed from an integer outside of the `0..=255` range.
    ///
    /// Channel values are never clamped or wrapped.
    InvalidChannelValue {
        /// The name of the offending channel, i.e. `"r"`.
        channel: &'static str,
        /// The value that was received.
        value: i128,
    },

    /// Tried to access a pixel or region outside of the bounds of an image.
    ///
    /// The image is left untouched when this is returned.
    OutOfBounds {
        /// The x coordinate that was accessed.
        x: u32,
        /// The y coordinate that was accessed.
        y: u32,
        /// The width of the image.
        width: u32,
        /// The height of the image.
        height: u32,
    },

    /// The stream does not start with a known signature. Holds the bytes that were read instead.
    MalformedHeader([u8; 6]),

    /// Encountered a block introducer that is neither an extension, an image descriptor or the
    /// trailer.
    UnknownBlockType(u8),

    /// The stream ended before decoding was finished. The inner message names what was being
    /// read at the time.
    TruncatedData(&'static str),

    /// A compressed code referred to a table entry that does not exist yet.
    InvalidLzwCode {
        /// The code that was read.
        code: u16,
        /// The number of entries in the code table when the code was read.
        table_size: u16,
    },

    /// A frame's region extends beyond the logical screen.
    FrameOutOfBounds {
        /// The left offset of the frame.
        left: u32,
        /// The top offset of the frame.
        top: u32,
        /// The width of the frame.
        width: u32,
        /// The height of the frame.
        height: u32,
        /// The width of the logical screen.
        screen_width: u32,
        /// The height of the logical screen.
        screen_height: u32,
    },

    /// Received a palette index that is not covered by the active color table.
    InvalidPaletteIndex(u8),

    /// Invalid data was encountered when decoding an image, usually because it is corrupted.
    ///
    /// This covers structural problems that do not have a more specific variant.
    DecodingError(String),

    /// No encoding format could be inferred for the given image, or there is no decoder for it.
    UnknownEncodingFormat,

    /// An image received data incompatible with the image's dimensions.
    IncompatibleImageData {
        /// The width of the image.
        width: u32,
        /// The height of the image, as far as it could be inferred.
        height: u32,
        /// The number of pixels that was received.
        received: usize,
    },

    /// Tried to take an image out of a stream that contains no frames.
    EmptyImageError,

    /// An error occured when trying to read from a stream or a file.
    IoError(std::io::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => write!(
                f,
                "Invalid dimensions {width}x{height}, both width and height must be at least 1"
            ),
            Self::InvalidChannelValue { channel, value } => write!(
                f,
                "Invalid value {value} for channel `{channel}`, must be between 0 and 255"
            ),
            Self::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "Coordinates ({x}, {y}) are out of bounds for an image of size {width}x{height}"
            ),
            Self::MalformedHeader(signature) => write!(
                f,
                "Malformed header: expected GIF87a or GIF89a, got \"{}\"",
                signature.escape_ascii()
            ),
            Self::UnknownBlockType(byte) => write!(f, "Unknown block type: {byte:#04x}"),
            Self::TruncatedData(context) => write!(f, "Truncated data while reading {context}"),
            Self::InvalidLzwCode { code, table_size } => write!(
                f,
                "Invalid LZW code {code}, the code table only has {table_size} entries"
            ),
            Self::FrameOutOfBounds {
                left,
                top,
                width,
                height,
                screen_width,
                screen_height,
            } => write!(
                f,
                "Frame of size {width}x{height} at ({left}, {top}) does not fit in the \
                 {screen_width}x{screen_height} logical screen",
            ),
            Self::InvalidPaletteIndex(index) => write!(f, "Invalid palette index {index}"),
            Self::DecodingError(msg) => write!(f, "Decoding error: {msg}"),
            Self::UnknownEncodingFormat => write!(f, "Could not infer encoding format"),
            Self::IncompatibleImageData {
                width,
                height,
                received,
            } => write!(
                f,
                "An image with dimensions {width}x{height} should have {} pixels, received \
                 {received} instead",
                u64::from(*width) * u64::from(*height),
            ),
            Self::EmptyImageError => write!(f, "The image contains no frames"),
            Self::IoError(error) => write!(f, "IO error: {error}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}
