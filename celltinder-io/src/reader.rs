//! TIFF frame readers.
//!
//! Frames are single-channel 2D TIFFs. Intensity images decode to `f32`
//! samples, label masks to `u32`.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::module_name_repetitions
)]

use crate::{Error, Result};
use ndarray::Array2;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};

/// A pixel type a decoded TIFF buffer can be converted into.
pub trait FramePixel: Copy + Default + PartialEq {
    /// Human-readable name used in error messages.
    fn type_name() -> &'static str;

    /// Converts a decoded sample buffer, or explains why it cannot.
    ///
    /// # Errors
    /// Returns a description of the unsupported sample format or value.
    fn from_decoded(result: DecodingResult) -> std::result::Result<Vec<Self>, String>;
}

impl FramePixel for f32 {
    fn type_name() -> &'static str {
        "f32 image"
    }

    fn from_decoded(result: DecodingResult) -> std::result::Result<Vec<Self>, String> {
        let data = match result {
            DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
            DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
            DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I8(buf) => buf.into_iter().map(f32::from).collect(),
            DecodingResult::I16(buf) => buf.into_iter().map(f32::from).collect(),
            DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f32).collect(),
            DecodingResult::F32(buf) => buf,
            DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
            #[allow(unreachable_patterns)]
            _ => return Err("unsupported sample format".to_string()),
        };
        Ok(data)
    }
}

impl FramePixel for u32 {
    fn type_name() -> &'static str {
        "u32 label mask"
    }

    fn from_decoded(result: DecodingResult) -> std::result::Result<Vec<Self>, String> {
        match result {
            DecodingResult::U8(buf) => Ok(buf.into_iter().map(u32::from).collect()),
            DecodingResult::U16(buf) => Ok(buf.into_iter().map(u32::from).collect()),
            DecodingResult::U32(buf) => Ok(buf),
            DecodingResult::U64(buf) => labels(buf),
            DecodingResult::I8(buf) => labels(buf),
            DecodingResult::I16(buf) => labels(buf),
            DecodingResult::I32(buf) => labels(buf),
            DecodingResult::I64(buf) => labels(buf),
            DecodingResult::F32(_) | DecodingResult::F64(_) => {
                Err("floating-point masks are not supported".to_string())
            }
            #[allow(unreachable_patterns)]
            _ => Err("unsupported sample format".to_string()),
        }
    }
}

fn labels<V>(buf: Vec<V>) -> std::result::Result<Vec<u32>, String>
where
    V: Copy + std::fmt::Display,
    u32: TryFrom<V>,
{
    buf.into_iter()
        .map(|v| u32::try_from(v).map_err(|_| format!("mask label {v} does not fit in u32")))
        .collect()
}

/// Decoder limits for whole-slide frames, which routinely exceed the tiff
/// crate's 256 MiB default buffer.
fn frame_limits() -> Limits {
    Limits::unlimited()
}

/// Reads a single-channel TIFF into a `(rows, cols)` array.
///
/// # Errors
/// Returns [`Error::NotFound`] if the file does not exist and
/// [`Error::Read`] if it cannot be opened or decoded as a grayscale frame.
pub fn read_frame<T: FramePixel>(path: &Path) -> Result<Array2<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(Error::read(path, e)),
    };

    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| Error::read(path, e))?
        .with_limits(frame_limits());
    let (width, height) = decoder.dimensions().map_err(|e| Error::read(path, e))?;
    let color_type = decoder.colortype().map_err(|e| Error::read(path, e))?;
    if !matches!(color_type, tiff::ColorType::Gray(_)) {
        return Err(Error::read(
            path,
            format!("expected a single-channel frame, found {color_type:?}"),
        ));
    }

    let decoded = decoder.read_image().map_err(|e| Error::read(path, e))?;
    let data = T::from_decoded(decoded)
        .map_err(|reason| Error::read(path, format!("{reason} ({})", T::type_name())))?;

    let shape = (height as usize, width as usize);
    Array2::from_shape_vec(shape, data).map_err(|e| Error::read(path, e))
}

/// Reads an intensity image frame.
///
/// # Errors
/// See [`read_frame`].
pub fn read_image(path: &Path) -> Result<Array2<f32>> {
    read_frame(path)
}

/// Reads a label mask frame.
///
/// # Errors
/// See [`read_frame`].
pub fn read_mask(path: &Path) -> Result<Array2<u32>> {
    read_frame(path)
}
