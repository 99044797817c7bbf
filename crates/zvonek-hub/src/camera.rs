//! # Camera Collaborator
//!
//! The camera is external: the hub only consumes already-encoded JPEG frames
//! from a [`FrameSource`]. Capture is blocking (sensor drivers are), so the
//! multiplexer always calls it from the blocking thread pool.

use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Multipart boundary used to delimit frames on the stream.
pub const MULTIPART_BOUNDARY: &str = "frame";

/// `Content-Type` of the camera stream response.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Camera failures.
#[derive(Error, Debug)]
pub enum CameraError {
    /// The camera could not be opened or has gone away.
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    /// A single capture failed.
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// Reading frame data failed.
    #[error("camera I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One self-contained JPEG image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame(Bytes);

impl EncodedFrame {
    /// Wrap JPEG bytes, checking the start-of-image marker.
    pub fn jpeg(data: impl Into<Bytes>) -> Result<Self, CameraError> {
        let data = data.into();
        if !data.starts_with(&JPEG_SOI) {
            return Err(CameraError::Capture(
                "frame does not start with a JPEG SOI marker".into(),
            ));
        }
        Ok(Self(data))
    }

    /// Raw JPEG bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Size of the JPEG payload.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty. A validated frame never is.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as one part of a `multipart/x-mixed-replace` body.
    pub fn to_multipart_part(&self) -> Bytes {
        let head = format!("--{MULTIPART_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
        let mut part = BytesMut::with_capacity(head.len() + self.0.len() + 2);
        part.put_slice(head.as_bytes());
        part.put_slice(&self.0);
        part.put_slice(b"\r\n");
        part.freeze()
    }
}

/// Producer of camera frames.
pub trait FrameSource: Send + Sync + 'static {
    /// Capture the next frame. May block.
    fn capture(&self) -> Result<EncodedFrame, CameraError>;

    /// Name used in log fields.
    fn name(&self) -> &str {
        "camera"
    }
}

/// Serves a JPEG file from disk as every frame.
///
/// Used on development machines without a sensor. The file is re-read per
/// capture so it can be swapped while streaming.
#[derive(Debug, Clone)]
pub struct StillImageSource {
    path: PathBuf,
}

impl StillImageSource {
    /// Open a still source, failing if the file is missing or not a JPEG.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CameraError> {
        let source = Self {
            path: path.as_ref().to_path_buf(),
        };
        source.capture().map_err(|err| match err {
            CameraError::Io(io) => CameraError::Unavailable(format!(
                "cannot read {}: {io}",
                source.path.display()
            )),
            other => other,
        })?;
        Ok(source)
    }
}

impl FrameSource for StillImageSource {
    fn capture(&self) -> Result<EncodedFrame, CameraError> {
        let data = std::fs::read(&self.path)?;
        EncodedFrame::jpeg(data)
    }

    fn name(&self) -> &str {
        "still-image"
    }
}
