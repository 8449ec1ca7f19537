use crate::config::CameraConfig;
use opencv::{core::Mat, prelude::*, videoio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    OpenCameraFailed(opencv::Error),
    #[error("Camera source is not available: {0}")]
    SourceUnavailable(String),
    #[error("Failed to read frame: {0}")]
    ReadFrameFailed(opencv::Error),
    #[error("OpenCV error: {0}")]
    OpenCvError(opencv::Error),
}

impl From<opencv::Error> for CameraError {
    fn from(err: opencv::Error) -> Self {
        CameraError::OpenCvError(err)
    }
}

/// Frame source over an OpenCV capture. The source is either a device index
/// ("0") or a stream URL, opened with the FFMPEG backend.
#[derive(Debug)]
pub struct Camera {
    capture: videoio::VideoCapture,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Result<Self, CameraError> {
        let capture = match config.source.parse::<i32>() {
            Ok(index) => videoio::VideoCapture::new(index, videoio::CAP_ANY)
                .map_err(CameraError::OpenCameraFailed)?,
            Err(_) => videoio::VideoCapture::from_file(&config.source, videoio::CAP_FFMPEG)
                .map_err(CameraError::OpenCameraFailed)?,
        };
        if !capture.is_opened()? {
            return Err(CameraError::SourceUnavailable(config.source.clone()));
        }
        tracing::info!("Opened camera source {}", config.source);
        Ok(Self { capture })
    }

    /// Reads the next frame. `Ok(None)` signals end of stream and must
    /// terminate the driving loop.
    pub fn read_frame(&mut self) -> Result<Option<Mat>, CameraError> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .map_err(CameraError::ReadFrameFailed)?;
        if !ok || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!("Failed to release camera: {:?}", e);
        }
    }
}
