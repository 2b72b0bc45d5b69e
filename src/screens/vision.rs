//! Vision inspection
//!
//! A [`FrameSource`] stands in for the camera. [`VisionSession`] owns an
//! open source and stops it when dropped, so every exit path from the
//! vision view releases the device. Captured frames are re-encoded as JPEG
//! and sent inline with the inspection prompt.

use crate::domain::Project;
use crate::error::{MentorError, Result};
use crate::prompts::task_prompts;
use crate::providers::{ModelRequest, Provider};
use crate::screens::{lock, or_fallback, request_text, RequestGate, Submission};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const CAMERA_FAILURE: &str =
    "Unable to access camera. Please ensure you have granted permissions.";
pub const ANALYSIS_FAILURE: &str = "Failed to analyze the frame. Please try again.";
pub const NO_ANALYSIS: &str = "Unable to analyze frame.";

/// JPEG quality used for inline frames
pub const JPEG_QUALITY: u8 = 80;

/// One captured still
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: DynamicImage,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Base64 JPEG payload for an inline image part
    pub fn to_jpeg_base64(&self) -> Result<String> {
        encode_jpeg(&self.image)
    }
}

/// Something that produces frames: a camera, or a file standing in for one
pub trait FrameSource: Send {
    /// Acquire the device
    fn start(&mut self) -> Result<()>;

    /// Grab the current frame
    fn capture(&mut self) -> Result<Frame>;

    /// Release the device; must be safe to call more than once
    fn stop(&mut self);
}

/// Frames read from an image file on disk
#[derive(Debug)]
pub struct StillImageSource {
    path: PathBuf,
    image: Option<DynamicImage>,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            image: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_started(&self) -> bool {
        self.image.is_some()
    }
}

impl FrameSource for StillImageSource {
    fn start(&mut self) -> Result<()> {
        let image = image::open(&self.path).map_err(|e| {
            tracing::error!("Error accessing camera {}: {}", self.path.display(), e);
            MentorError::Camera(format!("{} ({})", CAMERA_FAILURE, e))
        })?;
        tracing::info!(
            "Camera started from {} ({}x{})",
            self.path.display(),
            image.width(),
            image.height()
        );
        self.image = Some(image);
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame> {
        let image = self
            .image
            .clone()
            .ok_or_else(|| MentorError::Camera("Camera is not started".to_string()))?;
        Ok(Frame { image })
    }

    fn stop(&mut self) {
        if self.image.take().is_some() {
            tracing::info!("Camera stopped");
        }
    }
}

/// An open frame source, stopped when the session is dropped
pub struct VisionSession<S: FrameSource> {
    source: S,
}

impl<S: FrameSource> VisionSession<S> {
    pub fn open(mut source: S) -> Result<Self> {
        source.start()?;
        Ok(Self { source })
    }

    pub fn capture(&mut self) -> Result<Frame> {
        self.source.capture()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> Drop for VisionSession<S> {
    fn drop(&mut self) {
        self.source.stop();
    }
}

/// Re-encode an image as base64 JPEG
pub fn encode_jpeg(image: &DynamicImage) -> Result<String> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(STANDARD.encode(&bytes))
}

/// Frame inspection by the vision persona
pub struct VisionMentor {
    provider: Arc<dyn Provider>,
    analysis: Mutex<Option<String>>,
    gate: RequestGate,
}

impl VisionMentor {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            analysis: Mutex::new(None),
            gate: RequestGate::new(),
        }
    }

    pub fn analysis(&self) -> Option<String> {
        self.analysis.lock().ok()?.clone()
    }

    pub fn clear(&self) -> Result<()> {
        *lock(&self.analysis)? = None;
        Ok(())
    }

    /// Capture a frame from the session and inspect it
    pub async fn inspect<S: FrameSource>(
        &self,
        session: &mut VisionSession<S>,
        project: Option<&Project>,
    ) -> Result<Submission<String>> {
        let frame = match session.capture() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Frame capture failed: {}", e);
                return Ok(Submission::Completed(CAMERA_FAILURE.to_string()));
            }
        };
        self.analyze_frame(&frame, project).await
    }

    /// Inspect one frame in the context of the selected project
    pub async fn analyze_frame(
        &self,
        frame: &Frame,
        project: Option<&Project>,
    ) -> Result<Submission<String>> {
        let Some(_guard) = self.gate.try_acquire() else {
            return Ok(Submission::Ignored);
        };
        *lock(&self.analysis)? = None;

        let analysis = match self.request(frame, project).await {
            Ok(text) => or_fallback(text, NO_ANALYSIS),
            Err(e) => {
                tracing::error!("Vision analysis failed: {}", e);
                ANALYSIS_FAILURE.to_string()
            }
        };

        *lock(&self.analysis)? = Some(analysis.clone());
        Ok(Submission::Completed(analysis))
    }

    async fn request(&self, frame: &Frame, project: Option<&Project>) -> Result<String> {
        let data = frame.to_jpeg_base64()?;
        let context = task_prompts::vision_context(project);
        let request = ModelRequest::prompt(task_prompts::vision_inspection(&context))
            .with_image("image/jpeg", data);
        request_text(self.provider.as_ref(), &request, "vision").await
    }
}
