//! Person detector capability.
//!
//! The pipeline only needs axis-aligned person boxes with a confidence.
//! Backends:
//! - **OpenCV HOG** (`opencv` feature): classic pedestrian detector, deterministic
//! - Anything else implementing [`PersonDetector`] (mocks in tests)
//!
//! Without a backend, [`default_person_detector`] fails fast rather than
//! producing empty detections.

use image::RgbImage;
use runstab_models::BoundingBox;

use crate::error::{MediaError, MediaResult};

#[cfg(feature = "opencv")]
use opencv::{
    core::{Mat, Rect, Size, Vector},
    imgproc,
    objdetect::HOGDescriptor,
    prelude::*,
};

/// A person box in the coordinates of the image passed to the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonBox {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl PersonBox {
    /// Create a new person box.
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// Detects people in a single image.
///
/// Implementations must be deterministic for a given image.
pub trait PersonDetector: Send {
    /// Short backend name for logging.
    fn name(&self) -> &str;

    /// Detect people in `image`.
    fn detect(&mut self, image: &RgbImage) -> MediaResult<Vec<PersonBox>>;
}

/// OpenCV HOG + linear SVM pedestrian detector.
#[cfg(feature = "opencv")]
pub struct HogPersonDetector {
    hog: HOGDescriptor,
    win_stride: Size,
    padding: Size,
    scale: f64,
    group_threshold: f64,
}

#[cfg(feature = "opencv")]
impl HogPersonDetector {
    /// Load the default people SVM.
    pub fn new() -> MediaResult<Self> {
        let mut hog = HOGDescriptor::default().map_err(|e| {
            MediaError::detector_unavailable(format!("Failed to create HOG descriptor: {}", e))
        })?;
        let svm = HOGDescriptor::get_default_people_detector().map_err(|e| {
            MediaError::detector_unavailable(format!("Failed to load people SVM: {}", e))
        })?;
        hog.set_svm_detector(&svm).map_err(|e| {
            MediaError::detector_unavailable(format!("Failed to set people SVM: {}", e))
        })?;

        Ok(Self {
            hog,
            win_stride: Size::new(8, 8),
            padding: Size::new(4, 4),
            scale: 1.05,
            group_threshold: 2.0,
        })
    }

    fn to_bgr_mat(image: &RgbImage) -> opencv::Result<Mat> {
        let flat = Mat::from_slice(image.as_raw())?;
        let rgb = flat.reshape(3, image.height() as i32)?.try_clone()?;
        let mut bgr = Mat::default();
        imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)?;
        Ok(bgr)
    }
}

#[cfg(feature = "opencv")]
impl PersonDetector for HogPersonDetector {
    fn name(&self) -> &str {
        "opencv-hog"
    }

    fn detect(&mut self, image: &RgbImage) -> MediaResult<Vec<PersonBox>> {
        // HOG window is 64x128
        if image.width() < 64 || image.height() < 128 {
            return Ok(Vec::new());
        }

        let mat = Self::to_bgr_mat(image)
            .map_err(|e| MediaError::detection_failed(format!("Frame conversion failed: {}", e)))?;

        let mut rects: Vector<Rect> = Vector::new();
        let mut weights: Vector<f64> = Vector::new();
        self.hog
            .detect_multi_scale_weights(
                &mat,
                &mut rects,
                &mut weights,
                0.0,
                self.win_stride,
                self.padding,
                self.scale,
                self.group_threshold,
                false,
            )
            .map_err(|e| MediaError::detection_failed(format!("HOG detection failed: {}", e)))?;

        Ok(rects
            .iter()
            .zip(weights.iter())
            .map(|(r, w)| {
                PersonBox::new(
                    BoundingBox::new(r.x as f64, r.y as f64, r.width as f64, r.height as f64),
                    w,
                )
            })
            .collect())
    }
}

/// Construct the best available detector.
#[cfg(feature = "opencv")]
pub fn default_person_detector() -> MediaResult<Box<dyn PersonDetector>> {
    Ok(Box::new(HogPersonDetector::new()?))
}

/// Construct the best available detector.
#[cfg(not(feature = "opencv"))]
pub fn default_person_detector() -> MediaResult<Box<dyn PersonDetector>> {
    Err(MediaError::detector_unavailable(
        "built without the `opencv` feature; rebuild with --features opencv or use manual anchors",
    ))
}
