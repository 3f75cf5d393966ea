//! Visual diff analysis over the actual/expected/diff PNG triple written by the comparison
//! fixture.
//!
//! Loading and shape checks can fail; callers that must not abort (single-test analysis,
//! batch triage) use [`analyze_diff_files`], which folds failures into a serializable
//! [`AnalysisError`].

use image::RgbaImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use svgtriage_core::DiffThresholds;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image dimensions differ: actual {actual:?}, expected {expected:?}, diff {diff:?}")]
    ShapeMismatch {
        actual: (u32, u32),
        expected: (u32, u32),
        diff: (u32, u32),
    },
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    Io,
    Decode,
    ShapeMismatch,
    MissingInput,
}

/// A failed analysis, reported in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub message: String,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&RasterError> for AnalysisError {
    fn from(err: &RasterError) -> Self {
        let kind = match err {
            RasterError::Read { .. } => AnalysisErrorKind::Io,
            RasterError::Decode { .. } => AnalysisErrorKind::Decode,
            RasterError::ShapeMismatch { .. } => AnalysisErrorKind::ShapeMismatch,
        };
        Self::new(kind, err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub row_min: u32,
    pub row_max: u32,
    pub col_min: u32,
    pub col_max: u32,
}

impl BoundingBox {
    fn point(row: u32, col: u32) -> Self {
        Self {
            row_min: row,
            row_max: row,
            col_min: col,
            col_max: col,
        }
    }

    fn include(&mut self, row: u32, col: u32) {
        self.row_min = self.row_min.min(row);
        self.row_max = self.row_max.max(row);
        self.col_min = self.col_min.min(col);
        self.col_max = self.col_max.max(col);
    }

    /// Area in pixels, bounds inclusive.
    pub fn area(&self) -> u64 {
        u64::from(self.row_max - self.row_min + 1) * u64::from(self.col_max - self.col_min + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceType {
    AntiAliasing,
    Positioning,
    MissingElement,
    Styling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffAnalysis {
    pub diff_pixel_count: u64,
    pub total_pixel_count: u64,
    pub diff_ratio: f64,
    pub bounding_box: Option<BoundingBox>,
    pub is_uniform_offset: bool,
    pub difference_type: DifferenceType,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiffOutcome {
    Analyzed(DiffAnalysis),
    Failed(AnalysisError),
}

impl DiffOutcome {
    pub fn analysis(&self) -> Option<&DiffAnalysis> {
        match self {
            DiffOutcome::Analyzed(a) => Some(a),
            DiffOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffInputs {
    pub actual: PathBuf,
    pub expected: PathBuf,
    pub diff: PathBuf,
}

pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|source| RasterError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| RasterError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgba8())
}

/// Classifies a diff raster. A pixel differs when any color channel is nonzero; alpha is
/// ignored.
pub fn analyze_diff_image(diff: &RgbaImage, thresholds: &DiffThresholds) -> DiffAnalysis {
    let (width, height) = diff.dimensions();
    let total_pixel_count = u64::from(width) * u64::from(height);

    let mut diff_pixel_count: u64 = 0;
    let mut bounding_box: Option<BoundingBox> = None;
    for (col, row, pixel) in diff.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        if r == 0 && g == 0 && b == 0 {
            continue;
        }
        diff_pixel_count += 1;
        match bounding_box.as_mut() {
            Some(bbox) => bbox.include(row, col),
            None => bounding_box = Some(BoundingBox::point(row, col)),
        }
    }

    let diff_ratio = if total_pixel_count == 0 {
        0.0
    } else {
        diff_pixel_count as f64 / total_pixel_count as f64
    };

    // Dense coverage of the bounding box means one displaced region rather than scattered
    // edge noise.
    let is_uniform_offset = diff_pixel_count > thresholds.uniform_offset_min_pixels
        && bounding_box.is_some_and(|bbox| {
            diff_pixel_count as f64 / bbox.area() as f64 > thresholds.uniform_offset_density
        });

    let (difference_type, confidence) = if diff_pixel_count < thresholds.anti_aliasing_below {
        (DifferenceType::AntiAliasing, Confidence::High)
    } else if is_uniform_offset {
        (DifferenceType::Positioning, Confidence::High)
    } else if diff_pixel_count as f64 > thresholds.missing_element_ratio * total_pixel_count as f64
    {
        (DifferenceType::MissingElement, Confidence::Medium)
    } else {
        (DifferenceType::Styling, Confidence::Medium)
    };

    DiffAnalysis {
        diff_pixel_count,
        total_pixel_count,
        diff_ratio,
        bounding_box,
        is_uniform_offset,
        difference_type,
        confidence,
    }
}

/// Checks that the three rasters share one shape, then classifies the diff.
pub fn analyze_rasters(
    actual: &RgbaImage,
    expected: &RgbaImage,
    diff: &RgbaImage,
    thresholds: &DiffThresholds,
) -> Result<DiffAnalysis> {
    let shapes = (actual.dimensions(), expected.dimensions(), diff.dimensions());
    if shapes.0 != shapes.1 || shapes.0 != shapes.2 {
        return Err(RasterError::ShapeMismatch {
            actual: shapes.0,
            expected: shapes.1,
            diff: shapes.2,
        });
    }
    Ok(analyze_diff_image(diff, thresholds))
}

fn try_analyze_files(inputs: &DiffInputs, thresholds: &DiffThresholds) -> Result<DiffAnalysis> {
    let actual = load_image(&inputs.actual)?;
    let expected = load_image(&inputs.expected)?;
    let diff = load_image(&inputs.diff)?;
    analyze_rasters(&actual, &expected, &diff, thresholds)
}

pub fn analyze_diff_files(inputs: &DiffInputs, thresholds: &DiffThresholds) -> DiffOutcome {
    match try_analyze_files(inputs, thresholds) {
        Ok(analysis) => DiffOutcome::Analyzed(analysis),
        Err(err) => {
            tracing::debug!(error = %err, diff = %inputs.diff.display(), "diff analysis failed");
            DiffOutcome::Failed(AnalysisError::from(&err))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Actual,
    Expected,
    Diff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    Loaded { width: u32, height: u32 },
    Failed { error: AnalysisError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    pub role: ImageRole,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: ImageOutcome,
}

pub fn inspect_image(role: ImageRole, path: &Path) -> ImageEntry {
    let outcome = match load_image(path) {
        Ok(img) => ImageOutcome::Loaded {
            width: img.width(),
            height: img.height(),
        },
        Err(err) => ImageOutcome::Failed {
            error: AnalysisError::from(&err),
        },
    };
    ImageEntry {
        role,
        path: path.to_path_buf(),
        outcome,
    }
}
