use thiserror::Error;

/// Errors raised before layout begins.
///
/// Layout itself never fails on record content; only caller-supplied geometry
/// and font data are rejected.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid page geometry: {reason}")]
    InvalidGeometry { reason: String },
    #[error("font error: {0}")]
    Font(String),
}

impl LayoutError {
    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }
}

/// Why a string could not be shaped for right-to-left display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("text spans more than one paragraph")]
    MultipleParagraphs,
    #[error("text already contains presentation-form glyphs at byte {0}")]
    AlreadyShaped(usize),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
