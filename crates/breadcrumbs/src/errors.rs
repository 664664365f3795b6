use thiserror::Error;

use webstate_core_types::CoreError;

#[derive(Clone, Debug, Error)]
pub enum BreadcrumbErrorKind {
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    #[error("store io failed: {0}")]
    Io(String),
}

#[derive(Clone, Debug, Error)]
#[error(transparent)]
pub struct BreadcrumbError(pub BreadcrumbErrorKind);

impl BreadcrumbError {
    pub fn new(kind: BreadcrumbErrorKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &BreadcrumbErrorKind {
        &self.0
    }
}

pub type BreadcrumbResult<T> = Result<T, BreadcrumbError>;

impl From<BreadcrumbError> for CoreError {
    fn from(value: BreadcrumbError) -> Self {
        CoreError::new(value.to_string())
    }
}

impl From<BreadcrumbErrorKind> for BreadcrumbError {
    fn from(kind: BreadcrumbErrorKind) -> Self {
        BreadcrumbError(kind)
    }
}

impl From<std::io::Error> for BreadcrumbError {
    fn from(err: std::io::Error) -> Self {
        BreadcrumbError(BreadcrumbErrorKind::Io(err.to_string()))
    }
}
