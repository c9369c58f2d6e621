use thiserror::Error;

/// Failures raised by the windowing / dataset pipeline.
/// These are preconditions the caller can act on, so they
/// are typed rather than folded into an `anyhow::Error`.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("entity '{0}' has no observations; cannot fit a scaler on an empty series")]
    EmptySeries(String),

    #[error("no observations were loaded")]
    NoObservations,

    #[error("{name} ({span}) is not divisible by sampling_rate ({sampling_rate})")]
    IndivisibleSpan {
        name:          &'static str,
        span:          usize,
        sampling_rate: usize,
    },

    #[error("{0} must be greater than zero")]
    ZeroParameter(&'static str),

    #[error("split fraction {0} must lie in [0, 1]")]
    InvalidSplitFraction(f64),

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("saved model was trained on entities {saved:?}, current data has {current:?}")]
    EntityOrderMismatch {
        saved:   Vec<String>,
        current: Vec<String>,
    },

    #[error("identity vector width mismatch: expected {expected}, found {found}")]
    IdentityWidthMismatch { expected: usize, found: usize },

    #[error("{name} width mismatch: expected {expected}, found {found}")]
    WidthMismatch {
        name:     &'static str,
        expected: usize,
        found:    usize,
    },

    #[error("arrays disagree on row count: {past} past, {identity} identity, {future} future")]
    RowCountMismatch {
        past:     usize,
        identity: usize,
        future:   usize,
    },

    #[error("the {0} set produced no windows; need a longer series or shorter spans")]
    EmptyDataset(&'static str),

    #[error("entity '{name}' has {available} points but a past window needs {needed}")]
    SeriesTooShort {
        name:      String,
        available: usize,
        needed:    usize,
    },
}
