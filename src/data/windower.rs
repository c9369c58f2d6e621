// ============================================================
// Layer 4 — Window Generator
// ============================================================
// Slices one normalised series into supervised
// (past window, future window) pairs.
//
// Two parameters control the scan:
//   sampling_rate   keep every n-th point *inside* a window
//   window_stride   distance between consecutive window starts
//
// They default to the same value (6 ten-minute chunks = 1h),
// which trades overlap density for a smaller dataset. They are
// kept as separate knobs so neither silently drives the other.
//
// Example with past_span=4, future_span=2, sampling_rate=2,
// window_stride=2 over a series of 9 points:
//
//   index:   0 1 2 3 4 5 6 7 8
//   offset 0: past=[0,2]  future=[4]
//   offset 2: past=[2,4]  future=[6]
//
// Offsets run over [0, len - past_span - future_span), so the
// last possible start is never used and a series of length
// <= past_span + future_span yields no windows at all.

use crate::domain::error::PipelineError;

// ─── WindowSpec ───────────────────────────────────────────────────────────────
/// Validated window geometry. Construct through `WindowSpec::new`
/// so the divisibility checks run once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    past_span:     usize,
    future_span:   usize,
    sampling_rate: usize,
    window_stride: usize,
}

impl WindowSpec {
    pub fn new(
        past_span:     usize,
        future_span:   usize,
        sampling_rate: usize,
        window_stride: usize,
    ) -> Result<Self, PipelineError> {
        if sampling_rate == 0 {
            return Err(PipelineError::ZeroParameter("sampling_rate"));
        }
        if window_stride == 0 {
            return Err(PipelineError::ZeroParameter("window_stride"));
        }
        if past_span == 0 {
            return Err(PipelineError::ZeroParameter("past_span"));
        }
        if future_span == 0 {
            return Err(PipelineError::ZeroParameter("future_span"));
        }
        if past_span % sampling_rate != 0 {
            return Err(PipelineError::IndivisibleSpan {
                name: "past_span",
                span: past_span,
                sampling_rate,
            });
        }
        if future_span % sampling_rate != 0 {
            return Err(PipelineError::IndivisibleSpan {
                name: "future_span",
                span: future_span,
                sampling_rate,
            });
        }
        Ok(Self { past_span, future_span, sampling_rate, window_stride })
    }

    pub fn past_span(&self) -> usize     { self.past_span }
    pub fn future_span(&self) -> usize   { self.future_span }
    pub fn sampling_rate(&self) -> usize { self.sampling_rate }
    pub fn window_stride(&self) -> usize { self.window_stride }

    /// Points per past window after sub-sampling
    pub fn sequence_length(&self) -> usize {
        self.past_span / self.sampling_rate
    }

    /// Points per future window after sub-sampling
    pub fn future_steps(&self) -> usize {
        self.future_span / self.sampling_rate
    }

    /// Raw points one window covers (past + future)
    pub fn total_span(&self) -> usize {
        self.past_span + self.future_span
    }

    /// Number of windows a series of `len` points produces:
    /// ceil((len - past - future) / stride), or 0.
    pub fn window_count(&self, len: usize) -> usize {
        let usable = len.saturating_sub(self.total_span());
        usable.div_ceil(self.window_stride)
    }
}

// ─── SeriesWindow ─────────────────────────────────────────────────────────────
/// One untagged window. `offset` is the index of the first past
/// point relative to the slice the generator was given.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesWindow {
    pub offset: usize,
    pub past:   Vec<f32>,
    pub future: Vec<f32>,
}

// ─── WindowGenerator ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy)]
pub struct WindowGenerator {
    spec: WindowSpec,
}

impl WindowGenerator {
    pub fn new(spec: WindowSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    /// Lazily iterate the windows of `series` in increasing offset
    /// order. Calling it again restarts from offset 0.
    pub fn generate<'a>(&self, series: &'a [f32]) -> Windows<'a> {
        Windows {
            series,
            spec: self.spec,
            next_offset: 0,
            end: series.len().saturating_sub(self.spec.total_span()),
        }
    }
}

/// Iterator returned by `WindowGenerator::generate`
pub struct Windows<'a> {
    series:      &'a [f32],
    spec:        WindowSpec,
    next_offset: usize,
    /// Exclusive upper bound on start offsets
    end:         usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = SeriesWindow;

    fn next(&mut self) -> Option<SeriesWindow> {
        if self.next_offset >= self.end {
            return None;
        }
        let i    = self.next_offset;
        let step = self.spec.sampling_rate;
        let mid  = i + self.spec.past_span;
        let stop = mid + self.spec.future_span;

        let past   = self.series[i..mid].iter().step_by(step).copied().collect();
        let future = self.series[mid..stop].iter().step_by(step).copied().collect();

        self.next_offset += self.spec.window_stride;
        Some(SeriesWindow { offset: i, past, future })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end.saturating_sub(self.next_offset).div_ceil(self.spec.window_stride);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Windows<'_> {}
