// 3rd party imports
use indicatif::ProgressStyle;
use tracing::{info_span, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Progress bar style. Used when a maximum value is given
///
const PROGRESS_BAR_STYLE: &str = "        {msg} {wide_bar} {pos}/{len} {per_sec} ";

/// Tracing span with a progress bar. The bar is displayed while the span is entered,
/// e.g. by keeping the guard of [`Progress::span`]`.enter()` in the calling thread.
/// Increments may come from any thread.
/// Without an `IndicatifLayer` installed all updates are no-ops.
///
pub struct Progress {
    span: Span,
}

impl Progress {
    /// Creates a new progress bar
    ///
    /// # Arguments
    /// * `title` - Message in front of the bar
    /// * `length` - Number of steps
    ///
    pub fn new(title: &str, length: usize) -> Self {
        let span = info_span!("progress");
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_BAR_STYLE) {
            span.pb_set_style(&style);
        }
        span.pb_set_message(title);
        span.pb_set_length(length as u64);
        span.pb_set_position(0);
        Self { span }
    }

    /// Returns the span of the progress bar
    ///
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Advances the progress bar by one step
    ///
    pub fn inc(&self) {
        self.span.pb_inc(1);
    }
}
