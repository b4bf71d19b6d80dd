/// Progress bars attached to tracing spans
pub mod progress;
