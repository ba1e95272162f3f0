/// Classification for retry policy.
///
/// Providers never retry on their own. Drivers (the scheduler, an agent tool
/// wrapper) read this classification to decide whether a failed lookup is
/// worth attempting again.
///
/// | Class | Retry? |
/// |-------|--------|
/// | `Never` | No, the request is invalid or the data does not exist |
/// | `WithBackoff` | Yes, after a delay |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Bad symbol, missing data, validation error.
    Never,

    /// Transient failure such as rate limiting (429), a timeout or a
    /// connection error.
    WithBackoff,
}
