use crate::core::event::GddoEvent;

/// EventSink is the port receiving one telemetry event per handled request.
///
/// Emission must not block the request path. Delivery guarantees (buffering,
/// retries, persistence) belong to the implementation.
pub trait EventSink: Send + Sync + 'static {
    /// Hand over a finished event
    fn emit(&self, event: GddoEvent);
}
