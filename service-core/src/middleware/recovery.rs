use std::any::Any;

use axum::response::{IntoResponse, Response};
use metrics::counter;

use crate::error::AppError;

/// Response for a handler panic, used with `CatchPanicLayer::custom`.
///
/// The panic payload is logged and never returned to the caller.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    tracing::error!(panic = %message, "Request handler panicked");
    counter!("http_handler_panics_total").increment(1);

    AppError::InternalError(anyhow::anyhow!("handler panicked")).into_response()
}
