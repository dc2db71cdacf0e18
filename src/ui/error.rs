//! Error responses for the form UI.

use super::page::{Outcome, Tab, render};
use super::PAGE_TITLE;
use crate::Error;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

/// A failed form action: the error and the tab it came from.
#[derive(Debug)]
pub struct UiError {
    /// Tab to render the error in.
    pub tab: Tab,
    /// The store error.
    pub error: Error,
}

impl UiError {
    /// Wraps a store error for `tab`.
    #[must_use]
    pub const fn new(tab: Tab, error: Error) -> Self {
        Self { tab, error }
    }
}

/// Status code for a store error.
#[must_use]
pub const fn status_for_error(error: &Error) -> StatusCode {
    match error {
        Error::InvalidInput(_) | Error::DimensionMismatch { .. } => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::AlreadyExists(_) | Error::Conflict(_) => StatusCode::CONFLICT,
        Error::OperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for UiError {
    fn into_response(self) -> Response {
        let status = status_for_error(&self.error);
        let page = render(PAGE_TITLE, self.tab, &Outcome::Error(self.error.to_string()));
        (status, Html(page)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST ; "invalid input")]
    #[test_case(Error::DimensionMismatch { expected: 4, actual: 3 }, StatusCode::BAD_REQUEST ; "dimension")]
    #[test_case(Error::NotFound("t".into()), StatusCode::NOT_FOUND ; "not found")]
    #[test_case(Error::Conflict("i".into()), StatusCode::CONFLICT ; "conflict")]
    #[test_case(Error::AlreadyExists("d".into()), StatusCode::CONFLICT ; "already exists")]
    #[test_case(Error::operation("insert", "disk full"), StatusCode::INTERNAL_SERVER_ERROR ; "engine failure")]
    fn test_status_for_error(error: Error, expected: StatusCode) {
        assert_eq!(status_for_error(&error), expected);
    }
}
