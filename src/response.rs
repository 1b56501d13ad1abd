use serde::Serialize;

use crate::error::Denial;

/// The only value returned to the calling model.
///
/// Fields are private so that the two constructors are the only way in:
/// a successful response always carries data and no error message, a
/// failed one always carries an error message and no data.
///
/// # Examples
///
/// ```
/// use ownership_guard::Response;
///
/// let ok = Response::ok(42);
/// assert!(ok.is_success());
/// assert_eq!(ok.data(), Some(&42));
/// assert!(ok.error_message().is_none());
///
/// let failed: Response<i32> = Response::failure("User is not authenticated");
/// assert!(!failed.is_success());
/// assert!(failed.data().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    success: bool,
    data: Option<T>,
    error_message: Option<String>,
}

impl<T> Response<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_message: None,
        }
    }

    /// A failed response carrying a user-presentable message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(message.into()),
        }
    }

    /// A failed response for a denied invocation.
    pub fn from_denial(denial: &Denial) -> Self {
        Self::failure(denial.user_message())
    }

    /// Returns whether the invocation succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the payload of a successful response.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Returns the message of a failed response.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Transforms the payload, keeping failures as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            success: self.success,
            data: self.data.map(f),
            error_message: self.error_message,
        }
    }

    /// Converts into a `Result` of payload or error message.
    pub fn into_result(self) -> Result<T, String> {
        match (self.data, self.error_message) {
            (Some(data), None) => Ok(data),
            (_, Some(message)) => Err(message),
            // Unreachable through the constructors.
            (None, None) => Err(String::new()),
        }
    }
}
