use std::fmt;

/// Logger bound to one invocation.
///
/// `InvocationLog` is obtained from [`Ctx::log`](crate::Ctx::log). Every
/// event it emits carries the invocation's `request_id` and `function`.
#[derive(Debug)]
pub struct InvocationLog<'a> {
    request_id: &'a str,
    function: &'static str,
}

impl<'a> InvocationLog<'a> {
    pub(crate) fn new(request_id: &'a str, function: &'static str) -> Self {
        Self {
            request_id,
            function,
        }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Returns the function name associated with this logger.
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// Logs an info-level message.
    ///
    /// ```no_run
    /// # fn example(log: &ownership_guard::InvocationLog) {
    /// log.info(format_args!("claim {} updated", 99));
    /// # }
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, function = self.function, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, function = self.function, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, function = self.function, "{}", args);
    }
}
