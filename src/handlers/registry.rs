use super::{GithubHandler, SiteHandler, WikipediaHandler};
use crate::HandlerError;
use std::fmt;
use url::Url;

/// Ordered set of site handlers; the first match wins
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn SiteHandler>>,
}

impl HandlerRegistry {
    /// Creates a registry with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in handlers (Wikipedia, then GitHub)
    pub fn with_defaults() -> Self {
        Self {
            handlers: vec![Box::new(WikipediaHandler), Box::new(GithubHandler)],
        }
    }

    /// Appends a handler at the lowest priority
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The handler was added
    /// * `Err(HandlerError::Duplicate)` - A handler with the same name exists
    pub fn register(&mut self, handler: Box<dyn SiteHandler>) -> Result<(), HandlerError> {
        let name = handler.name();
        if self.handlers.iter().any(|h| h.name() == name) {
            return Err(HandlerError::Duplicate(name));
        }
        tracing::debug!("Registered site handler '{}'", name);
        self.handlers.push(handler);
        Ok(())
    }

    /// Returns the first handler that claims the URL
    pub fn resolve(&self, url: &Url) -> Option<&dyn SiteHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.can_handle(url))
            .map(|handler| handler.as_ref())
    }

    /// Handler names in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
