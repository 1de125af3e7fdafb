//! Caller-facing contracts.
//!
//! The controller never interprets a resource beyond invoking its
//! teardown; everything else about the instance is the factory's
//! business.

use serde_json::Value;
use veneer_dom::Element;

use crate::errors::AttachError;

/// An enhancement resource attached to one element. Exactly one instance
/// exists per connected matching element.
pub trait ResourceInstance: Send {
    fn teardown(&mut self) -> Result<(), AttachError>;
}

/// Turns a matched element into a resource instance. `options` is the
/// opaque configuration from [`crate::AttachConfig`], forwarded verbatim.
pub trait ResourceFactory: Send + Sync {
    fn create_instance(
        &self,
        element: &Element,
        options: &Value,
    ) -> Result<Box<dyn ResourceInstance>, AttachError>;
}
