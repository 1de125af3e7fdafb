#![allow(dead_code)]

pub mod errors;
pub mod model;
pub mod mutation;
pub mod scheduler;
pub mod selector;

pub use errors::DomError;
pub use model::{Document, Element, Node};
pub use mutation::{
    MutationCallback, MutationKind, MutationObserverHandle, MutationRecord, ObserveOptions,
};
pub use scheduler::{FrameFn, FrameQueue, FrameToken};
pub use selector::Selector;
