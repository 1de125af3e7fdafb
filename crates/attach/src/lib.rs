#![allow(dead_code)]

pub mod api;
pub mod controller;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod policy;
pub mod ports;
pub mod registry;
pub mod scanner;
pub mod watcher;

pub use api::{ResourceFactory, ResourceInstance};
pub use controller::{AttachConfig, AttachController};
pub use errors::AttachError;
pub use policy::AttachPolicy;
pub use ports::{
    ChangeSource, ChangeSubscription, DocumentChanges, FrameScheduler, QueueScheduler,
};
pub use registry::InstanceRegistry;
pub use scanner::ScanOutcome;
