//! Translation engine
//!
//! This crate holds the callback core and the reference dispatcher:
//! - Call Context: XfmrParams, built per invocation
//! - Callback kinds: the closed Xfmr sum type and its capability tags
//! - Registry: callbacks keyed by (template path, kind), node annotations
//! - Subscription and value transformer in/out types
//! - Dispatcher: write, read, subscription and action paths
//! - Config: `xfmr.toml`
//!
//! The engine is the only component that invokes callbacks. Callbacks see
//! partitions only through the handles in their Call Context.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callbacks;
pub mod cascade;
pub mod config;
pub mod dispatcher;
pub mod params;
pub mod registry;
pub mod subscribe;
pub mod value_xfmr;

pub use callbacks::{Direction, ValueXfmr, Xfmr, XfmrKind};
pub use cascade::{CascadeDelete, CascadeDeleteSet};
pub use config::{ReadPolicy, XfmrConfig, CONFIG_FILE_NAME};
pub use dispatcher::{
    ApplyStats, Dispatcher, NodeStatus, ProcessOutcome, ReadResult, SubscribeFailure,
    SubscriptionSession, WatchEntry, WriteTranslation,
};
pub use params::{XfmrOutputs, XfmrParams, XfmrParamsBuilder, YgRoot};
pub use registry::{NodeAnnotation, XfmrRegistry};
pub use subscribe::{NotificationOpts, XfmrSubscInParams, XfmrSubscOutParams};
pub use value_xfmr::{EnumValueXfmr, XfmrDbParams};
