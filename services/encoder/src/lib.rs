//! # RDS Encoder Service
//!
//! ## Architecture
//!
//! ```text
//! TrackSource → run_consumer → TrackPipeline → DeviceLink → SmartGen Mini
//!  (stdin,        (ack every     (sanitize,      (TCP, auto
//!   unix, tcp)     delivery)      TEXT, RT+TAG)   reconnect)
//! ```
//!
//! Each delivery is processed to completion before the next is read. Failed
//! deliveries are logged and acknowledged; nothing is redelivered.

pub mod consumer;
pub mod error;
pub mod event;
pub mod input;
pub mod pipeline;
pub mod sanitize;

pub use consumer::{run_consumer, ConsumerSummary};
pub use error::{FilterError, PipelineError, SourceError};
pub use event::TrackEvent;
pub use input::{Delivery, LineSource, SourceEndpoint, TrackSource};
pub use pipeline::{CommandSink, Delivered, TrackPipeline};
pub use sanitize::{ProfanityFilter, Sanitizer};
