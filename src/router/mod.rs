// src/router/mod.rs
mod context;
mod events;
mod router;

pub use context::{Reply, RequestContext};
pub use events::{EventSink, RouterEvent, TracingEvents};
pub use router::{render_outcome, RequestRouter};

#[cfg(test)]
pub(crate) use events::RecordingEvents;
