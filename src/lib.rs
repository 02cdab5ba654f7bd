//! Maestro - Automated Album Production Pipeline
//!
//! Maestro turns a producer blueprint and a topic into a mastered album:
//! a language model plans the tracklist and drafts lyrics, a generative
//! audio model renders each track, and a post-production pass aggregates
//! everything into a distribution-ready release with provenance records.
//!
//! # Architecture
//!
//! The pipeline is a single cooperative sequence per album:
//! - Planner: one chat call producing the ordered tracklist
//! - TrackProducer: per-track drafting, tagging, rendering, persisting
//! - ResourceArbiter: exclusive GPU occupancy between the two models
//! - PostProcessor: mastering, distribution layout, album analytics
//!
//! The chat service and the audio model are consumed through the
//! `ChatService` and `AudioModel` traits; HTTP clients and a test mock
//! implement them.

pub mod arbiter;
pub mod audio;
pub mod blueprint;
pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod naming;
pub mod pipeline;
pub mod planner;
pub mod postprocess;
pub mod producer;
pub mod synth;
pub mod tags;

pub use error::{MaestroError, Result};
