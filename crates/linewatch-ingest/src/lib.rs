#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused)]

//! Message-queue side of the monitor: buffering, MQTT consumption and mock data.
//!
//! Layout: `buffer.rs` (bounded `MessageBuffer`, a `BatchSource`),
//! `consumer.rs` (MQTT subscriber), `decode.rs` (payload decoding),
//! `mock.rs` (mock directory loader), `publisher.rs` (mock publisher).

pub mod buffer;
pub mod consumer;
pub mod decode;
pub mod error;
pub mod mock;
pub mod publisher;

pub use buffer::MessageBuffer;
pub use consumer::{ConsumerDeps, RECONNECT_BACKOFF, mqtt_options, spawn_consumer};
pub use decode::decode_payload;
pub use error::{IngestError, IngestResult};
pub use mock::{load_mock_dir, load_mock_dir_or_log, mock_files};
pub use publisher::publish_dir;
