//! External-interface seams.
//!
//! The containers in this library are consumed by thin collaborators whose
//! wire behavior is not load-bearing: an S3-compatible object store and a
//! subject/queue messaging broker. Only their contracts live here, as
//! async traits with serde DTOs; concrete clients are supplied by the
//! host application and mocked in tests.

pub mod messaging;
pub mod object_store;

pub use messaging::{HandleOutcome, KvBucket, Message, MessageHandler, Messaging};
pub use object_store::{object_path, ByteStream, ObjectMeta, ObjectStore};
