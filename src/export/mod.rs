//! Model export and serialization
//!
//! The fitted classifier is persisted together with the fitted numeric
//! transform and the training column layout, so a later scoring run can
//! reproduce preprocessing exactly.

mod serializer;

pub use serializer::{write_report, ModelArtifact};
