pub mod gcs;
pub mod line;
pub mod slack;
