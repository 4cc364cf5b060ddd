pub mod batch;
pub mod certificate;
pub mod merkle;
