#[cfg(feature = "gif")]
pub mod gif;
