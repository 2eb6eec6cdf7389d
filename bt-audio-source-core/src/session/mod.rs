pub mod audio_source;
pub mod service_handle;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;
