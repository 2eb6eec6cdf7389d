pub mod audio_sink;
pub mod service_listener;
pub mod source_service;
