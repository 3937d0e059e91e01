// Infrastructure layer - codecs, configuration and repository adapters
pub mod config;
pub mod csv_export;
pub mod file_repository;
pub mod http_repository;
pub mod http_response;
pub mod mark_codec;
pub mod sample_codec;
