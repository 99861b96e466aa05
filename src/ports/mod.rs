pub mod content_store_port;
pub mod embedding_port;
pub mod image_generation_port;
