pub mod dashscope_embedding_repository;
pub mod dashscope_image_repository;
pub mod in_memory_content_repository;
