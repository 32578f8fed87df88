pub mod extract;
pub mod knowledge_request;
pub mod text_route;
pub mod upload_route;
