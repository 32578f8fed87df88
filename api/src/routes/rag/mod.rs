pub mod rag_request;
pub mod rag_route;
