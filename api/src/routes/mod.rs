pub mod chat;
pub mod health_route;
pub mod knowledge;
pub mod rag;
