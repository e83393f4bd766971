//! HTTP handlers for gwas-viewer

pub mod buildinfo;
pub mod chat;
pub mod documents;
pub mod health;
pub mod ui;

pub use buildinfo::get_build_info;
pub use chat::{ask_question, chat_models};
pub use documents::{document_analytics, document_pages, document_traits, list_documents};
pub use health::health_routes;
pub use ui::{analytics_page, chat_page, pages_page, raw_page, traits_page};
