pub mod activity_service;
pub mod analytics_service;
pub mod auth;
pub mod dashboard_service;
pub mod document_service;
pub mod pipeline_service;
pub mod project_service;
pub mod supplier_service;
