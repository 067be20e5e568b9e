pub mod activities;
pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod pipeline;
pub mod projects;
pub mod suppliers;
