pub mod add;
pub mod app;
pub mod chart;
pub mod edit;
pub mod export;
pub mod filter;
pub mod import;
pub mod pdf_report;
pub mod remove;
pub mod summary;
pub mod terminal;
