pub mod config;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod page_screen;
pub mod report;
pub mod table;
pub mod transform;
