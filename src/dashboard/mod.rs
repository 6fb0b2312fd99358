//! The dashboard listing every student's savings, with a summary of the totals.

mod handlers;
mod summary;

pub use handlers::get_dashboard_page;
