mod health;
mod history;
mod ns;
mod repl;

pub use health::health_routes;
pub use history::history_routes;
pub use ns::ns_routes;
pub use repl::repl_routes;
