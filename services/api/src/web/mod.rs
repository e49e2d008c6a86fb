pub mod auth;
pub mod blog;
pub mod library;
pub mod middleware;
pub mod notes;
pub mod protocol;
pub mod quickref;
pub mod rest;
pub mod state;
pub mod tickets;
pub mod viewer;

// Re-export the pieces the server binary wires into the router.
pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use viewer::viewer_ws_handler;
