mod cookie;
mod error;
mod handlers;
mod middleware;
mod routes;

pub use cookie::{removal_cookie, session_cookie};
pub use error::AppError;
pub use middleware::{AuthenticatedSession, CurrentSession};
pub use routes::{AppState, organizer_routes, private_routes, public_routes};
