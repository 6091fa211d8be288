//! Machine View HTTP Service
//!
//! Serves the live registry to agents that cannot run the site's UI.
//!
//! ## Endpoints
//!
//! - `GET /machine-view.md` - The rendered document as `text/markdown`
//! - `GET /api/machine-view` - The rendered document with metadata as JSON
//! - `GET /api/slices` - Registered slices in emission order
//! - `POST /api/slices` - Publish a service-owned slice (409 if another owner holds the id)
//! - `DELETE /api/slices/:id` - Remove a service-owned slice
//! - `GET /api/mode` / `PUT /api/mode` - Read or set the display mode
//! - `POST /api/mode/toggle` - Flip the display mode
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::metrics_middleware;
pub use routes::create_router;
pub use state::{ServiceError, ServiceState};
