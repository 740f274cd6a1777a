//! HTTP clients for the external services
//!
//! - **suggestion_client** - generative POI suggestions
//! - **places_client** - per-POI place enrichment (rate limited)
//! - **route_client** - route optimization

pub mod places_client;
pub mod route_client;
pub mod suggestion_client;

pub use places_client::PlacesClient;
pub use route_client::RouteClient;
pub use suggestion_client::SuggestionClient;
