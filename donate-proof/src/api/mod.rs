//! HTTP API handlers for donate-proof

pub mod buildinfo;
pub mod context;
pub mod health;
pub mod proof;
pub mod sse;
pub mod ws;

pub use buildinfo::get_build_info;
pub use context::{OrganizationId, ORGANIZATION_HEADER};
pub use health::health_routes;
pub use proof::{create_session, upload_proof};
pub use sse::proof_event_stream;
pub use ws::proof_websocket;
