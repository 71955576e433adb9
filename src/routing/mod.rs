//! Route generation: the conventional CRUD table, path templates, the bound
//! route table and its axum rendition.

mod builder;
mod http;
mod table;
mod template;

pub use builder::{BoundRoute, ParamHook, RouteTable, build_routes, route_acl};
pub(crate) use http::axum_router;
pub use http::BODY_LIMIT;
pub use table::{RoutingTableEntry, routing_table};
pub use template::{PathTemplate, Segment};
