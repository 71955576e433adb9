use axum::http::Method;

use crate::controller::Action;

/// One conventional route: action, HTTP verb and the path suffix appended to
/// the controller's mount route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTableEntry {
    pub name: Action,
    pub verb: Method,
    pub suffix: String,
}

/// The five CRUD routes for `resource`, in canonical order.
///
/// | action  | verb   | suffix            |
/// |---------|--------|-------------------|
/// | index   | GET    | `/`               |
/// | create  | POST   | `/`               |
/// | show    | GET    | `/:<resource>Id`  |
/// | update  | PUT    | `/:<resource>Id`  |
/// | destroy | DELETE | `/:<resource>Id`  |
pub fn routing_table(resource: &str) -> Vec<RoutingTableEntry> {
    let member = format!("/:{resource}Id");
    let entry = |name, verb, suffix: &str| RoutingTableEntry {
        name,
        verb,
        suffix: suffix.to_string(),
    };

    vec![
        entry(Action::Index, Method::GET, "/"),
        entry(Action::Create, Method::POST, "/"),
        entry(Action::Show, Method::GET, &member),
        entry(Action::Update, Method::PUT, &member),
        entry(Action::Destroy, Method::DELETE, &member),
    ]
}
