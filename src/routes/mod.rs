/// Router Module Index
///
/// Splits the routing table by audience. Both routers sit behind the same access
/// gate; the split documents intent and keeps the route table and the router in
/// step. Anything mounted in `public` must also be listed as public in
/// `gate::ROUTE_RULES`, or the gate will demand a session for it.

/// Routes reachable without a session: health, sign-in and the access-denied page.
pub mod public;

/// Routes that need a session, and usually a permission from the route table.
pub mod api;
