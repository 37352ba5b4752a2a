// Conflict Resolver
//
// Stateless dispatch over the conflict taxonomy. Collaborators are reached
// through the ports in `ports`.

pub mod dispatch;
pub mod ports;
pub mod suggestions;

pub use dispatch::ConflictResolver;
pub use ports::{DesignAuthority, MergeHandler};
pub use suggestions::default_suggestions;
