//! Service/Controller component generation.

pub mod component;
pub mod handlers;
pub mod mover;

pub use component::{find_class, find_or_create_component, ComponentHandle, MethodInsertion};
pub use handlers::{discover_handlers, HandlerFunction, HandlerParam};
pub use mover::{generate_controller, generate_service, MoveOutcome};
