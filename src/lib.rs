// Air-quality monitor chart core and hosting service
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
