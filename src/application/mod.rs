// Application layer - use cases over the sample feed and mark store
pub mod chart_service;
pub mod debounce;
pub mod event_loop;
pub mod highlight;
pub mod mark_persister;
pub mod mark_store;
pub mod nearest;
pub mod sensor_repository;
pub mod session;
