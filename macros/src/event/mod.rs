pub mod derive_event;
pub mod event_handler;
