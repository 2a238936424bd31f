//! Write paths shared by the handlers: validate, then persist.

pub mod events;
pub mod rsvp;
pub mod sessions;

pub use rsvp::{RsvpError, RsvpManager};
