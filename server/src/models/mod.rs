pub mod event;
pub mod rsvp;
pub mod session;
pub mod user;

pub use event::{CreateEventRequest, Event, UpdateEventRequest};
pub use rsvp::Rsvp;
pub use session::{CreateSessionRequest, Session, UpdateSessionRequest};
pub use user::{AuthCallbackParams, User};
