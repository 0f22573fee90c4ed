pub mod events;
pub mod identity;
pub mod session;
pub mod user;

pub use events::UserCreated;
pub use identity::Identity;
pub use session::{NotificationMethod, Session, UserProfile};
pub use user::{NewUser, User};
