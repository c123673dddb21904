mod activity;
mod household;
mod password_reset_token;
mod pet;
mod user;

pub use activity::{Action, Activity, ActivityWithUser};
pub use household::Household;
pub use password_reset_token::PasswordResetToken;
pub use pet::Pet;
pub use user::User;
