//! Services behind the HTTP handlers.
//!
//! - `auth` - Email/password sign-up and sign-in
//! - `email` - Shopping list emails over SMTP
//! - `export` - Shopping list PDF rendering

pub mod auth;
pub mod email;
pub mod export;

pub use auth::{AuthError, AuthService};
pub use email::{MailError, Mailer, RenderedEmail, SmtpMailer, render_shopping_list};
pub use export::ExportError;
