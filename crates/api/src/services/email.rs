//! Shopping list emails.
//!
//! Messages are rendered from Askama templates (HTML and plain text) and
//! delivered by a [`Mailer`]. Production uses SMTP via lettre.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use price_comparer_core::{Email, ListItem};

use crate::config::EmailConfig;

/// Subject line of shopping list emails.
pub const SHOPPING_LIST_SUBJECT: &str = "Your Shopping List";

/// One table row.
struct EmailLine<'a> {
    store: &'a str,
    title: &'a str,
    qty: u32,
    unit_price: String,
    total: String,
}

/// HTML template for the shopping list email.
#[derive(Template)]
#[template(path = "email/shopping_list.html")]
struct ShoppingListEmailHtml<'a> {
    lines: &'a [EmailLine<'a>],
    grand_total: &'a str,
}

/// Plain text template for the shopping list email.
#[derive(Template)]
#[template(path = "email/shopping_list.txt")]
struct ShoppingListEmailText<'a> {
    lines: &'a [EmailLine<'a>],
    grand_total: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered message, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// Render the shopping list email for `items`.
///
/// # Errors
///
/// Returns `MailError::Template` if a template fails to render.
pub fn render_shopping_list(items: &[ListItem]) -> Result<RenderedEmail, MailError> {
    let lines: Vec<EmailLine<'_>> = items
        .iter()
        .map(|item| EmailLine {
            store: item.store_label(),
            title: &item.title,
            qty: item.qty.get(),
            unit_price: item.price.to_string(),
            total: item.line_total().to_string(),
        })
        .collect();
    let grand_total = ListItem::grand_total(items).to_string();

    let html = ShoppingListEmailHtml {
        lines: &lines,
        grand_total: &grand_total,
    }
    .render()?;
    let text = ShoppingListEmailText {
        lines: &lines,
        grand_total: &grand_total,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: SHOPPING_LIST_SUBJECT.to_owned(),
        text,
        html,
    })
}

/// Delivers rendered emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `email` to `to`.
    async fn send(&self, to: &Email, email: &RenderedEmail) -> Result<(), MailError>;
}

/// SMTP mailer (STARTTLS relay with credentials).
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns `MailError::Smtp` if the relay can't be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.sender(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &Email, email: &RenderedEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;

        self.transport.send(message).await?;

        tracing::info!(to = %to, subject = %email.subject, "Email sent");
        Ok(())
    }
}
