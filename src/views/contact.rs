use crate::app::Result;
use crate::domain::{Message, NewMessage};
use crate::gateway::Gateway;

pub const CONTACT_SENT: &str = "Thank you for your message! I'll get back to you soon.";
pub const CONTACT_FAILED: &str = "Failed to send message. Please try again.";

/// Check the form and submit it. Nothing is sent when a field is blank.
pub async fn send_message(gateway: &Gateway, message: &NewMessage) -> Result<Message> {
    message.validate()?;
    let created = gateway.create_message(message).await?;
    tracing::info!(id = %created.id, "contact message sent");
    Ok(created)
}
