//! Message formatting utilities for client display.

use tsunagi_shared::time::{format_local_time, timestamp_to_rfc3339};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Banner shown once the socket is open
    pub fn format_entering(room: &str, name: &str) -> String {
        format!(
            "\n============================================================\n\
             Entering room {} as '{}'.\n\
             Type messages and press Enter to send. Press Ctrl+C to exit.\n\
             ============================================================\n",
            room, name
        )
    }

    /// Format a chat message
    ///
    /// # Arguments
    ///
    /// * `from` - The name of the sender
    /// * `content` - The message content
    /// * `sent_at` - Unix timestamp when the message was sent (milliseconds)
    pub fn format_chat_message(from: &str, content: &str, sent_at: i64) -> String {
        format!("\n[{}] @{}: {}\n", format_local_time(sent_at), from, content)
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(sent_at: i64) -> String {
        match timestamp_to_rfc3339(sent_at) {
            Some(timestamp) => format!("sent at {}\n", timestamp),
            None => "sent\n".to_string(),
        }
    }

    /// Format an error notification from the relay
    pub fn format_error(error: &str) -> String {
        format!("\n! {}\n", error)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a payload this client does not understand
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
