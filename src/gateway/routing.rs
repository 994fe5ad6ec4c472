//! Inbound message classification: which branch handles an event.

use kora_core::message::IncomingMessage;

/// The branch an inbound message takes. Evaluated in declaration order.
#[derive(Debug, PartialEq, Eq)]
pub enum Route<'a> {
    /// `<prefix><name> <args>`.
    Command { name: &'a str, args: &'a str },
    /// One or more attachments and no command.
    Attachments,
    /// Anything else with visible text.
    FreeText(&'a str),
    /// Nothing usable in the event.
    Empty,
}

impl<'a> Route<'a> {
    pub fn classify(msg: &'a IncomingMessage, prefix: &str) -> Self {
        let text = msg.text.trim();

        if !prefix.is_empty() {
            if let Some(rest) = text.strip_prefix(prefix) {
                let (name, args) = match rest.split_once(char::is_whitespace) {
                    Some((name, args)) => (name, args.trim()),
                    None => (rest, ""),
                };
                return Route::Command { name, args };
            }
        }

        if !msg.attachments.is_empty() {
            return Route::Attachments;
        }

        if text.is_empty() {
            Route::Empty
        } else {
            Route::FreeText(text)
        }
    }
}
