use crate::types::{Malformed, Message, Warning};

pub(crate) struct Sanitized {
    pub messages: Vec<Message>,
    pub warnings: Vec<Warning>,
}

/// Exclude messages with unknown roles and blocks that fail validation.
///
/// A message that loses every block this way is excluded too. Returns `None`
/// when nothing needed excluding, so callers can keep the input as is.
pub(crate) fn sanitize(messages: &[Message]) -> Option<Sanitized> {
    let clean = messages
        .iter()
        .all(|m| m.role.is_known() && m.content.iter().all(|b| b.validate().is_ok()));
    if clean {
        return None;
    }

    let mut output = Vec::with_capacity(messages.len());
    let mut warnings = Vec::new();

    for (message_index, message) in messages.iter().enumerate() {
        if !message.role.is_known() {
            let reason = Malformed::UnknownRole {
                role: message.role.to_string(),
            };
            tracing::warn!(message = message_index, %reason, "excluding malformed message");
            warnings.push(Warning {
                message_index,
                block_index: None,
                reason,
            });
            continue;
        }

        let mut kept = Vec::with_capacity(message.content.len());
        for (block_index, block) in message.content.iter().enumerate() {
            match block.validate() {
                Ok(()) => kept.push(block.clone()),
                Err(reason) => {
                    tracing::warn!(message = message_index, block = block_index, %reason, "excluding malformed block");
                    warnings.push(Warning {
                        message_index,
                        block_index: Some(block_index),
                        reason,
                    });
                }
            }
        }

        if kept.is_empty() && !message.content.is_empty() {
            continue;
        }
        output.push(Message::new(message.role.clone(), kept));
    }

    Some(Sanitized {
        messages: output,
        warnings,
    })
}
