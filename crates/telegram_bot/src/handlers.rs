//! Turns Telegram updates into engine events.

use engine::{ConversationId, Event, EventKind, MessageId, ProfileHints};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, User},
};

use crate::ConfigParameters;

pub(crate) async fn handle_message(msg: Message, cfg: ConfigParameters) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        tracing::debug!("ignoring message without sender in {}", msg.chat.id);
        return Ok(());
    };

    // Stickers, photos and the like reach the engine as empty text.
    let text = msg.text().or(msg.caption()).unwrap_or_default();

    let event = Event {
        conversation_id: ConversationId(msg.chat.id.0),
        user_id: from.id.0.to_string(),
        profile: profile_hints(from),
        kind: EventKind::from_text(text),
    };
    cfg.engine.dispatch(event).await;
    Ok(())
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(event) = callback_event(&q) else {
        // No chat to reply into; just stop the client spinner.
        tracing::debug!("callback {} without message", q.id.0);
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    cfg.engine.dispatch(event).await;
    Ok(())
}

/// Engine event for a button tap, when the tapped message is known.
fn callback_event(q: &CallbackQuery) -> Option<Event> {
    let message = q.message.as_ref()?;
    Some(Event {
        conversation_id: ConversationId(message.chat().id.0),
        user_id: q.from.id.0.to_string(),
        profile: profile_hints(&q.from),
        kind: EventKind::Callback {
            id: q.id.0.clone(),
            message_id: Some(MessageId(message.id().0)),
            payload: q.data.clone().unwrap_or_default(),
        },
    })
}

fn profile_hints(user: &User) -> ProfileHints {
    ProfileHints {
        username: user.username.clone(),
        display_name: Some(user.full_name()),
        onboarding_code: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(message: Option<serde_json::Value>) -> CallbackQuery {
        let mut raw = serde_json::json!({
            "id": "4382bfdwdsb323b2d9",
            "from": { "id": 42, "is_bot": false, "first_name": "Asha", "username": "asha" },
            "chat_instance": "-1",
            "data": "cat:Food",
        });
        if let Some(message) = message {
            raw["message"] = message;
        }
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn callback_without_message_has_no_event() {
        assert!(callback_event(&query(None)).is_none());
    }

    #[test]
    fn callback_with_message_becomes_event() {
        let message = serde_json::json!({
            "message_id": 7,
            "date": 1_760_000_000,
            "chat": { "id": 42, "type": "private", "first_name": "Asha" },
            "text": "Pick a category",
        });
        let event = callback_event(&query(Some(message))).unwrap();
        assert_eq!(event.conversation_id, ConversationId(42));
        assert_eq!(event.user_id, "42");
        assert_eq!(
            event.kind,
            EventKind::Callback {
                id: "4382bfdwdsb323b2d9".to_string(),
                message_id: Some(MessageId(7)),
                payload: "cat:Food".to_string(),
            }
        );
    }
}
