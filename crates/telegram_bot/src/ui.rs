use engine::Keyboard;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};

pub(crate) fn inline_markup(rows: &[Vec<engine::Button>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.payload.clone()))
            .collect::<Vec<_>>()
    }))
}

pub(crate) fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_markup(rows)),
        Keyboard::Menu(rows) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(rows.iter().map(|row| {
                row.iter()
                    .map(|label| KeyboardButton::new(label.clone()))
                    .collect::<Vec<_>>()
            }))
            .resize_keyboard(),
        ),
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

#[cfg(test)]
mod tests {
    use engine::Button;

    use super::*;

    #[test]
    fn inline_rows_keep_payloads() {
        let markup = inline_markup(&[
            vec![
                Button::callback("🍔 Food", "category_food"),
                Button::callback("🚗 Transport", "category_transport"),
            ],
            vec![Button::callback("❌ Cancel", "cancel")],
        ]);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "❌ Cancel");
    }

    #[test]
    fn menu_becomes_reply_keyboard() {
        let markup = reply_markup(&Keyboard::Menu(vec![vec!["💸 Add Expense".into()]]));
        let ReplyMarkup::Keyboard(keyboard) = markup else {
            panic!("expected a reply keyboard");
        };
        assert_eq!(keyboard.keyboard[0][0].text, "💸 Add Expense");
    }
}
