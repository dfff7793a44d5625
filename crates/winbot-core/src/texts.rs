//! User-facing copy (Ukrainian).

pub const WELCOME: &str = "Привіт! Це бот, де ти отримаєш послання саме для себе ✨\n\
Готова/готовий розпочати?";

pub const SUBSCRIBE_INSTRUCTIONS: &str = "Щоб скористатися ботом — перевір свою підписку на канал.\n\n\
Натисни кнопку нижче, підпишись і повернись сюди натиснути «Перевірити підписку».";

pub const CHANNEL_URL_MISSING_HINT: &str =
    "\n\n(Кнопка «Відкрити канал» з’явиться, якщо додати посилання в CHANNEL_URL)";

pub const SUBSCRIBED: &str = "Дякую за підписку! Можеш отримати своє послання 🫶";

pub const NOT_SUBSCRIBED: &str = "Схоже, підписки ще немає. Підпишись і спробуй ще раз 😊";

pub const MEMBERSHIP_CHECK_FAILED: &str = "Не вдалося перевірити підписку. \
Переконайся, що бот доданий у канал і має права адміністратора.";

pub const ALREADY_RECEIVED: &str = "Ти вже отримувала/отримував послання сьогодні 🌞\n\
Повернись завтра — я чекатиму 🕊";

pub const PREAMBLE: &str = "Зараз ти отримаєш те, що тобі варто почути… 💫\n\
Подумай, чому саме ця картинка тобі потрапила сьогодні.";

pub const NO_CONTENT: &str = "😅 Фото не знайдено. Додай файл(и) у папку 'photos'.";

pub const DELIVERY_FAILED: &str = "❌ Не вдалося надіслати фото.";

// Button labels.
pub const BTN_GO: &str = "🚀 Поїхали";
pub const BTN_CHECK_SUBSCRIPTION: &str = "🔁 Перевірити підписку";
pub const BTN_OPEN_CHANNEL: &str = "📣 Відкрити канал";
pub const BTN_GET_MESSAGE: &str = "🔮 Отримати послання";
pub const BTN_GET_MESSAGE_TOMORROW: &str = "🕊 Отримати ще (завтра)";

/// Max chars of an error detail echoed back to the user.
pub const ERROR_DETAIL_MAX_CHARS: usize = 200;

/// "<message>\nПомилка: <detail>", with the detail truncated.
pub fn with_error_detail(message: &str, detail: &str) -> String {
    let detail = truncate_chars(detail, ERROR_DETAIL_MAX_CHARS);
    format!("{message}\nПомилка: {detail}")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}
