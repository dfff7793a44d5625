use crate::domain::{ChatId, UserId};

/// Inbound user action, already decoded from the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// `/start` command.
    Start,
    /// "Let's go" button.
    Continue,
    /// "Check subscription" button.
    CheckSubscription,
    /// "Get message" button (also used for the come-back-tomorrow retry).
    RequestContent,
}

impl Action {
    pub const CONTINUE_DATA: &'static str = "go";
    pub const CHECK_SUBSCRIPTION_DATA: &'static str = "check_sub";
    pub const REQUEST_CONTENT_DATA: &'static str = "get_msg";

    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data.trim() {
            Self::CONTINUE_DATA => Some(Action::Continue),
            Self::CHECK_SUBSCRIPTION_DATA => Some(Action::CheckSubscription),
            Self::REQUEST_CONTENT_DATA => Some(Action::RequestContent),
            _ => None,
        }
    }

    /// Parse a bot command (`/start`, `/start@botname payload`).
    pub fn from_command(text: &str) -> Option<Self> {
        let first = text.trim().split_whitespace().next()?;
        let cmd = first.strip_prefix('/')?.split('@').next()?.to_lowercase();
        match cmd.as_str() {
            "start" => Some(Action::Start),
            _ => None,
        }
    }

    pub fn callback_data(self) -> Option<&'static str> {
        match self {
            Action::Start => None,
            Action::Continue => Some(Self::CONTINUE_DATA),
            Action::CheckSubscription => Some(Self::CHECK_SUBSCRIPTION_DATA),
            Action::RequestContent => Some(Self::REQUEST_CONTENT_DATA),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Continue => "continue",
            Action::CheckSubscription => "check_subscription",
            Action::RequestContent => "request_content",
        }
    }
}

/// A decoded inbound update addressed to the conversation flow.
#[derive(Clone, Debug)]
pub struct Inbound {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    /// Present for button presses; must be acknowledged.
    pub callback_id: Option<String>,
    pub action: Action,
}

/// Channel membership, closed over the statuses the bot cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipStatus {
    Member,
    Admin,
    Owner,
    NotMember,
    Unknown,
}

impl MembershipStatus {
    pub fn is_subscribed(self) -> bool {
        matches!(
            self,
            MembershipStatus::Member | MembershipStatus::Admin | MembershipStatus::Owner
        )
    }
}

/// Inline keyboard: one button per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub kind: ButtonKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonKind {
    Callback(String),
    Url(String),
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    pub fn single(button: InlineButton) -> Self {
        Self {
            buttons: vec![button],
        }
    }

    /// Callback data of every callback button, in order.
    pub fn callback_data(&self) -> Vec<&str> {
        self.buttons
            .iter()
            .filter_map(|b| match &b.kind {
                ButtonKind::Callback(d) => Some(d.as_str()),
                ButtonKind::Url(_) => None,
            })
            .collect()
    }
}

impl InlineButton {
    pub fn action(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            kind: ButtonKind::Callback(action.callback_data().unwrap_or_default().to_string()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ButtonKind::Url(url.into()),
        }
    }
}
