//! Conversation flow:
//!
//! `/start` → welcome + "go" → subscription instructions → membership check →
//! content request → Delivered | Blocked | NoContent | DeliveryFailed.
//!
//! The flow keeps no per-user conversation state: each button carries the
//! action it triggers, so any step can be replayed. The only persisted state
//! is the send record, written after a successful photo delivery.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    content::ContentSelector,
    domain::{ChatId, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{Action, InlineButton, InlineKeyboard, Inbound, MembershipStatus},
    },
    store::SendRecordStore,
    texts, Result,
};

/// What a handled action ended in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Welcomed,
    InstructionsSent,
    Subscribed,
    NotSubscribed,
    MembershipCheckFailed,
    Blocked,
    NoContent,
    Delivered,
    DeliveryFailed,
}

/// Serializes content requests per user so two concurrent presses cannot both
/// pass the daily gate before either records the send.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub async fn lock_user(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(user_id.0)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Forget `user_id`'s lock once nobody holds or waits on it.
    pub async fn release(&self, user_id: UserId) {
        let mut map = self.inner.lock().await;
        if map
            .get(&user_id.0)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&user_id.0);
        }
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Application context handed to every transport handler.
pub struct Conversation {
    cfg: Arc<Config>,
    store: Arc<dyn SendRecordStore>,
    messenger: Arc<dyn MessagingPort>,
    selector: Arc<ContentSelector>,
    user_locks: UserLocks,
}

impl Conversation {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<dyn SendRecordStore>,
        messenger: Arc<dyn MessagingPort>,
        selector: Arc<ContentSelector>,
    ) -> Self {
        Self {
            cfg,
            store,
            messenger,
            selector,
            user_locks: UserLocks::default(),
        }
    }

    /// Handle one inbound action. Button presses are always acknowledged,
    /// including when the handler fails.
    pub async fn handle(&self, inbound: Inbound) -> Result<Outcome> {
        info!(
            user_id = inbound.user_id.0,
            chat_id = inbound.chat_id.0,
            username = inbound.username.as_deref().unwrap_or("unknown"),
            action = inbound.action.name(),
            "action received"
        );

        let result = self.dispatch(&inbound).await;
        self.acknowledge(&inbound).await;

        match &result {
            Ok(outcome) => info!(
                user_id = inbound.user_id.0,
                action = inbound.action.name(),
                ?outcome,
                "action handled"
            ),
            Err(e) => error!(
                user_id = inbound.user_id.0,
                action = inbound.action.name(),
                "action failed: {e}"
            ),
        }
        result
    }

    /// Acknowledge a button press that could not be decoded into an action.
    pub async fn acknowledge_unknown(&self, callback_id: &str) {
        if let Err(e) = self.messenger.answer_callback_query(callback_id).await {
            warn!("failed to answer callback query: {e}");
        }
    }

    async fn dispatch(&self, inbound: &Inbound) -> Result<Outcome> {
        match inbound.action {
            Action::Start => self.on_start(inbound.chat_id).await,
            Action::Continue => self.on_continue(inbound.chat_id).await,
            Action::CheckSubscription => {
                self.on_check_subscription(inbound.chat_id, inbound.user_id)
                    .await
            }
            Action::RequestContent => {
                self.on_request_content(inbound.chat_id, inbound.user_id)
                    .await
            }
        }
    }

    async fn acknowledge(&self, inbound: &Inbound) {
        let Some(callback_id) = &inbound.callback_id else {
            return;
        };
        if let Err(e) = self.messenger.answer_callback_query(callback_id).await {
            warn!(user_id = inbound.user_id.0, "failed to answer callback query: {e}");
        }
    }

    async fn on_start(&self, chat_id: ChatId) -> Result<Outcome> {
        self.messenger
            .send_inline_keyboard(chat_id, texts::WELCOME, keyboard_go())
            .await?;
        Ok(Outcome::Welcomed)
    }

    async fn on_continue(&self, chat_id: ChatId) -> Result<Outcome> {
        let mut text = texts::SUBSCRIBE_INSTRUCTIONS.to_string();
        if self.cfg.channel_url.is_none() {
            text.push_str(texts::CHANNEL_URL_MISSING_HINT);
        }
        self.messenger
            .send_inline_keyboard(chat_id, &text, self.keyboard_subscribe())
            .await?;
        Ok(Outcome::InstructionsSent)
    }

    async fn on_check_subscription(&self, chat_id: ChatId, user_id: UserId) -> Result<Outcome> {
        let status = match self
            .messenger
            .membership_status(self.cfg.channel_id, user_id)
            .await
        {
            Ok(status) => status,
            Err(e) => {
                warn!(user_id = user_id.0, "membership check failed: {e}");
                let detail = self.cfg.redact(&membership_error_detail(&e));
                let text = texts::with_error_detail(texts::MEMBERSHIP_CHECK_FAILED, &detail);
                self.messenger
                    .send_inline_keyboard(chat_id, &text, self.keyboard_subscribe())
                    .await?;
                return Ok(Outcome::MembershipCheckFailed);
            }
        };

        if status.is_subscribed() {
            self.messenger
                .send_inline_keyboard(chat_id, texts::SUBSCRIBED, keyboard_get_message())
                .await?;
            return Ok(Outcome::Subscribed);
        }

        if status == MembershipStatus::Unknown {
            warn!(user_id = user_id.0, "unrecognized membership status");
        }
        self.messenger
            .send_inline_keyboard(chat_id, texts::NOT_SUBSCRIBED, self.keyboard_subscribe())
            .await?;
        Ok(Outcome::NotSubscribed)
    }

    async fn on_request_content(&self, chat_id: ChatId, user_id: UserId) -> Result<Outcome> {
        let guard = self.user_locks.lock_user(user_id).await;
        let result = self.request_content_locked(chat_id, user_id).await;
        drop(guard);
        self.user_locks.release(user_id).await;
        result
    }

    async fn request_content_locked(&self, chat_id: ChatId, user_id: UserId) -> Result<Outcome> {
        if !self.store.is_eligible_today(user_id).await? {
            self.messenger
                .send_inline_keyboard(chat_id, texts::ALREADY_RECEIVED, keyboard_come_tomorrow())
                .await?;
            return Ok(Outcome::Blocked);
        }

        self.messenger.send_text(chat_id, texts::PREAMBLE).await?;

        let item = match self.selector.select() {
            Ok(item) => item,
            Err(Error::NoContentAvailable { folder }) => {
                warn!(folder = %folder.display(), "image pool is empty");
                self.messenger.send_text(chat_id, texts::NO_CONTENT).await?;
                return Ok(Outcome::NoContent);
            }
            Err(e) => return Err(e),
        };

        match self
            .messenger
            .send_photo(chat_id, &item.path, &item.caption)
            .await
        {
            Ok(_) => {
                self.store.record_sent_today(user_id).await?;
                info!(user_id = user_id.0, path = %item.path.display(), "photo delivered");
                Ok(Outcome::Delivered)
            }
            Err(e) => {
                warn!(user_id = user_id.0, path = %item.path.display(), "photo delivery failed: {e}");
                let detail = self.cfg.redact(&e.to_string());
                let text = texts::with_error_detail(texts::DELIVERY_FAILED, &detail);
                self.messenger.send_text(chat_id, &text).await?;
                Ok(Outcome::DeliveryFailed)
            }
        }
    }

    fn keyboard_subscribe(&self) -> InlineKeyboard {
        let mut buttons = vec![InlineButton::action(
            texts::BTN_CHECK_SUBSCRIPTION,
            Action::CheckSubscription,
        )];
        if let Some(url) = &self.cfg.channel_url {
            buttons.push(InlineButton::url(texts::BTN_OPEN_CHANNEL, url.clone()));
        }
        InlineKeyboard::new(buttons)
    }
}

fn keyboard_go() -> InlineKeyboard {
    InlineKeyboard::single(InlineButton::action(texts::BTN_GO, Action::Continue))
}

fn keyboard_get_message() -> InlineKeyboard {
    InlineKeyboard::single(InlineButton::action(
        texts::BTN_GET_MESSAGE,
        Action::RequestContent,
    ))
}

fn keyboard_come_tomorrow() -> InlineKeyboard {
    InlineKeyboard::single(InlineButton::action(
        texts::BTN_GET_MESSAGE_TOMORROW,
        Action::RequestContent,
    ))
}

fn membership_error_detail(e: &Error) -> String {
    match e {
        Error::MembershipCheck(detail) => detail.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        domain::{MessageId, MessageRef},
        gate::Eligibility,
        messaging::types::ButtonKind,
        store::SqliteSendStore,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::{
        path::{Path, PathBuf},
        sync::Mutex as StdMutex,
    };

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Sent {
        Text(String),
        Keyboard(String, InlineKeyboard),
        Photo(PathBuf, String),
    }

    #[derive(Default)]
    struct FakeMessenger {
        sent: StdMutex<Vec<Sent>>,
        acks: StdMutex<Vec<String>>,
        membership: StdMutex<Option<MembershipStatus>>,
        fail_photo: StdMutex<bool>,
        fail_text: StdMutex<bool>,
    }

    impl FakeMessenger {
        fn set_membership(&self, status: Option<MembershipStatus>) {
            *self.membership.lock().unwrap() = status;
        }

        fn set_fail_photo(&self, fail: bool) {
            *self.fail_photo.lock().unwrap() = fail;
        }

        fn take_sent(&self) -> Vec<Sent> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }

        fn acks(&self) -> Vec<String> {
            self.acks.lock().unwrap().clone()
        }

        fn msg_ref(chat_id: ChatId) -> MessageRef {
            MessageRef {
                chat_id,
                message_id: MessageId(1),
            }
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            if *self.fail_text.lock().unwrap() {
                return Err(Error::External("telegram error: network down".to_string()));
            }
            self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
            Ok(Self::msg_ref(chat_id))
        }

        async fn send_inline_keyboard(
            &self,
            chat_id: ChatId,
            text: &str,
            keyboard: InlineKeyboard,
        ) -> Result<MessageRef> {
            if *self.fail_text.lock().unwrap() {
                return Err(Error::External("telegram error: network down".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Keyboard(text.to_string(), keyboard));
            Ok(Self::msg_ref(chat_id))
        }

        async fn send_photo(
            &self,
            chat_id: ChatId,
            path: &Path,
            caption: &str,
        ) -> Result<MessageRef> {
            if *self.fail_photo.lock().unwrap() {
                return Err(Error::Delivery(
                    "telegram error: file too big (bot123:secret)".to_string(),
                ));
            }
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Photo(path.to_path_buf(), caption.to_string()));
            Ok(Self::msg_ref(chat_id))
        }

        async fn membership_status(
            &self,
            _channel: ChatId,
            _user: UserId,
        ) -> Result<MembershipStatus> {
            match *self.membership.lock().unwrap() {
                Some(status) => Ok(status),
                None => Err(Error::MembershipCheck(
                    "Bad Request: member list is inaccessible".to_string(),
                )),
            }
        }

        async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
            self.acks.lock().unwrap().push(callback_id.to_string());
            Ok(())
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        photos: PathBuf,
        clock: Arc<FixedClock>,
        store: Arc<SqliteSendStore>,
        messenger: Arc<FakeMessenger>,
        conv: Conversation,
    }

    const USER: UserId = UserId(1001);
    const CHAT: ChatId = ChatId(1001);

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    async fn harness_with(pairs: &[(&str, &str)]) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos");
        std::fs::create_dir_all(&photos).unwrap();

        let cfg = Config::from_lookup(|key| {
            if key == "TELEGRAM_TOKEN" {
                return Some("123:secret".to_string());
            }
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap();

        let clock = Arc::new(FixedClock::new(today()));
        let store = Arc::new(
            SqliteSendStore::open(&dir.path().join("bot.db"), clock.clone())
                .await
                .unwrap(),
        );
        let messenger = Arc::new(FakeMessenger::default());
        let selector = Arc::new(ContentSelector::with_default_captions(&photos).unwrap());

        let conv = Conversation::new(
            Arc::new(cfg),
            store.clone(),
            messenger.clone(),
            selector,
        );

        Harness {
            _dir: dir,
            photos,
            clock,
            store,
            messenger,
            conv,
        }
    }

    async fn harness() -> Harness {
        harness_with(&[]).await
    }

    fn press(action: Action, callback_id: &str) -> Inbound {
        Inbound {
            chat_id: CHAT,
            user_id: USER,
            username: Some("tester".to_string()),
            callback_id: Some(callback_id.to_string()),
            action,
        }
    }

    fn start() -> Inbound {
        Inbound {
            chat_id: CHAT,
            user_id: USER,
            username: None,
            callback_id: None,
            action: Action::Start,
        }
    }

    fn add_photo(h: &Harness, name: &str) -> PathBuf {
        let p = h.photos.join(name);
        std::fs::write(&p, b"img").unwrap();
        p
    }

    #[tokio::test]
    async fn start_sends_welcome_with_single_continue_button() {
        let h = harness().await;
        assert_eq!(h.conv.handle(start()).await.unwrap(), Outcome::Welcomed);

        let sent = h.messenger.take_sent();
        assert_eq!(sent.len(), 1);
        let Sent::Keyboard(text, kb) = &sent[0] else {
            panic!("expected keyboard, got {sent:?}");
        };
        assert_eq!(text, texts::WELCOME);
        assert_eq!(kb.callback_data(), vec![Action::CONTINUE_DATA]);
        assert_eq!(kb.buttons.len(), 1);
        // Commands have nothing to acknowledge.
        assert!(h.messenger.acks().is_empty());
    }

    #[tokio::test]
    async fn continue_offers_check_and_channel_link() {
        let h = harness().await;
        assert_eq!(
            h.conv.handle(press(Action::Continue, "cb1")).await.unwrap(),
            Outcome::InstructionsSent
        );

        let sent = h.messenger.take_sent();
        let Sent::Keyboard(text, kb) = &sent[0] else {
            panic!("expected keyboard");
        };
        assert_eq!(text, texts::SUBSCRIBE_INSTRUCTIONS);
        assert_eq!(kb.callback_data(), vec![Action::CHECK_SUBSCRIPTION_DATA]);
        assert!(kb
            .buttons
            .iter()
            .any(|b| b.kind == ButtonKind::Url(crate::config::DEFAULT_CHANNEL_URL.to_string())));
        assert_eq!(h.messenger.acks(), vec!["cb1"]);
    }

    #[tokio::test]
    async fn continue_without_channel_url_adds_hint() {
        let h = harness_with(&[("CHANNEL_URL", "")]).await;
        h.conv.handle(press(Action::Continue, "cb")).await.unwrap();

        let sent = h.messenger.take_sent();
        let Sent::Keyboard(text, kb) = &sent[0] else {
            panic!("expected keyboard");
        };
        assert!(text.ends_with(texts::CHANNEL_URL_MISSING_HINT));
        assert_eq!(kb.buttons.len(), 1);
    }

    #[tokio::test]
    async fn subscription_statuses() {
        let h = harness().await;

        for (status, expected) in [
            (MembershipStatus::Member, Outcome::Subscribed),
            (MembershipStatus::Admin, Outcome::Subscribed),
            (MembershipStatus::Owner, Outcome::Subscribed),
            (MembershipStatus::NotMember, Outcome::NotSubscribed),
            (MembershipStatus::Unknown, Outcome::NotSubscribed),
        ] {
            h.messenger.set_membership(Some(status));
            let outcome = h
                .conv
                .handle(press(Action::CheckSubscription, "cb"))
                .await
                .unwrap();
            assert_eq!(outcome, expected, "{status:?}");

            let sent = h.messenger.take_sent();
            let Sent::Keyboard(_, kb) = &sent[0] else {
                panic!("expected keyboard");
            };
            let expected_data = if expected == Outcome::Subscribed {
                Action::REQUEST_CONTENT_DATA
            } else {
                Action::CHECK_SUBSCRIPTION_DATA
            };
            assert_eq!(kb.callback_data(), vec![expected_data]);
        }
    }

    #[tokio::test]
    async fn membership_failure_shows_detail_and_retry() {
        let h = harness().await;
        h.messenger.set_membership(None);

        let outcome = h
            .conv
            .handle(press(Action::CheckSubscription, "cb9"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::MembershipCheckFailed);

        let sent = h.messenger.take_sent();
        let Sent::Keyboard(text, kb) = &sent[0] else {
            panic!("expected keyboard");
        };
        assert!(text.starts_with(texts::MEMBERSHIP_CHECK_FAILED));
        assert!(text.contains("member list is inaccessible"));
        assert_eq!(kb.callback_data(), vec![Action::CHECK_SUBSCRIPTION_DATA]);
        assert_eq!(h.messenger.acks(), vec!["cb9"]);
    }

    #[tokio::test]
    async fn delivery_records_and_blocks_until_tomorrow() {
        let h = harness().await;
        let photo = add_photo(&h, "only.jpg");

        let outcome = h
            .conv
            .handle(press(Action::RequestContent, "cb"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Delivered);

        let sent = h.messenger.take_sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], Sent::Text(texts::PREAMBLE.to_string()));
        let Sent::Photo(path, caption) = &sent[1] else {
            panic!("expected photo");
        };
        assert_eq!(path, &photo);
        assert!(crate::content::DEFAULT_CAPTIONS.contains(&caption.as_str()));
        assert_eq!(h.store.last_sent(USER).await.unwrap(), Some(today()));

        // Same day: blocked, nothing sent but the notice.
        let outcome = h
            .conv
            .handle(press(Action::RequestContent, "cb2"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Blocked);
        let sent = h.messenger.take_sent();
        assert_eq!(sent.len(), 1);
        let Sent::Keyboard(text, kb) = &sent[0] else {
            panic!("expected keyboard");
        };
        assert_eq!(text, texts::ALREADY_RECEIVED);
        assert_eq!(kb.callback_data(), vec![Action::REQUEST_CONTENT_DATA]);

        // Next day: eligible again.
        h.clock.set(today().succ_opt().unwrap());
        assert_eq!(
            h.conv
                .handle(press(Action::RequestContent, "cb3"))
                .await
                .unwrap(),
            Outcome::Delivered
        );
        assert_eq!(h.messenger.acks(), vec!["cb", "cb2", "cb3"]);
    }

    #[tokio::test]
    async fn empty_pool_writes_nothing() {
        let h = harness().await;
        add_photo(&h, "notes.txt");

        let outcome = h
            .conv
            .handle(press(Action::RequestContent, "cb"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::NoContent);

        let sent = h.messenger.take_sent();
        assert_eq!(
            sent,
            vec![
                Sent::Text(texts::PREAMBLE.to_string()),
                Sent::Text(texts::NO_CONTENT.to_string()),
            ]
        );
        assert_eq!(h.store.last_sent(USER).await.unwrap(), None);
        assert!(h.store.is_eligible_today(USER).await.unwrap());
    }

    #[tokio::test]
    async fn delivery_failure_keeps_user_eligible() {
        let h = harness().await;
        add_photo(&h, "a.png");
        h.messenger.set_fail_photo(true);

        let outcome = h
            .conv
            .handle(press(Action::RequestContent, "cb"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::DeliveryFailed);

        let sent = h.messenger.take_sent();
        let Sent::Text(text) = sent.last().unwrap() else {
            panic!("expected text");
        };
        assert!(text.starts_with(texts::DELIVERY_FAILED));
        assert!(!text.contains("123:secret"));
        assert_eq!(h.store.last_sent(USER).await.unwrap(), None);

        // Immediate retry is free and succeeds once the transport recovers.
        h.messenger.set_fail_photo(false);
        assert_eq!(
            h.conv
                .handle(press(Action::RequestContent, "cb2"))
                .await
                .unwrap(),
            Outcome::Delivered
        );
    }

    #[tokio::test]
    async fn transport_error_still_acknowledges() {
        let h = harness().await;
        *h.messenger.fail_text.lock().unwrap() = true;

        let err = h
            .conv
            .handle(press(Action::Continue, "cb-err"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External(_)));
        assert_eq!(h.messenger.acks(), vec!["cb-err"]);
    }

    #[tokio::test]
    async fn concurrent_requests_deliver_once() {
        let h = harness().await;
        add_photo(&h, "a.jpg");

        let (a, b) = tokio::join!(
            h.conv.handle(press(Action::RequestContent, "x")),
            h.conv.handle(press(Action::RequestContent, "y")),
        );
        let mut outcomes = vec![a.unwrap(), b.unwrap()];
        outcomes.sort_by_key(|o| format!("{o:?}"));
        assert_eq!(outcomes, vec![Outcome::Blocked, Outcome::Delivered]);

        let photos = h
            .messenger
            .take_sent()
            .into_iter()
            .filter(|s| matches!(s, Sent::Photo(..)))
            .count();
        assert_eq!(photos, 1);
        assert_eq!(h.conv.user_locks.tracked().await, 0);
    }

    #[tokio::test]
    async fn user_lock_is_released_after_request() {
        let h = harness().await;
        add_photo(&h, "a.jpg");

        h.conv
            .handle(press(Action::RequestContent, "cb"))
            .await
            .unwrap();
        assert_eq!(h.conv.user_locks.tracked().await, 0);

        let held = h.conv.user_locks.lock_user(USER).await;
        h.conv.user_locks.release(USER).await;
        assert_eq!(h.conv.user_locks.tracked().await, 1);
        drop(held);
        h.conv.user_locks.release(USER).await;
        assert_eq!(h.conv.user_locks.tracked().await, 0);
    }

    struct FailingStore;

    #[async_trait]
    impl SendRecordStore for FailingStore {
        async fn eligibility(&self, _user_id: UserId) -> Result<Eligibility> {
            Err(Error::Store(sqlx::Error::PoolClosed))
        }

        async fn record_sent_today(&self, _user_id: UserId) -> Result<()> {
            Err(Error::Store(sqlx::Error::PoolClosed))
        }
    }

    #[tokio::test]
    async fn store_failure_still_acknowledges() {
        let h = harness().await;
        add_photo(&h, "a.jpg");
        let conv = Conversation::new(
            h.conv.cfg.clone(),
            Arc::new(FailingStore),
            h.messenger.clone(),
            h.conv.selector.clone(),
        );

        let err = conv
            .handle(press(Action::RequestContent, "cb-store"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(h.messenger.acks(), vec!["cb-store"]);
        assert!(h.messenger.take_sent().is_empty());
        assert_eq!(conv.user_locks.tracked().await, 0);
    }

    #[tokio::test]
    async fn full_scenario() {
        let h = harness().await;
        add_photo(&h, "card.jpeg");

        assert_eq!(h.conv.handle(start()).await.unwrap(), Outcome::Welcomed);
        assert_eq!(
            h.conv.handle(press(Action::Continue, "1")).await.unwrap(),
            Outcome::InstructionsSent
        );

        h.messenger.set_membership(Some(MembershipStatus::NotMember));
        assert_eq!(
            h.conv
                .handle(press(Action::CheckSubscription, "2"))
                .await
                .unwrap(),
            Outcome::NotSubscribed
        );

        h.messenger.set_membership(Some(MembershipStatus::Member));
        assert_eq!(
            h.conv
                .handle(press(Action::CheckSubscription, "3"))
                .await
                .unwrap(),
            Outcome::Subscribed
        );

        assert_eq!(
            h.conv
                .handle(press(Action::RequestContent, "4"))
                .await
                .unwrap(),
            Outcome::Delivered
        );
        assert_eq!(
            h.conv
                .handle(press(Action::RequestContent, "5"))
                .await
                .unwrap(),
            Outcome::Blocked
        );

        let photos = h
            .messenger
            .take_sent()
            .into_iter()
            .filter(|s| matches!(s, Sent::Photo(..)))
            .count();
        assert_eq!(photos, 1);
        assert_eq!(h.messenger.acks(), vec!["1", "2", "3", "4", "5"]);
    }
}
