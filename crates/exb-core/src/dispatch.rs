//! Inbound event routing: auth gate, entry dialogue, menu commands.
//!
//! Exactly one branch handles each event: an active conversation state
//! consumes the event exclusively; otherwise the text is matched against the
//! fixed menu labels; otherwise the event is ignored.

use std::sync::Arc;

use crate::{
    config::Config,
    dialogue::{self, EntryState, Outcome},
    domain::{ChatId, InboundMessage},
    export, menu,
    messaging::port::MessagingPort,
    report,
    session::{ConversationState, SessionStore},
    store::{ExpenseStore, ReportWindow},
    Result,
};

const PASSWORD_PROMPT: &str = "Введите пароль для доступа к боту:";
const PASSWORD_RETRY: &str = "Неверный пароль. Попробуйте снова.";
const NOT_AUTHORIZED: &str = "Вы не авторизованы. Введите /start для начала.";
const NO_CHART_DATA: &str = "Недостаточно данных для графика.";

pub struct Dispatcher {
    cfg: Arc<Config>,
    store: ExpenseStore,
    sessions: SessionStore,
    messenger: Arc<dyn MessagingPort>,
}

impl Dispatcher {
    pub fn new(cfg: Arc<Config>, store: ExpenseStore, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            cfg,
            store,
            sessions: SessionStore::default(),
            messenger,
        }
    }

    pub async fn dispatch(&self, msg: InboundMessage) -> Result<()> {
        match self.sessions.conversation(msg.user_id).await {
            Some(ConversationState::AwaitingPassword) => self.check_password(&msg).await,
            Some(ConversationState::Entry(state)) => self.advance_entry(&msg, state).await,
            None => self.handle_label(&msg).await,
        }
    }

    async fn check_password(&self, msg: &InboundMessage) -> Result<()> {
        if msg.text.trim() == self.cfg.shared_password {
            self.sessions.authorize(msg.user_id).await;
            self.show_main_menu(msg.chat_id).await
        } else {
            self.messenger.send_text(msg.chat_id, PASSWORD_RETRY).await?;
            Ok(())
        }
    }

    async fn show_main_menu(&self, chat_id: ChatId) -> Result<()> {
        self.messenger
            .send_keyboard(chat_id, menu::MAIN_MENU_TEXT, menu::main_menu())
            .await?;
        Ok(())
    }

    async fn advance_entry(&self, msg: &InboundMessage, state: EntryState) -> Result<()> {
        match dialogue::advance(state, &msg.text) {
            Outcome::Retry(prompt) => {
                self.messenger.send_text(msg.chat_id, prompt).await?;
            }
            Outcome::Next(next, prompt) => {
                self.sessions
                    .set_conversation(msg.user_id, ConversationState::Entry(next))
                    .await;
                self.messenger.send_text(msg.chat_id, prompt).await?;
            }
            Outcome::Complete(expense) => {
                self.sessions.clear_conversation(msg.user_id).await;
                match self.store.insert(
                    &msg.display_name,
                    expense.category,
                    &expense.title,
                    expense.amount,
                ) {
                    Ok(_) => {
                        let confirmation = format!(
                            "Готово! {} — {} — {:.2} ₽",
                            expense.category, expense.title, expense.amount
                        );
                        self.messenger.send_text(msg.chat_id, &confirmation).await?;
                        self.show_main_menu(msg.chat_id).await?;
                    }
                    Err(e) => {
                        self.messenger
                            .send_text(msg.chat_id, &format!("❌ Не удалось сохранить расход:\n{e}"))
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn handle_label(&self, msg: &InboundMessage) -> Result<()> {
        let text = msg.text.as_str();

        if text == menu::START {
            if self.sessions.is_authorized(msg.user_id).await {
                return self.show_main_menu(msg.chat_id).await;
            }
            self.sessions
                .set_conversation(msg.user_id, ConversationState::AwaitingPassword)
                .await;
            self.messenger.send_text(msg.chat_id, PASSWORD_PROMPT).await?;
            return Ok(());
        }

        let recognized = matches!(
            text,
            menu::ADD_EXPENSE
                | menu::REPORT_DAY
                | menu::REPORT_WEEK
                | menu::REPORT_MONTH
                | menu::EXPORT_SPREADSHEET
                | menu::EXPORT_CHART
        );
        if !recognized {
            // Unrecognized text outside a dialogue: no handler fires.
            return Ok(());
        }

        if !self.sessions.is_authorized(msg.user_id).await {
            self.messenger.send_text(msg.chat_id, NOT_AUTHORIZED).await?;
            return Ok(());
        }

        match text {
            menu::ADD_EXPENSE => {
                self.sessions
                    .set_conversation(msg.user_id, ConversationState::Entry(EntryState::Category))
                    .await;
                self.messenger
                    .send_keyboard(msg.chat_id, dialogue::CATEGORY_PROMPT, menu::category_menu())
                    .await?;
            }
            menu::REPORT_DAY => self.send_report(msg.chat_id, ReportWindow::Day).await?,
            menu::REPORT_WEEK => self.send_report(msg.chat_id, ReportWindow::Week).await?,
            menu::REPORT_MONTH => self.send_report(msg.chat_id, ReportWindow::Month).await?,
            menu::EXPORT_SPREADSHEET => self.send_spreadsheet(msg.chat_id).await?,
            menu::EXPORT_CHART => self.send_chart(msg.chat_id).await?,
            _ => {}
        }
        Ok(())
    }

    async fn send_report(&self, chat_id: ChatId, window: ReportWindow) -> Result<()> {
        let text = match self.store.aggregate(window) {
            Ok(rows) => report::render_text_report(window, &rows)
                .unwrap_or_else(|| report::no_data_message(window).to_string()),
            Err(e) => format!("❌ Ошибка при построении отчета:\n{e}"),
        };
        self.messenger.send_text(chat_id, &text).await?;
        Ok(())
    }

    async fn send_spreadsheet(&self, chat_id: ChatId) -> Result<()> {
        let written = self
            .store
            .all_time_aggregate()
            .and_then(|rows| export::write_spreadsheet(&rows, &self.cfg.export_path));

        match written {
            Ok(()) => {
                self.messenger
                    .send_document(chat_id, &self.cfg.export_path)
                    .await?;
            }
            Err(e) => {
                tracing::warn!("spreadsheet export failed: {e}");
                self.messenger
                    .send_text(chat_id, &format!("❌ Ошибка при экспорте таблицы:\n{e}"))
                    .await?;
            }
        }
        Ok(())
    }

    async fn send_chart(&self, chat_id: ChatId) -> Result<()> {
        let pivoted = self
            .store
            .aggregate(ReportWindow::Week)
            .map(|rows| report::pivot_chart_data(&rows));

        match pivoted {
            Ok(None) => {
                self.messenger.send_text(chat_id, NO_CHART_DATA).await?;
            }
            Ok(Some(data)) => match export::draw_chart(&data, &self.cfg.chart_path) {
                Ok(()) => {
                    self.messenger
                        .send_photo(chat_id, &self.cfg.chart_path)
                        .await?;
                }
                Err(e) => {
                    tracing::warn!("chart render failed: {e}");
                    self.messenger
                        .send_text(chat_id, &format!("❌ Ошибка при построении графика:\n{e}"))
                        .await?;
                }
            },
            Err(e) => {
                tracing::warn!("weekly aggregate failed: {e}");
                self.messenger
                    .send_text(chat_id, &format!("❌ Ошибка при построении графика:\n{e}"))
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        category::Category,
        domain::{MessageId, MessageRef, UserId},
        messaging::types::ReplyKeyboard,
    };
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeMessenger {
        next_id: StdMutex<i32>,
        texts: StdMutex<Vec<(ChatId, String)>>,
        keyboards: StdMutex<Vec<(ChatId, String, ReplyKeyboard)>>,
        documents: StdMutex<Vec<PathBuf>>,
        photos: StdMutex<Vec<PathBuf>>,
    }

    impl FakeMessenger {
        fn alloc(&self, chat_id: ChatId) -> MessageRef {
            let mut guard = self.next_id.lock().unwrap();
            *guard += 1;
            MessageRef {
                chat_id,
                message_id: MessageId(*guard),
            }
        }

        fn sent_texts(&self) -> Vec<String> {
            self.texts.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
        }

        fn last_text(&self) -> Option<String> {
            self.sent_texts().last().cloned()
        }

        fn keyboard_count(&self) -> usize {
            self.keyboards.lock().unwrap().len()
        }

        fn message_count(&self) -> usize {
            self.texts.lock().unwrap().len()
                + self.keyboards.lock().unwrap().len()
                + self.documents.lock().unwrap().len()
                + self.photos.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            self.texts.lock().unwrap().push((chat_id, text.to_string()));
            Ok(self.alloc(chat_id))
        }

        async fn send_keyboard(
            &self,
            chat_id: ChatId,
            text: &str,
            keyboard: ReplyKeyboard,
        ) -> Result<MessageRef> {
            self.keyboards
                .lock()
                .unwrap()
                .push((chat_id, text.to_string(), keyboard));
            Ok(self.alloc(chat_id))
        }

        async fn send_document(&self, chat_id: ChatId, path: &Path) -> Result<MessageRef> {
            self.documents.lock().unwrap().push(path.to_path_buf());
            Ok(self.alloc(chat_id))
        }

        async fn send_photo(&self, chat_id: ChatId, path: &Path) -> Result<MessageRef> {
            self.photos.lock().unwrap().push(path.to_path_buf());
            Ok(self.alloc(chat_id))
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        messenger: Arc<FakeMessenger>,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Arc::new(Config {
            bot_token: "123:abc".to_string(),
            shared_password: "секрет".to_string(),
            db_path: dir.path().join("expenses.db"),
            export_path: dir.path().join("export.csv"),
            chart_path: dir.path().join("chart.png"),
        });
        let store = ExpenseStore::open(&cfg.db_path).unwrap();
        let messenger = Arc::new(FakeMessenger::default());
        let dispatcher = Dispatcher::new(cfg, store, messenger.clone());
        Harness {
            dispatcher,
            messenger,
            _dir: dir,
        }
    }

    fn inbound(text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: ChatId(10),
            user_id: UserId(42),
            display_name: "Анна".to_string(),
            text: text.to_string(),
        }
    }

    async fn authorize(h: &Harness) {
        h.dispatcher.dispatch(inbound(menu::START)).await.unwrap();
        h.dispatcher.dispatch(inbound("секрет")).await.unwrap();
    }

    #[tokio::test]
    async fn unauthorized_command_gets_exactly_one_reminder_and_no_state() {
        let h = harness();

        h.dispatcher.dispatch(inbound(menu::ADD_EXPENSE)).await.unwrap();

        assert_eq!(h.messenger.sent_texts(), vec![NOT_AUTHORIZED.to_string()]);
        assert_eq!(h.messenger.keyboard_count(), 0);
        assert!(!h.dispatcher.sessions.is_authorized(UserId(42)).await);
        assert_eq!(h.dispatcher.sessions.conversation(UserId(42)).await, None);
    }

    #[tokio::test]
    async fn unknown_text_outside_a_dialogue_is_ignored() {
        let h = harness();
        authorize(&h).await;
        let before = h.messenger.message_count();

        h.dispatcher.dispatch(inbound("привет")).await.unwrap();

        assert_eq!(h.messenger.message_count(), before);
    }

    #[tokio::test]
    async fn wrong_password_reprompts_and_stays_unauthorized() {
        let h = harness();

        h.dispatcher.dispatch(inbound(menu::START)).await.unwrap();
        assert_eq!(h.messenger.last_text(), Some(PASSWORD_PROMPT.to_string()));

        h.dispatcher.dispatch(inbound("не тот пароль")).await.unwrap();
        assert_eq!(h.messenger.last_text(), Some(PASSWORD_RETRY.to_string()));
        assert!(!h.dispatcher.sessions.is_authorized(UserId(42)).await);
        assert_eq!(
            h.dispatcher.sessions.conversation(UserId(42)).await,
            Some(ConversationState::AwaitingPassword)
        );
    }

    #[tokio::test]
    async fn password_is_trimmed_before_comparison() {
        let h = harness();

        h.dispatcher.dispatch(inbound(menu::START)).await.unwrap();
        h.dispatcher.dispatch(inbound("  секрет  ")).await.unwrap();

        assert!(h.dispatcher.sessions.is_authorized(UserId(42)).await);
        assert_eq!(h.messenger.keyboard_count(), 1);
    }

    #[tokio::test]
    async fn start_when_already_authorized_shows_the_menu_again() {
        let h = harness();
        authorize(&h).await;

        h.dispatcher.dispatch(inbound(menu::START)).await.unwrap();

        assert_eq!(h.messenger.keyboard_count(), 2);
    }

    #[tokio::test]
    async fn full_entry_scenario() {
        let h = harness();

        // Wrong password first.
        h.dispatcher.dispatch(inbound(menu::START)).await.unwrap();
        h.dispatcher.dispatch(inbound("мимо")).await.unwrap();
        assert!(!h.dispatcher.sessions.is_authorized(UserId(42)).await);

        // Correct password: menu appears, caller authorized.
        h.dispatcher.dispatch(inbound("секрет")).await.unwrap();
        assert!(h.dispatcher.sessions.is_authorized(UserId(42)).await);
        assert_eq!(h.messenger.keyboard_count(), 1);

        // Start the entry flow.
        h.dispatcher.dispatch(inbound(menu::ADD_EXPENSE)).await.unwrap();
        assert_eq!(h.messenger.keyboard_count(), 2);

        // Invalid category keeps the state.
        h.dispatcher.dispatch(inbound("Foo")).await.unwrap();
        assert_eq!(
            h.messenger.last_text(),
            Some(dialogue::CATEGORY_RETRY.to_string())
        );
        assert_eq!(
            h.dispatcher.sessions.conversation(UserId(42)).await,
            Some(ConversationState::Entry(EntryState::Category))
        );

        // Category, title, amount.
        h.dispatcher.dispatch(inbound("Еда дома")).await.unwrap();
        assert_eq!(h.messenger.last_text(), Some(dialogue::TITLE_PROMPT.to_string()));

        h.dispatcher.dispatch(inbound("Кофе")).await.unwrap();
        assert_eq!(h.messenger.last_text(), Some(dialogue::AMOUNT_PROMPT.to_string()));

        h.dispatcher.dispatch(inbound("12,50")).await.unwrap();
        assert!(h
            .messenger
            .sent_texts()
            .contains(&"Готово! Еда дома — Кофе — 12.50 ₽".to_string()));
        assert_eq!(h.dispatcher.sessions.conversation(UserId(42)).await, None);
        // Menu re-shown after completion.
        assert_eq!(h.messenger.keyboard_count(), 3);

        let rows = h.dispatcher.store.all_time_aggregate().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user, "Анна");
        assert_eq!(rows[0].category, Category::FoodAtHome);
        assert!((rows[0].total - 12.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn bad_amount_retries_without_inserting() {
        let h = harness();
        authorize(&h).await;

        h.dispatcher.dispatch(inbound(menu::ADD_EXPENSE)).await.unwrap();
        h.dispatcher.dispatch(inbound("Транспорт")).await.unwrap();
        h.dispatcher.dispatch(inbound("Метро")).await.unwrap();

        h.dispatcher.dispatch(inbound("дорого")).await.unwrap();
        assert_eq!(h.messenger.last_text(), Some(dialogue::AMOUNT_RETRY.to_string()));
        assert!(h.dispatcher.store.all_time_aggregate().unwrap().is_empty());

        // Pending category/title survive the failed parse.
        h.dispatcher.dispatch(inbound("60")).await.unwrap();
        let rows = h.dispatcher.store.all_time_aggregate().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, Category::Transport);
        assert!((rows[0].total - 60.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn report_with_no_data_sends_the_no_data_message() {
        let h = harness();
        authorize(&h).await;

        h.dispatcher.dispatch(inbound(menu::REPORT_DAY)).await.unwrap();
        assert_eq!(
            h.messenger.last_text(),
            Some(report::no_data_message(ReportWindow::Day).to_string())
        );
    }

    #[tokio::test]
    async fn report_lists_grouped_sums() {
        let h = harness();
        authorize(&h).await;

        h.dispatcher
            .store
            .insert("Анна", Category::FoodAtHome, "Кофе", 12.5)
            .unwrap();
        h.dispatcher
            .store
            .insert("Анна", Category::FoodAtHome, "Чай", 7.5)
            .unwrap();

        h.dispatcher.dispatch(inbound(menu::REPORT_MONTH)).await.unwrap();

        let text = h.messenger.last_text().unwrap();
        assert!(text.starts_with("📊 Расходы за месяц:"));
        assert!(text.contains("Анна: Еда дома — 20.00 ₽"));
    }

    #[tokio::test]
    async fn export_sends_the_spreadsheet_as_a_document() {
        let h = harness();
        authorize(&h).await;

        h.dispatcher
            .store
            .insert("Анна", Category::Gifts, "Цветы", 900.0)
            .unwrap();

        h.dispatcher
            .dispatch(inbound(menu::EXPORT_SPREADSHEET))
            .await
            .unwrap();

        let docs = h.dispatcher.cfg.export_path.clone();
        assert_eq!(h.messenger.documents.lock().unwrap().as_slice(), &[docs.clone()]);
        let contents = std::fs::read_to_string(&docs).unwrap();
        assert!(contents.contains("Анна,Подарки,900.00"));
    }

    #[tokio::test]
    async fn empty_week_chart_reports_no_data_and_leaves_no_file() {
        let h = harness();
        authorize(&h).await;

        h.dispatcher.dispatch(inbound(menu::EXPORT_CHART)).await.unwrap();

        assert_eq!(h.messenger.last_text(), Some(NO_CHART_DATA.to_string()));
        assert!(h.messenger.photos.lock().unwrap().is_empty());
        assert!(!h.dispatcher.cfg.chart_path.exists());
    }

    #[tokio::test]
    async fn callers_are_isolated_from_each_other() {
        let h = harness();
        authorize(&h).await;

        let other = InboundMessage {
            chat_id: ChatId(20),
            user_id: UserId(99),
            display_name: "Борис".to_string(),
            text: menu::ADD_EXPENSE.to_string(),
        };
        h.dispatcher.dispatch(other).await.unwrap();

        // The second caller never authenticated.
        assert_eq!(h.messenger.last_text(), Some(NOT_AUTHORIZED.to_string()));
        assert!(h.dispatcher.sessions.is_authorized(UserId(42)).await);
        assert!(!h.dispatcher.sessions.is_authorized(UserId(99)).await);
    }
}
