use super::BotContext;
use crate::core::service_manager::{Error as ServiceManagerError, Service};
use crate::database::DatabaseService;
use crate::events::{InboundEvent, TOKEN_DEPOSIT_START};
use crate::notify::{render, TelegramNotifier};
use crate::workflow::DepositWorkflow;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{error, warn};

type Workflow = DepositWorkflow<DatabaseService, TelegramNotifier>;

/// Maps Telegram updates onto the workflow: private-chat messages feed the
/// conversational form, callback queries feed the claim/decision buttons.
pub struct TelegramService {
    bot: Bot,
    workflow: Arc<Workflow>,
}

#[async_trait]
impl Service for TelegramService {
    type Context = BotContext;

    async fn new(context: BotContext) -> Self {
        let bot = Bot::from_env();
        let notifier = Arc::new(TelegramNotifier::new(bot.clone()));
        let workflow = Arc::new(DepositWorkflow::new(
            context.store,
            notifier,
            context.context.config.telegram.admin_channel_id,
        ));

        Self { bot, workflow }
    }

    async fn run(self) -> Result<(), ServiceManagerError> {
        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(Self::handle_message))
            .branch(Update::filter_callback_query().endpoint(Self::handle_callback));

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.workflow])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
        Ok(())
    }
}

impl TelegramService {
    async fn handle_message(
        bot: Bot,
        msg: Message,
        workflow: Arc<Workflow>,
    ) -> ResponseResult<()> {
        // The form only runs in private chats; chatter in the admin channel
        // is not form input.
        if !msg.chat.is_private() {
            return respond(());
        }

        let user_id = msg.chat.id.0;
        let username = msg.from().and_then(|from| from.username.clone());

        if msg.text() == Some("/start") {
            let keyboard = InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
                "💰 Make a deposit",
                TOKEN_DEPOSIT_START,
            )]]);
            bot.send_message(msg.chat.id, render::greeting())
                .reply_markup(keyboard)
                .await?;
            return respond(());
        }

        let event = if let Some(text) = msg.text() {
            InboundEvent::Text {
                user_id,
                username,
                text: text.to_string(),
            }
        } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
            InboundEvent::Photo {
                user_id,
                username,
                evidence_ref: photo.file.id.clone(),
            }
        } else {
            return respond(());
        };

        // One task per inbound event; a failure here never touches other
        // users' sessions.
        tokio::spawn(async move {
            if let Err(e) = workflow.handle_event(event).await {
                warn!(user_id, error = %e, "Event handling failed");
                let _ = bot
                    .send_message(msg.chat.id, render::error_feedback(&e))
                    .await;
            }
        });

        respond(())
    }

    async fn handle_callback(
        bot: Bot,
        query: CallbackQuery,
        workflow: Arc<Workflow>,
    ) -> ResponseResult<()> {
        let actor_id = query.from.id.0 as i64;
        let Some(token) = query.data.clone() else {
            return respond(());
        };

        tokio::spawn(async move {
            let feedback = match workflow.handle_button(actor_id, &token).await {
                Ok(feedback) => feedback,
                Err(e) => {
                    warn!(actor_id, %token, error = %e, "Button handling failed");
                    Some(render::error_feedback(&e))
                }
            };

            let mut answer = bot.answer_callback_query(query.id);
            if let Some(text) = feedback {
                answer = answer.text(text);
            }
            if let Err(e) = answer.await {
                error!(actor_id, error = %e, "Could not answer callback query");
            }
        });

        respond(())
    }
}
