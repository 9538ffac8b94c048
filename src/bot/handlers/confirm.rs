//! Button confirmation for destructive commands.
//!
//! The prompt is sent with two buttons and the first press by the invoking user decides.
//! No press within the timeout counts as a decline, and so does a failure to send the
//! prompt.

use crate::{
    bot::Context,
    core::mutation::Confirm,
    errors::Result,
};
use poise::serenity_prelude as serenity;
use std::time::Duration;
use tracing::{debug, error};

/// Asks the command's author through a Delete / Cancel button pair.
pub struct ButtonConfirm<'a> {
    ctx: Context<'a>,
    detail: String,
    timeout: Duration,
}

impl<'a> ButtonConfirm<'a> {
    /// Prompt for `ctx` that shows `detail` under the question.
    #[must_use]
    pub const fn new(ctx: Context<'a>, detail: String, timeout: Duration) -> Self {
        Self {
            ctx,
            detail,
            timeout,
        }
    }

    async fn ask(&self, prompt: &str) -> Result<bool> {
        let ctx_id = self.ctx.id();
        let confirm_id = format!("{ctx_id}confirm");
        let cancel_id = format!("{ctx_id}cancel");

        let buttons = serenity::CreateActionRow::Buttons(vec![
            serenity::CreateButton::new(&confirm_id)
                .label("Delete")
                .style(serenity::ButtonStyle::Danger),
            serenity::CreateButton::new(&cancel_id)
                .label("Cancel")
                .style(serenity::ButtonStyle::Secondary),
        ]);
        self.ctx
            .send(
                poise::CreateReply::default()
                    .content(format!("⚠️ {prompt}\n{}", self.detail))
                    .components(vec![buttons]),
            )
            .await?;

        let press = serenity::ComponentInteractionCollector::new(self.ctx)
            .author_id(self.ctx.author().id)
            .filter(move |press| press.data.custom_id.starts_with(&ctx_id.to_string()))
            .timeout(self.timeout)
            .await;
        let Some(press) = press else {
            debug!("Confirmation timed out after {:?}", self.timeout);
            return Ok(false);
        };

        let approved = press.data.custom_id == confirm_id;
        let outcome = if approved { "Confirmed." } else { "Cancelled." };
        press
            .create_response(
                self.ctx.serenity_context(),
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .content(format!("{outcome}\n{}", self.detail))
                        .components(Vec::new()),
                ),
            )
            .await?;
        Ok(approved)
    }
}

impl Confirm for ButtonConfirm<'_> {
    async fn confirm(&self, prompt: &str) -> bool {
        match self.ask(prompt).await {
            Ok(approved) => approved,
            Err(e) => {
                error!("Confirmation prompt failed: {}", e);
                false
            }
        }
    }
}
