//! Donation Discord commands - entry, listing and deletion.
//!
//! Each invocation mounts a fresh mutation view, so every command starts from the
//! collection as currently stored, including writes made by other tabs.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{autocomplete, confirm::ButtonConfirm},
            render,
        },
        core::{format::format_rupiah, mutation::DeleteOutcome},
        errors::{Error, Result},
    };

    /// Records a new donation.
    ///
    /// The amount accepts thousands separators (`50.000`). Invalid input is reported back
    /// and nothing is stored.
    #[poise::command(slash_command, prefix_command)]
    pub async fn donate(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Amount in Rupiah, e.g. 50.000"] amount: String,
        #[description = "Name of the donor"] donor: String,
        #[description = "Optional message from the donor"] message: Option<String>,
    ) -> Result<()> {
        let mut view = ctx.data().mount_mutation().await?;

        let reply = match view.add_donation(&amount, &donor, message.as_deref()).await {
            Ok(record) => format!(
                "✅ Donation added!\n{}",
                render::donation_line(&record)
            ),
            Err(e) if e.is_user_facing() => format!("❌ {e}"),
            Err(e) => return Err(e),
        };

        ctx.say(reply).await?;
        Ok(())
    }

    /// Lists recorded donations, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn donations(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let view = data.mount_mutation().await?;
        let totals = view.totals(data.settings.tally.monthly_goal);

        ctx.say(render::donation_list(
            &view.listing(),
            &totals,
            render::LIST_LIMIT,
        ))
        .await?;
        Ok(())
    }

    /// Deletes a donation after a button confirmation.
    #[poise::command(slash_command, prefix_command)]
    pub async fn delete_donation(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "ID of the donation to delete"]
        #[autocomplete = "autocomplete::autocomplete_donation_id"]
        id: String,
    ) -> Result<()> {
        let data = ctx.data();
        let mut view = data.mount_mutation().await?;

        let Some(record) = view.find(&id) else {
            ctx.say(format!(
                "❌ Donation `{id}` not found. Use `/donations` to see recorded donations."
            ))
            .await?;
            return Ok(());
        };

        let confirm = ButtonConfirm::new(
            ctx,
            render::donation_line(record),
            data.settings.discord.confirm_timeout(),
        );
        let reply = match view.delete_donation(&id, &confirm).await? {
            DeleteOutcome::Deleted(record) => format!(
                "🗑️ Deleted donation `{}` of {} from {}.",
                record.id,
                format_rupiah(record.amount),
                record.donor
            ),
            DeleteOutcome::Declined => "Deletion cancelled.".to_string(),
            DeleteOutcome::NotFound => {
                format!("❌ Donation `{id}` no longer exists, nothing was deleted.")
            }
        };

        ctx.say(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
