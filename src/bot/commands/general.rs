//! General Discord commands - ping and help.
//! This module contains simple commands that don't touch storage and provide basic
//! bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Donation Tally Help**\n\
        Here is a summary of all available commands.\n\n\
        **Donations**\n\
        • `/donate <amount> <donor> [message]` - Records a donation. Amounts may use separators, e.g. `50.000`.\n\
        • `/donations` - Lists recorded donations, newest first.\n\
        • `/delete_donation <id>` - Deletes a donation after you confirm.\n\n\
        **Display**\n\
        • `/tally` - Shows the live board with the total, donor count and monthly goal.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
