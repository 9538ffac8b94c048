//! Tally board command - the live display.
//!
//! `/tally` posts the board and animates it by editing the message. Discord rate-limits
//! edits, so only every `edit_stride`-th frame is pushed, plus the final settled frame.
//! The message keeps following display reloads for `live_board_secs`; a reload that
//! changes a total re-arms that counter and the board animates again.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, render},
        core::counter::BoardPlayer,
        errors::{Error, Result},
    };
    use tokio::{sync::watch, time::Instant};
    use tracing::debug;

    /// The message is posted in full view
    const FULLY_VISIBLE: f64 = 1.0;

    /// Shows the donation total, donor count and goal as an animated board.
    #[poise::command(slash_command, prefix_command)]
    pub async fn tally(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();

        let (board, totals, mut reloads) = {
            let mut view = data.display.write().await;
            view.reload_donations().await?;
            (view.new_board(), view.totals(), view.subscribe_reloads())
        };
        reloads.mark_unchanged();

        let handle = ctx
            .send(poise::CreateReply::default().embed(render::board_embed(&board.frame(), &totals)))
            .await?;
        let mut player = BoardPlayer::new(board, FULLY_VISIBLE);

        let live_until = Instant::now() + data.settings.discord.live_board();
        loop {
            play_board(ctx, &handle, &mut player, &mut reloads).await?;

            match tokio::time::timeout_at(live_until, reloads.changed()).await {
                Ok(Ok(())) => {
                    let totals = data.display.read().await.totals();
                    debug!("Board retargeted to {:?}", totals);
                    player.retarget(&totals);
                }
                Ok(Err(_)) | Err(_) => break,
            }
        }

        debug!("Board for {} is no longer live", ctx.id());
        Ok(())
    }

    /// Plays the board until every counter settles, editing `handle` along the way.
    ///
    /// A reload that lands mid-animation retargets the player before the next frame,
    /// which discards the superseded interpolation.
    async fn play_board(
        ctx: poise::Context<'_, BotData, Error>,
        handle: &poise::ReplyHandle<'_>,
        player: &mut BoardPlayer,
        reloads: &mut watch::Receiver<u64>,
    ) -> Result<()> {
        let data = ctx.data();
        let stride = data.settings.discord.edit_stride;
        let mut totals = data.display.read().await.totals();

        loop {
            if reloads.has_changed().unwrap_or(false) {
                reloads.mark_unchanged();
                totals = data.display.read().await.totals();
                player.retarget(&totals);
            }

            let Some(played) = player.next_frame().await else {
                return Ok(());
            };
            if played.is_published(stride) {
                handle
                    .edit(
                        ctx,
                        poise::CreateReply::default()
                            .embed(render::board_embed(&played.frame, &totals)),
                    )
                    .await?;
            }
        }
    }
}

// Re-export all commands
pub use inner::*;
