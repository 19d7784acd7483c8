use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{Context, Error};

/// Ban a user from applying for a number of hours
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn banapply(
    ctx: Context<'_>,
    #[description = "User to ban from applying"] user: serenity::User,
    #[description = "Ban duration in hours"] hours: u64,
) -> Result<(), Error> {
    let expiry = ctx.data().ban_manager.ban(user.id, hours).await?;
    info!(
        "{} banned {} from applying for {}h",
        ctx.author().name,
        user.name,
        hours
    );
    ctx.say(format!(
        "User banned from applying until {}.",
        expiry.format("%Y-%m-%d %H:%M UTC")
    ))
    .await?;
    Ok(())
}

/// Remove a user's apply ban
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn unbanapply(
    ctx: Context<'_>,
    #[description = "User to unban"] user: serenity::User,
) -> Result<(), Error> {
    ctx.data().ban_manager.unban(user.id).await?;
    ctx.say("User unbanned.").await?;
    Ok(())
}
