use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{Context, Error};

/// Check if the bot is running
#[poise::command(prefix_command, slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    info!("Ping command called by {}", ctx.author().name);
    ctx.send(
        poise::CreateReply::default()
            .content("Pong! Bot is working!")
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Show help information
#[poise::command(prefix_command, slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("Application Bot Help")
        .field("createform <name>", "Create a new application form (Admin)", false)
        .field(
            "recreateform <name>",
            "Overwrite an existing form with a blank one (Admin)",
            false,
        )
        .field("deleteform <name>", "Delete a form (Admin)", false)
        .field("addquestion <form> <question>", "Append a question (Admin)", false)
        .field(
            "createpanel <form> <channel>",
            "Post an Apply panel in a channel (Admin)",
            false,
        )
        .field("setrole <form> <role>", "Set the accepted role (Admin)", false)
        .field(
            "setchannel <form> <channel>",
            "Set the submission review channel (Admin)",
            false,
        )
        .field(
            "setcategory <form> <category>",
            "Set the ticket category (Admin)",
            false,
        )
        .field(
            "setcooldown <form> <hours>",
            "Set the reapply cooldown (Admin)",
            false,
        )
        .field("banapply <user> <hours>", "Ban a user from applying (Admin)", false)
        .field("unbanapply <user>", "Remove an apply ban (Admin)", false)
        .color(0x2f3136);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
