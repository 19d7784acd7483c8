use poise::serenity_prelude as serenity;
use tracing::info;

use crate::error::BotError;
use crate::{Context, Error};

/// Create a new application form
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn createform(
    ctx: Context<'_>,
    #[description = "Form name"] name: String,
) -> Result<(), Error> {
    ctx.data().form_manager.create(&name).await?;
    ctx.say(format!("Form `{}` created.", name)).await?;
    Ok(())
}

/// Overwrite an existing form with a blank one
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn recreateform(
    ctx: Context<'_>,
    #[description = "Form name"] name: String,
) -> Result<(), Error> {
    ctx.data().form_manager.recreate(&name).await?;
    ctx.say(format!(
        "Form `{}` recreated. Questions and settings were reset.",
        name
    ))
    .await?;
    Ok(())
}

/// Delete an application form
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn deleteform(
    ctx: Context<'_>,
    #[description = "Form name"] name: String,
) -> Result<(), Error> {
    ctx.data().form_manager.delete(&name).await?;
    ctx.say(format!("Form `{}` deleted.", name)).await?;
    Ok(())
}

/// Append a question to a form
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn addquestion(
    ctx: Context<'_>,
    #[description = "Form name"] form: String,
    #[description = "Question text"]
    #[rest]
    question: String,
) -> Result<(), Error> {
    ctx.data().form_manager.add_question(&form, &question).await?;
    ctx.say("Question added.").await?;
    Ok(())
}

/// Post an Apply panel bound to a form in a channel
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn createpanel(
    ctx: Context<'_>,
    #[description = "Form name"] form: String,
    #[description = "Channel to post the panel in"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    // Refuse to post a panel for a form that cannot be applied to
    let definition =
        ctx.data()
            .form_manager
            .get(&form)
            .await
            .ok_or_else(|| BotError::FormNotFound {
                name: form.clone(),
            })?;
    if definition.questions.is_empty() {
        return Err(BotError::FormHasNoQuestions { name: form }.into());
    }

    let components = vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("apply_{}", form))
            .label("Apply")
            .style(serenity::ButtonStyle::Success),
    ])];

    channel
        .send_message(
            ctx.http(),
            serenity::CreateMessage::new()
                .content(format!("Apply for **{}**", form))
                .components(components),
        )
        .await?;

    info!(
        "Panel for form '{}' posted in #{} by {}",
        form,
        channel.name,
        ctx.author().name
    );
    ctx.say(format!("Panel for `{}` posted in #{}.", form, channel.name))
        .await?;
    Ok(())
}

/// Set the role granted on acceptance
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setrole(
    ctx: Context<'_>,
    #[description = "Form name"] form: String,
    #[description = "Role granted when accepted"] role: serenity::Role,
) -> Result<(), Error> {
    ctx.data().form_manager.set_role(&form, role.id).await?;
    ctx.say("Role set.").await?;
    Ok(())
}

/// Set the channel completed applications are posted to
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setchannel(
    ctx: Context<'_>,
    #[description = "Form name"] form: String,
    #[description = "Staff review channel"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    ctx.data().form_manager.set_channel(&form, channel.id).await?;
    ctx.say("Submission channel set.").await?;
    Ok(())
}

/// Set the category ticket channels are created under
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setcategory(
    ctx: Context<'_>,
    #[description = "Form name"] form: String,
    #[description = "Ticket category"] category: serenity::GuildChannel,
) -> Result<(), Error> {
    if category.kind != serenity::ChannelType::Category {
        ctx.say("That channel is not a category.").await?;
        return Ok(());
    }
    ctx.data()
        .form_manager
        .set_category(&form, category.id)
        .await?;
    ctx.say("Ticket category set.").await?;
    Ok(())
}

/// Set the reapply cooldown in hours
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setcooldown(
    ctx: Context<'_>,
    #[description = "Form name"] form: String,
    #[description = "Cooldown in hours"] hours: u64,
) -> Result<(), Error> {
    ctx.data().form_manager.set_cooldown(&form, hours).await?;
    ctx.say("Cooldown updated.").await?;
    Ok(())
}
