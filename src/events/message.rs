use poise::serenity_prelude as serenity;
use tracing::{debug, error};

use crate::managers::AnswerOutcome;
use crate::messages;
use crate::{Data, Error};

/// Handle incoming messages
pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    // Ignore bot messages
    if msg.author.bot {
        return Ok(());
    }

    // Only DMs carry application answers
    if msg.guild_id.is_none() {
        return handle_dm_answer(ctx, msg, data).await;
    }

    Ok(())
}

/// Treat a DM as the answer to the sender's current application question
async fn handle_dm_answer(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    let user_id = msg.author.id;
    let application_manager = &data.application_manager;

    // Content is taken verbatim; there is no session for most DMs
    let Some(outcome) = application_manager.record_answer(user_id, &msg.content) else {
        return Ok(());
    };

    debug!("Recorded application answer from {}", msg.author.name);

    match outcome {
        AnswerOutcome::NextQuestion(question) => {
            msg.channel_id.say(&ctx.http, question).await?;
        }
        AnswerOutcome::Completed(completed) => {
            let staff_channel = match application_manager.submit(user_id, &completed).await {
                Ok(channel) => channel,
                Err(e) => {
                    error!(
                        "Failed to submit application for {}: {}",
                        msg.author.name, e
                    );
                    msg.channel_id
                        .say(
                            &ctx.http,
                            "❌ Your application could not be submitted. Please contact an administrator.",
                        )
                        .await?;
                    return Err(e.into());
                }
            };

            let embed = review_embed(user_id, &completed.questions, &completed.answers);
            let components = vec![serenity::CreateActionRow::Buttons(vec![
                serenity::CreateButton::new(format!("app_accept_{}", user_id))
                    .label("Accept")
                    .style(serenity::ButtonStyle::Success),
                serenity::CreateButton::new(format!("app_deny_{}", user_id))
                    .label("Deny")
                    .style(serenity::ButtonStyle::Danger),
            ])];

            staff_channel
                .send_message(
                    &ctx.http,
                    serenity::CreateMessage::new()
                        .embed(embed)
                        .components(components),
                )
                .await?;

            msg.channel_id
                .say(&ctx.http, messages::submitted_message(&completed.form_name))
                .await?;
        }
    }

    Ok(())
}

/// Staff review embed: one field per Q/A pair, applicant id in the footer
fn review_embed(
    user_id: serenity::UserId,
    questions: &[String],
    answers: &[String],
) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title("New Application")
        .color(0x3498db);

    for (question, answer) in questions.iter().zip(answers.iter()) {
        embed = embed.field(question, answer, false);
    }

    embed.footer(serenity::CreateEmbedFooter::new(format!(
        "User ID: {}",
        user_id
    )))
}
