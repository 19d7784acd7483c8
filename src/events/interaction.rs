use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;
use tracing::{error, info, warn};

use crate::error::BotError;
use crate::managers::BeginApplication;
use crate::messages;
use crate::{Data, Error};

/// Handle component interactions from panels and review prompts.
///
/// Custom ids are stateless (`apply_<form>`, `app_accept_<user>`,
/// `app_deny_<user>`) so buttons keep working across restarts.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> Result<(), Error> {
    let Some(component) = interaction.as_message_component() else {
        return Ok(());
    };

    let custom_id = component.data.custom_id.clone();
    if let Some(form_name) = custom_id.strip_prefix("apply_") {
        handle_apply(ctx, component, data, form_name).await
    } else if let Some(user_id) = custom_id.strip_prefix("app_accept_") {
        handle_review(ctx, component, data, user_id, ReviewAction::Accept).await
    } else if let Some(user_id) = custom_id.strip_prefix("app_deny_") {
        handle_review(ctx, component, data, user_id, ReviewAction::Deny).await
    } else {
        Ok(())
    }
}

/// Panel "Apply" button: ban check, exclusivity check, then first DM question
async fn handle_apply(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    form_name: &str,
) -> Result<(), Error> {
    let user_id = component.user.id;
    info!(
        "Apply button for '{}' clicked by {} (ID: {})",
        form_name, component.user.name, user_id
    );

    let begin = match data.application_manager.try_begin(user_id, form_name).await {
        Ok(begin) => begin,
        Err(e) => {
            warn!("Could not start application for {}: {}", user_id, e);
            respond_ephemeral(ctx, component, &format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    match begin {
        BeginApplication::Banned { until } => {
            respond_ephemeral(ctx, component, &messages::banned_message(until)).await?;
        }
        BeginApplication::InFlight => {
            respond_ephemeral(ctx, component, &messages::in_flight_message()).await?;
        }
        BeginApplication::Started { question } => {
            respond_ephemeral(ctx, component, &messages::check_dms_message(form_name)).await?;

            let dm_result = async {
                let dm = component.user.create_dm_channel(&ctx.http).await?;
                dm.id.say(&ctx.http, question).await
            }
            .await;

            if let Err(e) = dm_result {
                // No DM, no flow: release the session so they can retry
                error!("Failed to DM first question to {}: {}", user_id, e);
                data.application_manager.cancel(user_id);
                component
                    .create_followup(
                        &ctx.http,
                        serenity::CreateInteractionResponseFollowup::new()
                            .content(messages::dm_failed_message())
                            .ephemeral(true),
                    )
                    .await?;
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum ReviewAction {
    Accept,
    Deny,
}

/// Staff Accept/Deny buttons on a review prompt
async fn handle_review(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    applicant_id: &str,
    action: ReviewAction,
) -> Result<(), Error> {
    // Channel visibility alone is not trusted for review decisions
    if !member_is_admin(component) {
        respond_ephemeral(
            ctx,
            component,
            "⛔ Only administrators can resolve applications.",
        )
        .await?;
        return Ok(());
    }

    let applicant = match applicant_id.parse::<u64>() {
        Ok(id) if id > 0 => serenity::UserId::new(id),
        _ => {
            respond_ephemeral(ctx, component, "❌ Malformed review button.").await?;
            return Ok(());
        }
    };

    // The side effects (role grant, ticket creation) can outlast the 3s
    // interaction window, so acknowledge first and follow up after
    component
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Acknowledge)
        .await?;

    let outcome = match action {
        ReviewAction::Accept => accept_application(ctx, component, data, applicant).await,
        ReviewAction::Deny => deny_application(ctx, data, applicant).await,
    };

    match outcome {
        Ok(message) => {
            info!(
                "Application for user {} resolved as {:?} by {}",
                applicant, action, component.user.name
            );
            component
                .create_followup(
                    &ctx.http,
                    serenity::CreateInteractionResponseFollowup::new().content(message),
                )
                .await?;
        }
        Err(e) => {
            error!(
                "Failed to resolve application for user {} as {:?}: {}",
                applicant, action, e
            );
            component
                .create_followup(
                    &ctx.http,
                    serenity::CreateInteractionResponseFollowup::new()
                        .content(format!("❌ Could not resolve application: {}", e))
                        .ephemeral(true),
                )
                .await?;
        }
    }

    Ok(())
}

/// Accept: grant role, notify applicant, open a ticket channel, re-arm the
/// reapply cooldown. Any unresolved entity fails the whole action before the
/// ban is re-armed or the record dropped.
async fn accept_application(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    applicant: serenity::UserId,
) -> crate::error::Result<String> {
    let resolution = data.application_manager.resolve_review(applicant).await?;

    let guild_id = component.guild_id.ok_or(BotError::GuildNotFound)?;
    let member = guild_id
        .member(&ctx.http, applicant)
        .await
        .map_err(|_| BotError::MemberNotFound {
            user_id: applicant.to_string(),
        })?;

    // The configured role may have been deleted since it was bound
    let roles = guild_id.roles(&ctx.http).await?;
    if !roles.contains_key(&resolution.role) {
        return Err(BotError::RoleNotFound {
            id: resolution.role.to_string(),
        });
    }
    member.add_role(&ctx.http, resolution.role).await?;

    member
        .user
        .dm(
            &ctx.http,
            serenity::CreateMessage::new().content(messages::accepted_message()),
        )
        .await?;

    let ticket = guild_id
        .create_channel(
            &ctx.http,
            serenity::CreateChannel::new(format!("ticket-{}", member.user.name))
                .kind(serenity::ChannelType::Text)
                .category(resolution.category),
        )
        .await?;
    ticket
        .say(&ctx.http, messages::ticket_welcome(&member.mention().to_string()))
        .await?;

    data.application_manager
        .finalize_accept(applicant, resolution.cooldown_hours)
        .await?;

    Ok(format!(
        "✅ Accepted. Ticket {} opened, reapply cooldown set to {}h.",
        ticket.mention(),
        resolution.cooldown_hours
    ))
}

/// Deny: drop the record and tell the applicant. Never touches the ban
/// ledger, never grants anything.
async fn deny_application(
    ctx: &serenity::Context,
    data: &Data,
    applicant: serenity::UserId,
) -> crate::error::Result<String> {
    data.application_manager.finalize_deny(applicant).await?;

    // Best effort: the applicant may have left or closed DMs
    match applicant.create_dm_channel(&ctx.http).await {
        Ok(dm) => {
            if let Err(e) = dm.id.say(&ctx.http, messages::denied_message()).await {
                warn!("Could not DM denial to {}: {}", applicant, e);
            }
        }
        Err(e) => warn!("Could not open DM with {}: {}", applicant, e),
    }

    Ok("❌ Denied.".to_string())
}

fn member_is_admin(component: &serenity::ComponentInteraction) -> bool {
    component
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .map(|permissions| permissions.administrator())
        .unwrap_or(false)
}

async fn respond_ephemeral(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    content: &str,
) -> Result<(), serenity::Error> {
    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await
}
