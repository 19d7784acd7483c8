use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

/// Discord bot for application intake: panels, DM forms, and staff review
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Force re-sync of slash commands to all guilds (use when commands aren't showing up)
    #[arg(long, short = 's')]
    sync_commands: bool,

    /// Register commands per-guild instead of globally (faster for testing)
    #[arg(long)]
    guild_commands: bool,

    /// Specific guild ID to sync commands to (for testing)
    #[arg(long)]
    guild_id: Option<u64>,
}

mod commands;
mod error;
mod events;
mod managers;
mod messages;
mod state;

use commands::{
    addquestion, banapply, createform, createpanel, deleteform, help, ping, recreateform,
    setcategory, setchannel, setcooldown, setrole, unbanapply,
};
use events::{handle_interaction, handle_message};
use managers::{
    create_shared_application_manager, create_shared_ban_manager, create_shared_form_manager,
    SharedApplicationManager, SharedBanManager, SharedFormManager,
};
use state::{ApplicationStore, BanLedger, FormRegistry, JsonStore};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Minutes of DM silence before an in-flight application expires
const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 30;

/// Seconds between sweeps for expired sessions
const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

/// Shared application state
pub struct Data {
    pub form_manager: SharedFormManager,
    pub ban_manager: SharedBanManager,
    pub application_manager: SharedApplicationManager,
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = handle_message(ctx, new_message, data).await {
                error!("Failed to handle message: {}", e);
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Err(e) = handle_interaction(ctx, interaction, data).await {
                error!("Failed to handle interaction: {}", e);
            }
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_max_level(tracing::Level::INFO)
        .init();

    let token = std::env::var("DISCORD_TOKEN").expect("Missing DISCORD_TOKEN environment variable");

    // Extract bot/application ID from token (first part before the dot, base64 encoded)
    if let Some(bot_id_b64) = token.split('.').next() {
        use base64::Engine;
        // Discord tokens use base64 without padding, sometimes URL-safe
        let decoded = base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(bot_id_b64)
            .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bot_id_b64));
        if let Ok(decoded) = decoded {
            if let Ok(id_str) = String::from_utf8(decoded) {
                info!(
                    "Bot ID: {} (configure intents at https://discord.com/developers/applications/{}/bot)",
                    id_str, id_str
                );
            }
        }
    }

    let prefix = std::env::var("PREFIX").unwrap_or_else(|_| "-".to_string());
    let owner_id = std::env::var("OWNER_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::UserId::new);
    let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| "data".to_string());
    let session_timeout_secs = std::env::var("APPLY_SESSION_TIMEOUT_MINUTES")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SESSION_TIMEOUT_MINUTES)
        * 60;

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_path).await.ok();

    // Open the three persisted documents
    info!("Loading stores from {}...", data_path);
    let forms = std::sync::Arc::new(
        JsonStore::<FormRegistry>::open(&format!("{}/forms.json", data_path)).await?,
    );
    let bans = std::sync::Arc::new(
        JsonStore::<BanLedger>::open(&format!("{}/bans.json", data_path)).await?,
    );
    let applications = std::sync::Arc::new(
        JsonStore::<ApplicationStore>::open(&format!("{}/applications.json", data_path)).await?,
    );

    // Create managers
    let form_manager = create_shared_form_manager(forms.clone());
    let ban_manager = create_shared_ban_manager(bans.clone());
    let application_manager = create_shared_application_manager(
        forms.clone(),
        ban_manager.clone(),
        applications.clone(),
        session_timeout_secs,
    );

    info!(
        "Loaded {} form(s); DM session timeout is {}s",
        form_manager.form_names().await.len(),
        session_timeout_secs
    );

    // Extract CLI flags for use in setup
    let sync_commands = args.sync_commands;
    let guild_commands = args.guild_commands;
    let target_guild_id = args.guild_id;

    if sync_commands {
        info!("--sync-commands: Will force re-register slash commands");
    }
    if guild_commands {
        info!("--guild-commands: Will register commands per-guild (faster for testing)");
    } else {
        info!("Registering commands globally by default (takes up to 1 hour to propagate)");
    }
    if let Some(gid) = target_guild_id {
        info!("--guild-id: Targeting specific guild {}", gid);
    }

    // Build framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                ping(),
                help(),
                createform(),
                recreateform(),
                deleteform(),
                addquestion(),
                createpanel(),
                setrole(),
                setchannel(),
                setcategory(),
                setcooldown(),
                banapply(),
                unbanapply(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            owners: owner_id.into_iter().collect(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {}) in {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                        ctx.guild_id()
                            .map(|g| g.to_string())
                            .unwrap_or_else(|| "DM".to_string())
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' completed for {}",
                        ctx.command().qualified_name,
                        ctx.author().name
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!(
                                "Error in command '{}': {}",
                                ctx.command().qualified_name,
                                error
                            );
                            let _ = ctx.say(format!("An error occurred: {}", error)).await;
                        }
                        poise::FrameworkError::ArgumentParse {
                            error, input, ctx, ..
                        } => {
                            error!(
                                "Argument parse error in '{}': {} (input: {:?})",
                                ctx.command().qualified_name,
                                error,
                                input
                            );
                            let _ = ctx
                                .say(format!("Invalid argument: {}", error))
                                .await;
                        }
                        poise::FrameworkError::MissingBotPermissions {
                            missing_permissions,
                            ctx,
                            ..
                        } => {
                            error!(
                                "Bot missing permissions for '{}': {:?}",
                                ctx.command().qualified_name,
                                missing_permissions
                            );
                            let _ = ctx
                                .say(format!(
                                    "Bot is missing permissions: {:?}",
                                    missing_permissions
                                ))
                                .await;
                        }
                        poise::FrameworkError::MissingUserPermissions {
                            missing_permissions,
                            ctx,
                            ..
                        } => {
                            error!(
                                "User {} missing permissions for '{}': {:?}",
                                ctx.author().name,
                                ctx.command().qualified_name,
                                missing_permissions
                            );
                        }
                        poise::FrameworkError::NotAnOwner { ctx, .. } => {
                            error!(
                                "User {} tried to use owner command '{}'",
                                ctx.author().name,
                                ctx.command().qualified_name
                            );
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            error!(
                                "Command '{}' is guild-only, used in DM by {}",
                                ctx.command().qualified_name,
                                ctx.author().name
                            );
                        }
                        other => {
                            error!("Other framework error: {}", other);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let form_manager = form_manager.clone();
            let ban_manager = ban_manager.clone();
            let application_manager = application_manager.clone();

            Box::pin(async move {
                info!("Bot logged in as: {}", ready.user.name);

                // Determine which guilds to register commands for
                let guilds_to_register: Vec<serenity::GuildId> = if let Some(gid) = target_guild_id
                {
                    vec![serenity::GuildId::new(gid)]
                } else {
                    ready.guilds.iter().map(|g| g.id).collect()
                };

                if guild_commands || sync_commands {
                    // Register commands per-guild (faster for testing)
                    for guild_id in &guilds_to_register {
                        info!("Registering commands to guild: {}", guild_id);
                        if let Err(e) = poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            *guild_id,
                        )
                        .await
                        {
                            error!("Failed to register commands for guild {}: {}", guild_id, e);
                        } else {
                            info!(
                                "Successfully registered {} commands for guild {}",
                                framework.options().commands.len(),
                                guild_id
                            );
                        }
                    }
                } else {
                    // Default: Register commands globally
                    info!("Registering commands globally...");
                    if let Err(e) =
                        poise::builtins::register_globally(ctx, &framework.options().commands).await
                    {
                        error!("Failed to register commands globally: {}", e);
                    } else {
                        info!(
                            "Successfully registered {} commands globally (may take up to 1 hour to propagate)",
                            framework.options().commands.len()
                        );
                    }
                }

                // Sweep expired DM sessions so abandoned applications release
                // their resources instead of waiting forever
                let sweeper_manager = application_manager.clone();
                let http = ctx.http.clone();
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                        SESSION_SWEEP_INTERVAL_SECS,
                    ));
                    loop {
                        interval.tick().await;
                        for (user_id, form_name) in sweeper_manager.expire_stale_sessions() {
                            match user_id.create_dm_channel(&http).await {
                                Ok(dm) => {
                                    if let Err(e) = dm
                                        .id
                                        .say(&http, messages::timed_out_message(&form_name))
                                        .await
                                    {
                                        warn!(
                                            "Could not notify {} of session timeout: {}",
                                            user_id, e
                                        );
                                    }
                                }
                                Err(e) => {
                                    warn!("Could not open DM with {} for timeout: {}", user_id, e)
                                }
                            }
                        }
                    }
                });

                Ok(Data {
                    form_manager,
                    ban_manager,
                    application_manager,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    // Log which privileged intents we're requesting
    let privileged_intents: Vec<&str> = vec![
        if intents.contains(serenity::GatewayIntents::MESSAGE_CONTENT) {
            Some("MESSAGE_CONTENT")
        } else {
            None
        },
        if intents.contains(serenity::GatewayIntents::GUILD_MEMBERS) {
            Some("GUILD_MEMBERS")
        } else {
            None
        },
    ]
    .into_iter()
    .flatten()
    .collect();

    info!("Requesting privileged intents: {:?}", privileged_intents);

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    if let Err(e) = client.start().await {
        // Check if it's a disallowed intents error
        let err_str = e.to_string();
        if err_str.contains("Disallowed") || err_str.contains("intents") {
            error!("Failed to start bot: {}", e);
            error!("The following privileged intents need to be enabled in the Discord Developer Portal:");
            for intent in &privileged_intents {
                error!("  - {}", intent);
            }
            error!("Go to https://discord.com/developers/applications -> Your App -> Bot -> Privileged Gateway Intents");
            return Err(anyhow::anyhow!(
                "Disallowed gateway intents. Enable these in Discord Developer Portal: {:?}",
                privileged_intents
            ));
        }
        return Err(e.into());
    }
    warn!("Bot ended.");

    Ok(())
}
