// src/messages.rs

use chrono::{DateTime, Utc};

pub fn banned_message(until: DateTime<Utc>) -> String {
    format!(
        "⛔ **You cannot apply yet.**\n\n\
        You are currently on an application cooldown.\n\
        You may apply again after **{}**.",
        until.format("%Y-%m-%d %H:%M UTC")
    )
}

pub fn in_flight_message() -> String {
    "📋 **You already have an application in progress.**\n\n\
    Please finish answering the questions in your DMs first."
        .to_string()
}

pub fn check_dms_message(form: &str) -> String {
    format!(
        "📨 **Check your DMs!**\n\n\
        I've sent you the first question of the **{}** application.",
        form
    )
}

pub fn dm_failed_message() -> String {
    "❌ **I couldn't send you a private message.**\n\n\
    Please enable DMs from server members and click Apply again."
        .to_string()
}

pub fn submitted_message(form: &str) -> String {
    format!(
        "✅ **Application submitted!**\n\n\
        Your **{}** application has been sent to the staff team.\n\
        You'll hear back from us once it has been reviewed.",
        form
    )
}

pub fn accepted_message() -> String {
    "🎉 **Your application has been accepted!**\n\n\
    A staff member will follow up with you in your ticket channel."
        .to_string()
}

pub fn denied_message() -> String {
    "❌ **Your application has been denied.**\n\n\
    You're welcome to contact the staff team if you have questions."
        .to_string()
}

pub fn timed_out_message(form: &str) -> String {
    format!(
        "⌛ **Your {} application expired.**\n\n\
        You stopped replying, so the application was closed.\n\
        Click the Apply button again whenever you're ready.",
        form
    )
}

pub fn ticket_welcome(mention: &str) -> String {
    format!("{} welcome! 🎫 A staff member will be with you shortly.", mention)
}
