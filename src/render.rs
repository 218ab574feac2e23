// Plain-text reports.
//
// Every function returns the full text so callers decide where it goes.

use crate::model::{
    Balance, CallDetails, CallRequest, CallResult, CallSummary, EndedCall, Health, Role,
    TranscriptEntry,
};

const MISSING: &str = "N/A";
const PREVIEW_CHARS: usize = 80;

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING)
}

fn number_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |n| n.to_string())
}

/// Shown before the request goes out.
pub fn call_banner(call: &CallRequest) -> String {
    let preview: String = call.preview().chars().take(PREVIEW_CHARS).collect();
    let label = if call.is_authenticated() { "Prompt" } else { "Task" };
    format!("\n📞 Calling {}...\n   {}: {}...\n", call.to_number, label, preview)
}

/// Balance is only reported for authenticated calls.
pub fn call_result(result: &CallResult, show_balance: bool) -> String {
    let mut out = String::from("✅ Call initiated!\n");
    out.push_str(&format!("   Call ID:    {}\n", or_na(&result.call_id)));
    out.push_str(&format!("   Twilio SID: {}\n", or_na(&result.provider_call_sid)));
    out.push_str(&format!("   Status:     {}\n", or_na(&result.status)));
    out.push_str(&format!("   Mode:       {}\n", or_na(&result.mode)));
    if show_balance {
        out.push_str(&format!(
            "   Balance:    {}\n",
            number_or_na(result.remaining_balance)
        ));
    }
    out
}

pub fn call_details(details: &CallDetails) -> String {
    format!(
        "  Status:  {}\n  To:      {}\n  Mode:    {}\n  Created: {}\n",
        or_na(&details.status),
        or_na(&details.to_number),
        or_na(&details.mode),
        or_na(&details.created_at),
    )
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Caller => "🧑 Caller",
        Role::Assistant => "🤖 AI",
    }
}

/// Entries are expected already sorted.
pub fn transcript(entries: &[TranscriptEntry]) -> String {
    if entries.is_empty() {
        return "  (no transcript yet, call may still be in progress)\n".to_string();
    }
    entries
        .iter()
        .map(|e| format!("  {}: {}\n\n", role_label(e.role), e.content))
        .collect()
}

pub fn call_table(calls: &[CallSummary]) -> String {
    if calls.is_empty() {
        return "No calls found.\n".to_string();
    }

    let mut out = format!("{:<24} {:<12} {:<16} {}\n", "ID", "Status", "To", "Created");
    out.push_str(&"─".repeat(75));
    out.push('\n');
    for call in calls {
        let created: String = call
            .created_at
            .as_deref()
            .unwrap_or("?")
            .chars()
            .take(19)
            .collect();
        out.push_str(&format!(
            "{:<24} {:<12} {:<16} {}\n",
            call.id.as_deref().unwrap_or("?"),
            call.status.as_deref().unwrap_or("?"),
            call.to_number.as_deref().unwrap_or("?"),
            created,
        ));
    }
    out
}

pub fn health(health: &Health) -> String {
    format!(
        "🏥 Health: {} | Service: {}\n",
        or_na(&health.status),
        or_na(&health.service)
    )
}

pub fn balance(balance: &Balance) -> String {
    format!(
        "💰 Balance: {} tokens (updated {})\n",
        number_or_na(balance.balance),
        or_na(&balance.updated_at)
    )
}

pub fn ended_call(ended: &EndedCall) -> String {
    format!(
        "🛑 {}\n   Call ID: {}\n   Status:  {}\n",
        ended.message.as_deref().unwrap_or("Call ended"),
        or_na(&ended.call_id),
        or_na(&ended.status)
    )
}
