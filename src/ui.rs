// UI layer: an interactive menu using `dialoguer`.
//
// The menu is a closed set of flows (`MenuChoice`). Each call flow collects
// its input, turns it into a `CallRequest` with a pure builder, and hands
// it to the same command functions the CLI uses.

use anyhow::Result;
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::api::{ApiClient, Transport};
use crate::commands;
use crate::config::{AssistantOverrides, CallDefaults};
use crate::model::CallRequest;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    WebappCall,
    ApiCall,
    HealthCheck,
    Quit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 4] = [
        MenuChoice::WebappCall,
        MenuChoice::ApiCall,
        MenuChoice::HealthCheck,
        MenuChoice::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::WebappCall => "Place a call (webapp mode, no API key)",
            MenuChoice::ApiCall => "Place a call (API mode, custom assistant)",
            MenuChoice::HealthCheck => "Health check",
            MenuChoice::Quit => "Quit",
        }
    }

    pub fn from_index(index: usize) -> MenuChoice {
        Self::ALL.get(index).copied().unwrap_or(MenuChoice::Quit)
    }
}

/// Answers collected by the webapp call flow.
#[derive(Debug, Clone, Default)]
pub struct WebappInput {
    pub to_number: String,
    pub task: String,
    pub agent_name: String,
}

/// Answers collected by the API call flow. Blank answers keep the default.
#[derive(Debug, Clone, Default)]
pub struct ApiCallInput {
    pub to_number: String,
    pub system_prompt: String,
    pub first_message: String,
}

pub fn webapp_call_request(input: &WebappInput, defaults: &CallDefaults) -> CallRequest {
    CallRequest::webapp(
        input.to_number.trim(),
        defaults,
        Some(input.task.as_str()),
        Some(input.agent_name.as_str()),
    )
}

pub fn api_call_request(input: &ApiCallInput, defaults: &CallDefaults) -> CallRequest {
    let answer = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
    let overrides = AssistantOverrides {
        system_prompt: answer(&input.system_prompt),
        first_message: answer(&input.first_message),
        ..Default::default()
    };
    CallRequest::authenticated(input.to_number.trim(), defaults, &overrides)
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Run `request` behind a spinner on stderr. The spinner is cleared before
/// the caller writes anything, so its redraws never land between lines of
/// the report.
fn with_spinner<R>(message: &'static str, request: impl FnOnce() -> R) -> R {
    let pb = spinner(message);
    let result = request();
    pb.finish_and_clear();
    result
}

/// Run the health check and report whether the service is up. The call
/// flows use this to bail out before prompting for call details.
pub fn health_gate<T: Transport>(api: &ApiClient<T>, out: &mut dyn Write) -> bool {
    let result = with_spinner("Checking API health...", || api.health())
        .and_then(|health| commands::report_health(health, out));
    match result {
        Ok(()) => true,
        Err(err) => {
            let _ = writeln!(out, "❌ {}", err);
            false
        }
    }
}

/// Main interactive menu. Runs until the user picks "Quit".
pub fn main_menu<T: Transport>(mut api: ApiClient<T>) -> Result<()> {
    let mut stdout = io::stdout();
    println!("{}", "=".repeat(50));
    println!("  📞 MoltPhone AI Call Tool");
    println!("{}", "=".repeat(50));

    loop {
        let labels: Vec<&str> = MenuChoice::ALL.iter().map(|c| c.label()).collect();
        let selection = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match MenuChoice::from_index(selection) {
            MenuChoice::WebappCall => {
                if !health_gate(&api, &mut stdout) {
                    continue;
                }
                let input = collect_webapp_input(api.defaults())?;
                let call = webapp_call_request(&input, api.defaults());
                run_call(&api, &call, &mut stdout);
            }
            MenuChoice::ApiCall => {
                if !health_gate(&api, &mut stdout) {
                    continue;
                }
                if !api.has_api_key() {
                    let key: String = Password::new().with_prompt("MoltPhone API key").interact()?;
                    api.set_api_key(&key);
                    if !api.has_api_key() {
                        println!("❌ An API key is required for API mode.");
                        continue;
                    }
                }
                let input = collect_api_input()?;
                let call = api_call_request(&input, api.defaults());
                run_call(&api, &call, &mut stdout);
            }
            MenuChoice::HealthCheck => {
                health_gate(&api, &mut stdout);
            }
            MenuChoice::Quit => break,
        }
    }
    Ok(())
}

fn run_call<T: Transport>(api: &ApiClient<T>, call: &CallRequest, out: &mut dyn Write) {
    let _ = write!(out, "{}", render::call_banner(call));
    let _ = out.flush();
    let result = with_spinner("Placing call...", || api.place_call(call));
    let _ = match result {
        Ok(result) => write!(out, "{}", render::call_result(&result, call.is_authenticated())),
        Err(err) => writeln!(out, "❌ {}", err),
    };
}

fn collect_webapp_input(defaults: &CallDefaults) -> Result<WebappInput> {
    let to_number: String = Input::new()
        .with_prompt("Phone number (E.164)")
        .interact_text()?;
    let task: String = Input::new()
        .with_prompt("Task for the agent")
        .default(defaults.task.clone())
        .interact_text()?;
    let agent_name: String = Input::new()
        .with_prompt("Agent name")
        .default(defaults.agent_name.clone())
        .interact_text()?;
    Ok(WebappInput {
        to_number,
        task,
        agent_name,
    })
}

fn collect_api_input() -> Result<ApiCallInput> {
    let to_number: String = Input::new()
        .with_prompt("Phone number (E.164)")
        .interact_text()?;
    let system_prompt: String = Input::new()
        .with_prompt("System prompt (blank for default)")
        .allow_empty(true)
        .interact_text()?;
    let first_message: String = Input::new()
        .with_prompt("First message (blank for default)")
        .allow_empty(true)
        .interact_text()?;
    Ok(ApiCallInput {
        to_number,
        system_prompt,
        first_message,
    })
}
