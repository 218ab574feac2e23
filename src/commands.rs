// Command flows shared by the CLI and the interactive menu.
//
// Each command writes its report to `out` and returns `Err` for anything
// that should make the process exit non-zero. "No calls" and "no
// transcript yet" are reports, not errors.

use std::io::Write;

use crate::api::{ApiClient, ListQuery, Transport};
use crate::error::ClientError;
use crate::model::{CallRequest, CallResult, Health};
use crate::render;

pub fn health<T: Transport>(api: &ApiClient<T>, out: &mut dyn Write) -> Result<(), ClientError> {
    let health = api.health()?;
    report_health(health, out)
}

/// Print the health line; a non-2xx status becomes an `Api` error carrying
/// the server's body unchanged.
pub fn report_health(health: Health, out: &mut dyn Write) -> Result<(), ClientError> {
    write!(out, "{}", render::health(&health))?;
    if health.is_up() {
        Ok(())
    } else {
        Err(ClientError::Api {
            status: health.http_status,
            body: health.body,
        })
    }
}

/// Place a call and print its banner and outcome.
pub fn place_call<T: Transport>(
    api: &ApiClient<T>,
    call: &CallRequest,
    out: &mut dyn Write,
) -> Result<CallResult, ClientError> {
    write!(out, "{}", render::call_banner(call))?;
    let result = api.place_call(call)?;
    write!(out, "{}", render::call_result(&result, call.is_authenticated()))?;
    Ok(result)
}

pub fn list_calls<T: Transport>(
    api: &ApiClient<T>,
    query: &ListQuery,
    out: &mut dyn Write,
) -> Result<(), ClientError> {
    let calls = api.list_calls(query)?;
    write!(out, "{}", render::call_table(&calls))?;
    Ok(())
}

/// Details and transcript for `call_id`, or for the most recent call.
///
/// A failed details fetch is reported inline and the transcript is still
/// fetched; the command then fails with the details error. A failed
/// transcript fetch fails the command.
pub fn transcript<T: Transport>(
    api: &ApiClient<T>,
    call_id: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), ClientError> {
    if !api.has_api_key() {
        return Err(ClientError::MissingCredential);
    }

    let call_id = match call_id {
        Some(id) => id.to_string(),
        None => {
            let latest = api.list_calls(&ListQuery::latest())?;
            let Some(first) = latest.into_iter().next() else {
                writeln!(out, "❌ No calls found")?;
                return Ok(());
            };
            first.id.ok_or_else(|| {
                ClientError::UnexpectedResponse("latest call has no id".to_string())
            })?
        }
    };

    writeln!(out, "📋 Call ID: {}\n", call_id)?;

    writeln!(out, "── Call Details ──")?;
    let details_error = match api.call_details(&call_id) {
        Ok(details) => {
            write!(out, "{}", render::call_details(&details))?;
            None
        }
        Err(err) => {
            writeln!(out, "  ❌ {}", err)?;
            Some(err)
        }
    };

    writeln!(out, "\n── Transcript ──")?;
    let entries = api.transcript(&call_id)?;
    write!(out, "{}", render::transcript(&entries))?;

    match details_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn end_call<T: Transport>(
    api: &ApiClient<T>,
    call_id: &str,
    out: &mut dyn Write,
) -> Result<(), ClientError> {
    let ended = api.end_call(call_id)?;
    write!(out, "{}", render::ended_call(&ended))?;
    Ok(())
}

pub fn balance<T: Transport>(api: &ApiClient<T>, out: &mut dyn Write) -> Result<(), ClientError> {
    let balance = api.balance()?;
    write!(out, "{}", render::balance(&balance))?;
    Ok(())
}
