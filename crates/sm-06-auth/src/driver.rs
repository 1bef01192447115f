//! The driver task: consumes the engine event feed sequentially and runs
//! the login transition actions.

use crate::machine::Core;
use crate::prompt::{first_name_valid, last_name_valid, PromptQuestion};
use shared_types::{
    AuthorizationState, EngineError, EngineParameters, EngineRequest, EngineResult, EngineUpdate,
    FatalErrorType, SignalEnvelope,
};
use sm_02_binlog::purge_session_artifacts;
use sm_05_multiplexer::MuxStream;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub(crate) async fn drive(core: Arc<Core>, mut events: MuxStream) {
    let mut closure_handled = false;
    while let Some(envelope) = events.recv().await {
        match envelope {
            SignalEnvelope::Item(EngineUpdate::Error(engine_error)) => {
                pre_filter(&core, engine_error);
            }
            SignalEnvelope::Item(EngineUpdate::AuthorizationState(state)) => {
                handle_state(&core, state, &mut closure_handled).await;
            }
            SignalEnvelope::Item(update) => {
                if core.is_ready() {
                    let _ = core.updates_tx.send(update);
                }
            }
            SignalEnvelope::Error(message) => {
                error!(session = %core.session_name, %message, "Engine event feed failed");
                match FatalErrorType::from_message(&message) {
                    Some(fatal) => {
                        let _ = core.fatal_tx.send(fatal);
                    }
                    None => {
                        let _ = core.errors_tx.send(EngineError::new(500, message));
                    }
                }
                break;
            }
            SignalEnvelope::Complete => break,
        }
    }
    finish_closure(&core, &mut closure_handled);
    debug!(session = %core.session_name, "Authorization driver stopped");
}

/// The error pre-filter, applied before the state machine reacts.
///
/// Recoverable rejections re-arm the matching wait state; fatal errors get
/// no corrective request at all.
fn pre_filter(core: &Core, engine_error: EngineError) {
    match engine_error.message.as_str() {
        "PHONE_CODE_INVALID" => {
            warn!(session = %core.session_name, "Login code rejected, waiting for a new one");
            let _ = core.state_tx.send(AuthorizationState::WaitCode);
            let _ = core.errors_tx.send(engine_error);
        }
        "PASSWORD_HASH_INVALID" => {
            warn!(session = %core.session_name, "Password rejected, waiting for a new one");
            let hint = {
                let state = core.state_tx.borrow();
                match &*state {
                    AuthorizationState::WaitPassword { hint } => hint.clone(),
                    _ => None,
                }
            };
            let _ = core.state_tx.send(AuthorizationState::WaitPassword { hint });
            let _ = core.errors_tx.send(engine_error);
        }
        message => {
            if let Some(fatal) = FatalErrorType::from_message(message) {
                error!(session = %core.session_name, %fatal, "Fatal authorization error");
                let _ = core.fatal_tx.send(fatal);
            } else {
                debug!(session = %core.session_name, error = %engine_error, "Engine error");
                let _ = core.errors_tx.send(engine_error);
            }
        }
    }
}

async fn handle_state(core: &Arc<Core>, state: AuthorizationState, closure_handled: &mut bool) {
    let was_ready = core.is_ready();
    core.started.store(true, Ordering::SeqCst);
    let _ = core.state_tx.send(state.clone());
    match &state {
        AuthorizationState::WaitParameters => {
            issue(
                core,
                EngineRequest::SetParameters(EngineParameters::from_settings(&core.settings)),
            )
            .await;
        }
        AuthorizationState::WaitEncryptionKey => {
            issue(core, EngineRequest::CheckDatabaseEncryptionKey { key: Vec::new() }).await;
        }
        AuthorizationState::WaitPhoneNumber => {
            let request = if let Some(number) = core.settings.phone_number() {
                EngineRequest::SetAuthenticationPhoneNumber {
                    phone_number: number.to_string(),
                }
            } else if let Some(token) = core.settings.bot_token() {
                EngineRequest::CheckAuthenticationBotToken {
                    token: token.to_string(),
                }
            } else {
                // The settings builder makes this unreachable.
                error!(session = %core.session_name, "No authentication identity configured");
                return;
            };
            issue(core, request).await;
        }
        AuthorizationState::WaitCode => {
            info!(session = %core.session_name, "Waiting for the login code");
        }
        AuthorizationState::WaitRegistration { terms_of_service } => {
            register(core, terms_of_service.as_deref()).await;
        }
        AuthorizationState::WaitPassword { hint } => {
            check_password(core, hint.clone()).await;
        }
        AuthorizationState::Ready => {
            core.ready.store(true, Ordering::SeqCst);
            info!(session = %core.session_name, "Authorization complete, forwarding updates");
        }
        AuthorizationState::Closing => {
            info!(session = %core.session_name, "Engine closing");
        }
        AuthorizationState::Closed => {
            finish_closure(core, closure_handled);
        }
    }
    if was_ready {
        let _ = core
            .updates_tx
            .send(EngineUpdate::AuthorizationState(state));
    }
}

/// Issue one corrective request; engine-side rejections go back through the
/// pre-filter.
async fn issue(core: &Core, request: EngineRequest) {
    match core.connection.execute(request, false).await {
        Ok(EngineResult::Err(engine_error)) => pre_filter(core, engine_error),
        Ok(EngineResult::Ok(_)) => {}
        Err(gateway_error) => {
            error!(session = %core.session_name, error = %gateway_error, "Login request failed");
        }
    }
}

async fn register(core: &Core, terms_of_service: Option<&str>) {
    if let Some(terms) = terms_of_service {
        info!(session = %core.session_name, %terms, "Terms of service");
    }
    let first_name = loop {
        match core
            .prompt
            .ask(&core.session_name, PromptQuestion::FirstName)
            .await
        {
            Ok(name) if first_name_valid(&name) => break name.trim().to_string(),
            Ok(_) => {
                warn!(session = %core.session_name, "First name must be 1-64 characters, asking again");
            }
            Err(prompt_error) => {
                error!(session = %core.session_name, error = %prompt_error, "First name prompt failed");
                return;
            }
        }
    };
    let last_name = loop {
        match core
            .prompt
            .ask(&core.session_name, PromptQuestion::LastName)
            .await
        {
            Ok(name) if last_name_valid(&name) => break name.trim().to_string(),
            Ok(_) => {
                warn!(session = %core.session_name, "Last name must be at most 64 characters, asking again");
            }
            Err(prompt_error) => {
                error!(session = %core.session_name, error = %prompt_error, "Last name prompt failed");
                return;
            }
        }
    };
    issue(
        core,
        EngineRequest::RegisterUser {
            first_name,
            last_name,
        },
    )
    .await;
}

async fn check_password(core: &Core, hint: Option<String>) {
    if let Some(hint_text) = &hint {
        info!(session = %core.session_name, hint = %hint_text, "Password hint");
    }
    match core
        .prompt
        .ask(&core.session_name, PromptQuestion::Password { hint })
        .await
    {
        Ok(password) => {
            issue(core, EngineRequest::CheckAuthenticationPassword { password }).await;
        }
        Err(prompt_error) => {
            error!(session = %core.session_name, error = %prompt_error, "Password prompt failed");
        }
    }
}

/// Record closure exactly once: purge artifacts after a requested shutdown,
/// otherwise flag the closure as unexpected.
fn finish_closure(core: &Core, closure_handled: &mut bool) {
    if *closure_handled {
        return;
    }
    *closure_handled = true;
    let _ = core.state_tx.send(AuthorizationState::Closed);
    if core.is_close_requested() {
        let removed = purge_session_artifacts(&core.settings.database_directory);
        info!(session = %core.session_name, removed, "Session closed, artifacts purged");
    } else {
        warn!(session = %core.session_name, "Engine closed without a shutdown request");
    }
}
