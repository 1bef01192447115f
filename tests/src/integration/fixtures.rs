//! Shared test fixtures: a scripted chat engine that emulates the login
//! choreography, a scripted credential prompt, and cluster helpers.

use async_trait::async_trait;
use shared_types::{
    AuthorizationState, EngineObject, EngineRequest, EngineResult, EngineSignal, EngineUpdate,
    SessionSettings,
};
use sm_03_cluster::formation::reset_formation_guards_for_tests;
use sm_03_cluster::{form_master, ClusterHandle, StorePaths, TlsConfig};
use sm_04_gateway::{ChatEngine, EngineFactory, GatewayError, SendCallback};
use sm_06_auth::{AuthError, CredentialPrompt, PromptQuestion};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// The formation guards are process-wide; tests that form a cluster hold
/// this lock for their whole body.
static CLUSTER_LOCK: Mutex<()> = Mutex::new(());

/// Form a fresh local-only cluster, serialized against other cluster tests.
pub fn exclusive_local_cluster() -> (MutexGuard<'static, ()>, Arc<ClusterHandle>) {
    let guard = CLUSTER_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _ = session_telemetry::init_tracing(&session_telemetry::TelemetryConfig::default());
    reset_formation_guards_for_tests();
    let tls = TlsConfig::new(
        StorePaths {
            path: "keys.jks".into(),
            password: "kp".into(),
        },
        StorePaths {
            path: "trust.jks".into(),
            password: "tp".into(),
        },
    );
    let handle = form_master(tls, "127.0.0.1", 5701, vec!["127.0.0.1:5801".into()], true)
        .expect("local cluster formation");
    (guard, Arc::new(handle))
}

/// Test settings bound to a session directory under `root`.
pub fn phone_settings(root: &Path) -> SessionSettings {
    SessionSettings::builder(94575, "a3406de8d171bb422bb6ddf3bbd800e2")
        .database_directory(root.join("session").to_string_lossy())
        .phone_number("+1555000111")
        .build()
        .unwrap()
}

/// Poll `cond` until it holds or two seconds elapse.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A chat engine scripted to walk the real login choreography: every
/// corrective request advances the authorization state like the native
/// engine would.
pub struct LoginEngine {
    signals: mpsc::UnboundedSender<EngineSignal>,
    password: Option<String>,
}

impl LoginEngine {
    fn emit_state(&self, state: AuthorizationState) {
        let _ = self
            .signals
            .send(EngineSignal::Update(EngineUpdate::AuthorizationState(state)));
    }

    fn ok() -> EngineResult<EngineObject> {
        EngineResult::Ok(EngineObject::Ok)
    }
}

impl ChatEngine for LoginEngine {
    fn execute(&mut self, _request: &EngineRequest) -> EngineResult<EngineObject> {
        Self::ok()
    }

    fn send(&mut self, request: &EngineRequest, on_result: SendCallback) {
        let result = match request {
            EngineRequest::SetLogVerbosityLevel(_) => {
                // First contact; the engine asks for its parameters.
                self.emit_state(AuthorizationState::WaitParameters);
                Self::ok()
            }
            EngineRequest::SetParameters(_) => {
                self.emit_state(AuthorizationState::WaitEncryptionKey);
                Self::ok()
            }
            EngineRequest::CheckDatabaseEncryptionKey { .. } => {
                self.emit_state(AuthorizationState::WaitPhoneNumber);
                Self::ok()
            }
            EngineRequest::SetAuthenticationPhoneNumber { .. }
            | EngineRequest::CheckAuthenticationBotToken { .. } => {
                match &self.password {
                    Some(_) => self.emit_state(AuthorizationState::WaitPassword {
                        hint: Some("favorite".into()),
                    }),
                    None => self.emit_state(AuthorizationState::Ready),
                }
                Self::ok()
            }
            EngineRequest::CheckAuthenticationPassword { password } => {
                if self.password.as_deref() == Some(password.as_str()) {
                    self.emit_state(AuthorizationState::Ready);
                    Self::ok()
                } else {
                    // Rejected; the engine re-asks for the password.
                    self.emit_state(AuthorizationState::WaitPassword {
                        hint: Some("favorite".into()),
                    });
                    EngineResult::err(400, "PASSWORD_HASH_INVALID")
                }
            }
            EngineRequest::Close => {
                self.emit_state(AuthorizationState::Closing);
                self.emit_state(AuthorizationState::Closed);
                let _ = self.signals.send(EngineSignal::ClosedMilestone);
                Self::ok()
            }
            _ => Self::ok(),
        };
        on_result(result);
    }
}

/// Factory producing [`LoginEngine`] instances.
pub struct LoginFactory {
    password: Option<String>,
}

impl LoginFactory {
    pub fn without_password() -> Self {
        Self { password: None }
    }

    pub fn with_password(password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
        }
    }
}

impl EngineFactory for LoginFactory {
    fn create(
        &self,
        signals: mpsc::UnboundedSender<EngineSignal>,
    ) -> Result<Box<dyn ChatEngine>, GatewayError> {
        Ok(Box::new(LoginEngine {
            signals,
            password: self.password.clone(),
        }))
    }
}

/// A credential prompt answering from a fixed script.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|s| s.to_string()).collect()),
        })
    }
}

#[async_trait]
impl CredentialPrompt for ScriptedPrompt {
    async fn ask(
        &self,
        _session_name: &str,
        _question: PromptQuestion,
    ) -> Result<String, AuthError> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AuthError::Prompt("no scripted answer left".into()))
    }
}
