//! Drives one onboarding run from splash to home.
//!
//! The controller exposes the current step and a single `attempt` entry
//! point. Only one action runs at a time: while an action is in flight (for
//! instance a sign-in waiting on the auth backend) every other call is
//! rejected with [`FlowError::Busy`] without touching any collaborator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::domain::{AuthSession, LanguageCode, Registration, SocialProvider};
use crate::flow::reset::{OtpChallenge, OtpInput, ResetPhase};
use crate::flow::step::{Action, OnboardingProgress, Selections, Step};
use crate::flow::validation::{self, ValidationError};
use crate::flow::{FlowError, FlowOptions, Outcome};
use crate::i18n::pack::ErrorText;
use crate::i18n::LocalizationStore;
use crate::ports::{AuthenticationService, CodeDelivery, Delivery, Navigator, PortError};

/// The external services the flow talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub auth: Arc<dyn AuthenticationService>,
    pub delivery: Arc<dyn CodeDelivery>,
    pub navigator: Arc<dyn Navigator>,
}

enum Navigation {
    /// Same screen, new state.
    Stay,
    Push,
    Replace,
}

/// Clears the in-flight flag when the action finishes, however it finishes.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct OnboardingFlowController {
    localization: Arc<LocalizationStore>,
    collaborators: Collaborators,
    options: FlowOptions,
    progress: Mutex<OnboardingProgress>,
    pending: AtomicBool,
}

impl OnboardingFlowController {
    pub fn new(
        localization: Arc<LocalizationStore>,
        collaborators: Collaborators,
        options: FlowOptions,
    ) -> Self {
        Self {
            localization,
            collaborators,
            options,
            progress: Mutex::new(OnboardingProgress::default()),
            pending: AtomicBool::new(false),
        }
    }

    pub fn localization(&self) -> &Arc<LocalizationStore> {
        &self.localization
    }

    pub fn current(&self) -> Step {
        self.lock().step.clone()
    }

    pub fn progress(&self) -> OnboardingProgress {
        self.lock().clone()
    }

    /// True while an action is waiting on a collaborator.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    //=====================================================================================
    // Splash
    //=====================================================================================

    /// Runs the splash step: loads the language preferences and checks for an
    /// existing session. A failing session check counts as "no session".
    pub async fn start(&self) -> Result<Outcome, FlowError> {
        let _pending = self.begin()?;
        let step = self.current();
        if !matches!(step, Step::Splash) {
            return Err(FlowError::InvalidAction {
                step: step.name(),
                action: "start",
            });
        }

        self.localization.initialize().await;

        let session = match self.collaborators.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session check failed, continuing without a session: {:?}", e);
                None
            }
        };

        match session {
            Some(session) => {
                info!(user_id = %session.user_id, "Existing session found; skipping onboarding");
                let mut outcome = self.enter(Step::Home, Navigation::Replace);
                outcome.session = Some(session);
                Ok(outcome)
            }
            None => Ok(self.enter(Step::language_native(), Navigation::Replace)),
        }
    }

    //=====================================================================================
    // Actions
    //=====================================================================================

    /// Attempts `action` on the current step.
    pub async fn attempt(&self, action: Action) -> Result<Outcome, FlowError> {
        let _pending = self.begin()?;
        debug!(action = action.name(), "Attempting onboarding action");

        match (self.current(), action) {
            // --- Language selection ---
            (Step::LanguageNative { .. }, Action::SelectLanguage { code }) => Ok(self.enter(
                Step::LanguageNative {
                    selected: Some(code),
                },
                Navigation::Stay,
            )),
            (Step::LanguageNative { selected }, Action::Next) => {
                let code = selected.ok_or_else(|| self.rejected(ValidationError::NoLanguageSelected))?;
                self.localization.set_native_language(code).await;
                self.lock().selections.native_language = Some(code);
                Ok(self.enter(Step::language_target(code), Navigation::Stay))
            }
            (
                Step::LanguageTarget {
                    native, options, ..
                },
                Action::SelectLanguage { code },
            ) => {
                if code == native {
                    return Err(self.rejected(ValidationError::SameLanguage));
                }
                Ok(self.enter(
                    Step::LanguageTarget {
                        native,
                        options,
                        selected: Some(code),
                    },
                    Navigation::Stay,
                ))
            }
            (Step::LanguageTarget { native, selected, .. }, Action::Next) => {
                self.confirm_target(native, selected).await
            }

            // --- Personalization ---
            (Step::Welcome, Action::Next) => Ok(self.enter(Step::goals(), Navigation::Push)),
            (Step::Goals { mut selected }, Action::ToggleGoal { goal }) => {
                if !selected.remove(&goal) {
                    selected.insert(goal);
                }
                Ok(self.enter(Step::Goals { selected }, Navigation::Stay))
            }
            (Step::Goals { selected }, Action::Next) => {
                if selected.is_empty() {
                    return Err(self.rejected(ValidationError::NoGoalSelected));
                }
                self.lock().selections.goals = selected;
                Ok(self.enter(Step::level(), Navigation::Push))
            }
            (Step::Level { personality, .. }, Action::SelectLevel { level }) => Ok(self.enter(
                Step::Level { level, personality },
                Navigation::Stay,
            )),
            (Step::Level { level, .. }, Action::SelectPersonality { personality }) => Ok(self
                .enter(Step::Level { level, personality }, Navigation::Stay)),
            (Step::Level { level, personality }, Action::Next) => {
                {
                    let mut progress = self.lock();
                    progress.selections.level = Some(level);
                    progress.selections.personality = Some(personality);
                }
                let email = self.remembered_email();
                Ok(self.enter(Step::Login { email }, Navigation::Push))
            }

            // --- Login ---
            (Step::Login { .. }, Action::SignIn { email, password }) => {
                self.sign_in(email, password).await
            }
            (Step::Login { .. }, Action::SignInWithProvider { provider }) => {
                self.sign_in_with_provider(provider).await
            }
            (Step::Login { .. }, Action::OpenRegister) => {
                Ok(self.enter(Step::Register, Navigation::Push))
            }
            (Step::Login { email }, Action::OpenForgotPassword) => Ok(self.enter(
                Step::ForgotPassword {
                    phase: ResetPhase::Email { email },
                },
                Navigation::Push,
            )),

            // --- Register ---
            (
                Step::Register,
                Action::Register {
                    email,
                    password,
                    confirm_password,
                    display_name,
                },
            ) => {
                self.register(email, password, confirm_password, display_name)
                    .await
            }
            (Step::Register | Step::ForgotPassword { .. }, Action::BackToLogin) => {
                let email = self.remembered_email();
                Ok(self.enter(Step::Login { email }, Navigation::Replace))
            }

            // --- Password reset ---
            (
                Step::ForgotPassword {
                    phase: ResetPhase::Email { .. },
                },
                Action::SendCode { email },
            ) => self.send_code(email).await,
            (
                Step::ForgotPassword {
                    phase: ResetPhase::Otp {
                        challenge,
                        mut input,
                    },
                },
                Action::EnterDigit { index, value },
            ) => {
                if !input.set_digit(index, &value) {
                    return Err(FlowError::InvalidAction {
                        step: "forgot_password",
                        action: "enter_digit",
                    });
                }
                Ok(self.enter(
                    Step::ForgotPassword {
                        phase: ResetPhase::Otp { challenge, input },
                    },
                    Navigation::Stay,
                ))
            }
            (
                Step::ForgotPassword {
                    phase: ResetPhase::Otp { challenge, input },
                },
                Action::VerifyCode,
            ) => self.verify_code(challenge, input),
            (
                Step::ForgotPassword {
                    phase: ResetPhase::Otp { challenge, .. },
                },
                Action::SubmitCode { code },
            ) => match OtpInput::from_code(&code) {
                Some(input) => self.verify_code(challenge, input),
                None => self.code_mismatch(challenge),
            },
            (
                Step::ForgotPassword {
                    phase: ResetPhase::Otp { mut challenge, .. },
                },
                Action::ResendCode,
            ) => {
                challenge.regenerate();
                self.deliver_challenge(challenge).await
            }
            (
                Step::ForgotPassword {
                    phase: ResetPhase::NewPassword { email },
                },
                Action::ResetPassword {
                    new_password,
                    confirm_password,
                },
            ) => {
                self.reset_password(email, new_password, confirm_password)
                    .await
            }

            // --- Profile setup ---
            (Step::ProfileSetup { avatar, goals, .. }, Action::SetDisplayName { name }) => {
                Ok(self.enter(
                    Step::ProfileSetup {
                        display_name: name,
                        avatar,
                        goals,
                    },
                    Navigation::Stay,
                ))
            }
            (
                Step::ProfileSetup {
                    display_name,
                    goals,
                    ..
                },
                Action::SelectAvatar { avatar },
            ) => Ok(self.enter(
                Step::ProfileSetup {
                    display_name,
                    avatar,
                    goals,
                },
                Navigation::Stay,
            )),
            (
                Step::ProfileSetup {
                    display_name,
                    avatar,
                    mut goals,
                },
                Action::ToggleProfileGoal { goal },
            ) => {
                if !goals.remove(&goal) {
                    goals.insert(goal);
                }
                Ok(self.enter(
                    Step::ProfileSetup {
                        display_name,
                        avatar,
                        goals,
                    },
                    Navigation::Stay,
                ))
            }
            (
                Step::ProfileSetup {
                    display_name,
                    avatar,
                    goals,
                },
                Action::Next,
            ) => {
                let name = display_name.trim();
                if name.is_empty() {
                    return Err(self.rejected(ValidationError::MissingDisplayName));
                }
                if goals.is_empty() {
                    return Err(self.rejected(ValidationError::NoGoalSelected));
                }
                {
                    let mut progress = self.lock();
                    progress.selections.display_name = Some(name.to_string());
                    progress.selections.avatar = Some(avatar);
                    progress.selections.profile_goals = goals;
                }
                Ok(self.enter(Step::Home, Navigation::Replace))
            }

            (step, action) => {
                debug!(step = %step, action = action.name(), "Action not available on this step");
                Err(FlowError::InvalidAction {
                    step: step.name(),
                    action: action.name(),
                })
            }
        }
    }

    //=====================================================================================
    // Step Handlers
    //=====================================================================================

    async fn confirm_target(
        &self,
        native: LanguageCode,
        selected: Option<LanguageCode>,
    ) -> Result<Outcome, FlowError> {
        let code = selected.ok_or_else(|| self.rejected(ValidationError::NoLanguageSelected))?;
        if code == native {
            return Err(self.rejected(ValidationError::SameLanguage));
        }
        self.localization.set_target_language(code).await;
        self.lock().selections.target_language = Some(code);
        Ok(self.enter(Step::Welcome, Navigation::Replace))
    }

    async fn sign_in(&self, email: String, password: String) -> Result<Outcome, FlowError> {
        validation::check_credentials(&email, &password).map_err(|kind| self.rejected(kind))?;
        let email = email.trim().to_string();

        let session = self
            .collaborators
            .auth
            .sign_in(&email, &password)
            .await
            .map_err(|e| self.collaborator_failed(|t| &t.sign_in_failed, e))?;

        self.lock().selections.email = Some(email);
        Ok(self.signed_in(session, Step::Home))
    }

    async fn sign_in_with_provider(&self, provider: SocialProvider) -> Result<Outcome, FlowError> {
        let session = self
            .collaborators
            .auth
            .sign_in_with_provider(provider)
            .await
            .map_err(|e| self.collaborator_failed(|t| &t.sign_in_failed, e))?;
        Ok(self.signed_in(session, Step::Home))
    }

    async fn register(
        &self,
        email: String,
        password: String,
        confirm_password: String,
        display_name: Option<String>,
    ) -> Result<Outcome, FlowError> {
        validation::check_email(&email).map_err(|kind| self.rejected(kind))?;
        validation::check_new_password(&password, &confirm_password)
            .map_err(|kind| self.rejected(kind))?;

        let registration = Registration {
            email: email.trim().to_string(),
            password,
            display_name: display_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        };
        let session = self
            .collaborators
            .auth
            .sign_up(&registration)
            .await
            .map_err(|e| match e {
                PortError::AlreadyExists(_) => self.collaborator_failed(|t| &t.email_taken, e),
                e => self.collaborator_failed(|t| &t.sign_up_failed, e),
            })?;

        self.lock().selections.email = Some(registration.email);
        let next = if self.options.profile_setup_after_register {
            Step::profile_setup(registration.display_name)
        } else {
            Step::Home
        };
        Ok(self.signed_in(session, next))
    }

    async fn send_code(&self, email: String) -> Result<Outcome, FlowError> {
        validation::check_email(&email).map_err(|kind| self.rejected(kind))?;
        let email = email.trim().to_string();
        let challenge = OtpChallenge::generate(&email);
        self.deliver_challenge(challenge).await
    }

    /// Delivers the challenge's code and moves to (or stays on) the otp phase.
    /// On failure the previous phase, and any previous code, stay in place.
    async fn deliver_challenge(&self, challenge: OtpChallenge) -> Result<Outcome, FlowError> {
        let delivery = self
            .collaborators
            .delivery
            .deliver(challenge.target_email(), challenge.expected_code())
            .await
            .map_err(|e| self.collaborator_failed(|t| &t.send_code_failed, e))?;

        let notice = match delivery {
            Delivery::Sent => None,
            Delivery::Displayed => Some(
                self.localization
                    .resolve()
                    .forgot_password
                    .demo_code_notice(challenge.expected_code()),
            ),
        };
        info!(resends = challenge.resends(), "Password reset code issued");

        self.lock().selections.email = Some(challenge.target_email().to_string());
        let mut outcome = self.enter(
            Step::ForgotPassword {
                phase: ResetPhase::Otp {
                    challenge,
                    input: OtpInput::default(),
                },
            },
            Navigation::Stay,
        );
        outcome.notice = notice;
        Ok(outcome)
    }

    fn verify_code(
        &self,
        challenge: OtpChallenge,
        input: OtpInput,
    ) -> Result<Outcome, FlowError> {
        let Some(entered) = input.code() else {
            return Err(self.rejected(ValidationError::IncompleteCode));
        };

        if challenge.matches(&entered) {
            let email = challenge.target_email().to_string();
            return Ok(self.enter(
                Step::ForgotPassword {
                    phase: ResetPhase::NewPassword { email },
                },
                Navigation::Stay,
            ));
        }

        self.code_mismatch(challenge)
    }

    /// Counts a failed attempt and empties the boxes.
    fn code_mismatch(&self, mut challenge: OtpChallenge) -> Result<Outcome, FlowError> {
        challenge.record_failure();
        warn!(
            failed_attempts = challenge.failed_attempts(),
            "Password reset code did not match"
        );
        self.enter(
            Step::ForgotPassword {
                phase: ResetPhase::Otp {
                    challenge,
                    input: OtpInput::default(),
                },
            },
            Navigation::Stay,
        );
        Err(self.rejected(ValidationError::InvalidCode))
    }

    async fn reset_password(
        &self,
        email: String,
        new_password: String,
        confirm_password: String,
    ) -> Result<Outcome, FlowError> {
        validation::check_new_password(&new_password, &confirm_password)
            .map_err(|kind| self.rejected(kind))?;

        self.collaborators
            .auth
            .update_password(&email, &new_password)
            .await
            .map_err(|e| self.collaborator_failed(|t| &t.reset_failed, e))?;

        info!("Password reset completed");
        Ok(self.enter(
            Step::ForgotPassword {
                phase: ResetPhase::Success,
            },
            Navigation::Stay,
        ))
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    fn begin(&self) -> Result<PendingGuard<'_>, FlowError> {
        if self.pending.swap(true, Ordering::AcqRel) {
            debug!("Rejecting action while another is pending");
            return Err(FlowError::Busy);
        }
        Ok(PendingGuard(&self.pending))
    }

    fn lock(&self) -> MutexGuard<'_, OnboardingProgress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remembered_email(&self) -> String {
        self.lock().selections.email.clone().unwrap_or_default()
    }

    /// Stores `step` as current and tells the navigator, returning the outcome.
    fn enter(&self, step: Step, navigation: Navigation) -> Outcome {
        let route = step.route();
        {
            let mut progress = self.lock();
            if step.is_terminal() {
                let Selections {
                    native_language,
                    target_language,
                    goals,
                    level,
                    personality,
                    ..
                } = std::mem::take(&mut progress.selections);
                info!(
                    ?native_language,
                    ?target_language,
                    ?goals,
                    ?level,
                    ?personality,
                    "Onboarding finished"
                );
            }
            progress.step = step.clone();
        }

        match navigation {
            Navigation::Stay => debug!(step = %step, "Onboarding step updated"),
            Navigation::Push => {
                info!(step = %step, "Onboarding step entered");
                self.collaborators.navigator.go_to(route);
            }
            Navigation::Replace => {
                info!(step = %step, "Onboarding step entered");
                self.collaborators.navigator.replace(route);
            }
        }

        Outcome {
            step,
            notice: None,
            session: None,
        }
    }

    fn signed_in(&self, session: AuthSession, next: Step) -> Outcome {
        info!(user_id = %session.user_id, "Signed in");
        let mut outcome = self.enter(next, Navigation::Replace);
        outcome.session = Some(session);
        outcome
    }

    fn rejected(&self, kind: ValidationError) -> FlowError {
        debug!(reason = %kind, "Input rejected");
        FlowError::Validation {
            kind,
            message: kind.message(self.localization.resolve()).to_string(),
        }
    }

    fn collaborator_failed(
        &self,
        message: impl FnOnce(&ErrorText) -> &String,
        source: PortError,
    ) -> FlowError {
        warn!("Collaborator call failed: {:?}", source);
        FlowError::Collaborator {
            message: message(&self.localization.resolve().errors).clone(),
            source,
        }
    }
}
