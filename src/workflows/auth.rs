//! Login and registration forms.

use super::phase::Phase;
use super::timer::{TimerOwner, TimerToken, Timers, NOTICE_DISPLAY_SECS};
use super::{is_blank, FieldPatch};
use crate::backend::{BackendOp, BackendRequest, BackendResponse, Purpose, PROFILES_TABLE};
use crate::domain::{Identity, UserProfile, ValidationError};

/// Minimum password length enforced before sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Notice shown on the login view after registering.
pub const REGISTERED_NOTICE: &str = "Registro exitoso. Por favor verifica tu correo electrónico.";

/// Failure shown when sign-up succeeds but returns no user.
pub const SIGN_UP_WITHOUT_USER: &str = "No se pudo crear la cuenta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginField {
    Email,
    Password,
}

impl LoginField {
    pub const ALL: [Self; 2] = [Self::Email, Self::Password];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Password => "Contraseña",
        }
    }

    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::Password)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginWorkflow {
    email: String,
    password: String,
    phase: Phase,
}

impl LoginWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Email => &self.email,
            LoginField::Password => &self.password,
        }
    }

    pub fn edit(&mut self, field: LoginField, patch: &FieldPatch) -> bool {
        if self.phase.is_loading() {
            return false;
        }
        match field {
            LoginField::Email => patch.apply_to(&mut self.email),
            LoginField::Password => patch.apply_to(&mut self.password),
        }
        self.phase.on_edit();
        true
    }

    pub fn submit(&mut self) -> Option<BackendRequest> {
        let _span = tracing::debug_span!("login_submit").entered();

        if self.phase.is_loading() {
            return None;
        }
        if let Some(field) = LoginField::ALL.into_iter().find(|f| is_blank(self.value(*f))) {
            self.phase.fail(ValidationError::MissingField(field.label()).to_string());
            return None;
        }
        if !self.email.contains('@') {
            self.phase.fail(ValidationError::InvalidEmail.to_string());
            return None;
        }

        self.phase = Phase::Loading;
        Some(BackendRequest::new(
            Purpose::Login,
            BackendOp::SignIn {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            },
        ))
    }

    /// Returns the identity on success. The form is cleared.
    pub fn on_response(&mut self, response: BackendResponse) -> Option<Identity> {
        if !self.phase.is_loading() {
            tracing::debug!("ignoring login response, nothing pending");
            return None;
        }
        match response.into_session() {
            Ok(Some(identity)) => {
                *self = Self::default();
                Some(identity)
            }
            Ok(None) => {
                self.phase.fail("Invalid login credentials");
                None
            }
            Err(message) => {
                self.phase.fail(message);
                None
            }
        }
    }

    /// Shows a transient notice, e.g. after registering.
    pub fn announce(&mut self, notice: impl Into<String>, timers: &mut Timers) {
        self.phase = Phase::Success {
            notice: notice.into(),
            timer: timers.schedule(TimerOwner::Login, NOTICE_DISPLAY_SECS),
        };
    }

    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        self.phase.on_timer(token)
    }

    /// Clears the form. A notice in progress survives so it can be read on
    /// arrival.
    pub fn teardown(&mut self) {
        let phase = match &self.phase {
            Phase::Success { .. } => self.phase.clone(),
            _ => Phase::Idle,
        };
        *self = Self {
            phase,
            ..Self::default()
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterField {
    DisplayName,
    Email,
    Password,
    ConfirmPassword,
}

impl RegisterField {
    pub const ALL: [Self; 4] = [
        Self::DisplayName,
        Self::Email,
        Self::Password,
        Self::ConfirmPassword,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DisplayName => "Nombre",
            Self::Email => "Email",
            Self::Password => "Contraseña",
            Self::ConfirmPassword => "Confirmar contraseña",
        }
    }

    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::Password | Self::ConfirmPassword)
    }
}

/// What a registration response led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Ignored,
    Continue(BackendRequest),
    /// Signed in after sign-up; the profile row is created next.
    SignedIn(Identity, BackendRequest),
    /// Account and profile exist. The view moves to login.
    Registered,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    SigningUp,
    SigningIn,
    CreatingProfile,
}

impl Stage {
    const fn purpose(self) -> Purpose {
        match self {
            Self::SigningUp => Purpose::RegisterSignUp,
            Self::SigningIn => Purpose::RegisterSignIn,
            Self::CreatingProfile => Purpose::RegisterProfile,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationWorkflow {
    display_name: String,
    email: String,
    password: String,
    confirm_password: String,
    phase: Phase,
    stage: Option<Stage>,
}

impl RegistrationWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn value(&self, field: RegisterField) -> &str {
        match field {
            RegisterField::DisplayName => &self.display_name,
            RegisterField::Email => &self.email,
            RegisterField::Password => &self.password,
            RegisterField::ConfirmPassword => &self.confirm_password,
        }
    }

    pub fn edit(&mut self, field: RegisterField, patch: &FieldPatch) -> bool {
        if self.phase.is_loading() {
            return false;
        }
        let text = match field {
            RegisterField::DisplayName => &mut self.display_name,
            RegisterField::Email => &mut self.email,
            RegisterField::Password => &mut self.password,
            RegisterField::ConfirmPassword => &mut self.confirm_password,
        };
        patch.apply_to(text);
        self.phase.on_edit();
        true
    }

    /// Required fields, then length, then confirmation.
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(field) = RegisterField::ALL.into_iter().find(|f| is_blank(self.value(*f))) {
            return Err(ValidationError::MissingField(field.label()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }

    /// Validates locally and starts sign-up. No request leaves on failure.
    pub fn submit(&mut self) -> Option<BackendRequest> {
        let _span = tracing::debug_span!("register_submit").entered();

        if self.phase.is_loading() {
            return None;
        }
        if let Err(e) = self.validate() {
            tracing::debug!(error = %e, "registration rejected");
            self.phase.fail(e.to_string());
            return None;
        }

        self.stage = Some(Stage::SigningUp);
        self.phase = Phase::Loading;
        Some(BackendRequest::new(
            Purpose::RegisterSignUp,
            BackendOp::SignUp {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            },
        ))
    }

    pub fn on_response(&mut self, response: BackendResponse) -> RegistrationOutcome {
        let _span = tracing::debug_span!("register_on_response", purpose = ?response.purpose).entered();

        let Some(stage) = self.stage.filter(|stage| stage.purpose() == response.purpose) else {
            return RegistrationOutcome::Ignored;
        };

        let result = match stage {
            Stage::SigningUp | Stage::SigningIn => response.into_session().map(Some),
            Stage::CreatingProfile => response.into_rows().map(|_| None),
        };

        let identity = match result {
            Ok(identity) => identity,
            Err(message) => {
                self.stage = None;
                self.phase.fail(message);
                return RegistrationOutcome::Failed;
            }
        };

        match (stage, identity) {
            (Stage::SigningUp, Some(None)) => {
                self.stage = None;
                self.phase.fail(SIGN_UP_WITHOUT_USER);
                RegistrationOutcome::Failed
            }
            (Stage::SigningUp, _) => {
                self.stage = Some(Stage::SigningIn);
                RegistrationOutcome::Continue(BackendRequest::new(
                    Purpose::RegisterSignIn,
                    BackendOp::SignIn {
                        email: self.email.trim().to_string(),
                        password: self.password.clone(),
                    },
                ))
            }
            (Stage::SigningIn, Some(Some(identity))) => {
                let profile = UserProfile {
                    id: identity.id.clone(),
                    display_name: self.display_name.trim().to_string(),
                    email: identity.email.clone(),
                };
                match serde_json::to_value(&profile) {
                    Ok(row) => {
                        self.stage = Some(Stage::CreatingProfile);
                        RegistrationOutcome::SignedIn(
                            identity,
                            BackendRequest::new(
                                Purpose::RegisterProfile,
                                BackendOp::Insert {
                                    table: PROFILES_TABLE.to_string(),
                                    row,
                                },
                            ),
                        )
                    }
                    Err(e) => {
                        self.stage = None;
                        self.phase.fail(e.to_string());
                        RegistrationOutcome::Failed
                    }
                }
            }
            (Stage::SigningIn, _) => {
                self.stage = None;
                self.phase.fail("Invalid login credentials");
                RegistrationOutcome::Failed
            }
            (Stage::CreatingProfile, _) => {
                tracing::info!("registration completed");
                *self = Self::default();
                RegistrationOutcome::Registered
            }
        }
    }

    pub fn teardown(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOutput;

    fn fill(workflow: &mut RegistrationWorkflow, password: &str, confirm: &str) {
        for (field, value) in [
            (RegisterField::DisplayName, "Ana"),
            (RegisterField::Email, "ana@example.org"),
            (RegisterField::Password, password),
            (RegisterField::ConfirmPassword, confirm),
        ] {
            workflow.edit(field, &FieldPatch::Set(value.into()));
        }
    }

    #[test]
    fn mismatched_passwords_issue_no_request() {
        let mut register = RegistrationWorkflow::new();
        fill(&mut register, "secreto", "secreta");
        assert!(register.submit().is_none());
        assert_eq!(register.phase().failure(), Some("Las contraseñas no coinciden"));
    }

    #[test]
    fn validation_order_is_required_length_match() {
        let mut register = RegistrationWorkflow::new();
        fill(&mut register, "abc", "xyz");
        register.edit(RegisterField::DisplayName, &FieldPatch::Set(String::new()));
        register.submit();
        assert_eq!(register.phase().failure(), Some("El campo Nombre es obligatorio"));

        register.edit(RegisterField::DisplayName, &FieldPatch::Set("Ana".into()));
        register.submit();
        assert_eq!(
            register.phase().failure(),
            Some("La contraseña debe tener al menos 6 caracteres")
        );
    }

    #[test]
    fn sign_up_sign_in_then_profile_insert() {
        let mut register = RegistrationWorkflow::new();
        fill(&mut register, "secreto", "secreto");
        let sign_up = register.submit().unwrap();
        assert_eq!(sign_up.purpose, Purpose::RegisterSignUp);
        assert!(register.submit().is_none());

        let identity = Identity::new("u1", "ana@example.org");
        let outcome = register.on_response(BackendResponse::ok(
            Purpose::RegisterSignUp,
            BackendOutput::Session(Some(identity.clone())),
        ));
        let RegistrationOutcome::Continue(sign_in) = outcome else {
            panic!("expected sign-in, got {outcome:?}");
        };
        assert_eq!(sign_in.purpose, Purpose::RegisterSignIn);

        let outcome = register.on_response(BackendResponse::ok(
            Purpose::RegisterSignIn,
            BackendOutput::Session(Some(identity.clone())),
        ));
        let RegistrationOutcome::SignedIn(signed_in, insert) = outcome else {
            panic!("expected profile insert, got {outcome:?}");
        };
        assert_eq!(signed_in, identity);
        let BackendOp::Insert { row, .. } = &insert.op else {
            panic!("expected insert");
        };
        assert_eq!(row["display_name"], "Ana");

        let outcome = register.on_response(BackendResponse::ok(
            Purpose::RegisterProfile,
            BackendOutput::Rows(vec![row.clone()]),
        ));
        assert_eq!(outcome, RegistrationOutcome::Registered);
        assert_eq!(register.value(RegisterField::Email), "");
    }

    #[test]
    fn sign_up_error_is_verbatim() {
        let mut register = RegistrationWorkflow::new();
        fill(&mut register, "secreto", "secreto");
        register.submit().unwrap();
        let outcome = register.on_response(BackendResponse::err(Purpose::RegisterSignUp, "User already registered"));
        assert_eq!(outcome, RegistrationOutcome::Failed);
        assert_eq!(register.phase().failure(), Some("User already registered"));
    }

    #[test]
    fn sign_up_without_user_stops_before_sign_in() {
        let mut register = RegistrationWorkflow::new();
        fill(&mut register, "secreto", "secreto");
        register.submit().unwrap();
        let outcome = register.on_response(BackendResponse::ok(
            Purpose::RegisterSignUp,
            BackendOutput::Session(None),
        ));
        assert_eq!(outcome, RegistrationOutcome::Failed);
        assert_eq!(register.phase().failure(), Some(SIGN_UP_WITHOUT_USER));
        assert!(register.submit().is_some());
    }

    #[test]
    fn login_clears_error_on_edit_and_returns_identity() {
        let mut login = LoginWorkflow::new();
        login.edit(LoginField::Email, &FieldPatch::Set("ana@example.org".into()));
        login.edit(LoginField::Password, &FieldPatch::Set("secreto".into()));
        login.submit().unwrap();
        assert!(login.submit().is_none());

        login.on_response(BackendResponse::err(Purpose::Login, "Invalid login credentials"));
        assert_eq!(login.phase().failure(), Some("Invalid login credentials"));
        login.edit(LoginField::Password, &FieldPatch::Pop);
        assert_eq!(login.phase(), &Phase::Idle);

        login.edit(LoginField::Password, &FieldPatch::Push('o'));
        login.submit().unwrap();
        let identity = login.on_response(BackendResponse::ok(
            Purpose::Login,
            BackendOutput::Session(Some(Identity::new("u1", "ana@example.org"))),
        ));
        assert_eq!(identity.map(|i| i.id), Some("u1".to_string()));
        assert_eq!(login.value(LoginField::Password), "");
    }

    #[test]
    fn login_rejects_malformed_email_locally() {
        let mut login = LoginWorkflow::new();
        login.edit(LoginField::Email, &FieldPatch::Set("ana".into()));
        login.edit(LoginField::Password, &FieldPatch::Set("secreto".into()));
        assert!(login.submit().is_none());
        assert_eq!(login.phase().failure(), Some("Ingresa un correo electrónico válido"));
    }
}
