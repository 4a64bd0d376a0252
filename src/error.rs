use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    Unauthorized,
    InvalidCredentials,
    EmailTaken,
    StageNotFound,
    TaskNotFound,
    CustomerNotFound,
    OrderNotFound,
    UserNotFound,
    AmbiguousRef,
    ValidationError,
    InvalidStateTransition,
    NoNextStage,
    NoPreviousStage,
    StageNotFinal,
    AlreadyTerminal,
    StageInUse,
    TaskInUse,
    CustomerInUse,
    CycleDetected,
    ConfigError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::StageNotFound => "STAGE_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::AmbiguousRef => "AMBIGUOUS_REF",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::NoNextStage => "NO_NEXT_STAGE",
            Self::NoPreviousStage => "NO_PREVIOUS_STAGE",
            Self::StageNotFinal => "STAGE_NOT_FINAL",
            Self::AlreadyTerminal => "ALREADY_TERMINAL",
            Self::StageInUse => "STAGE_IN_USE",
            Self::TaskInUse => "TASK_IN_USE",
            Self::CustomerInUse => "CUSTOMER_IN_USE",
            Self::CycleDetected => "CYCLE_DETECTED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct WorkpilotError {
    pub code: ErrorCode,
    pub message: String,
}

impl WorkpilotError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "workpilot is not initialized. Run `workpilot init` first.",
        )
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_logged_in() -> Self {
        Self::unauthorized("Not logged in. Use `workpilot auth login` first.")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid email or password")
    }

    pub fn email_taken(email: &str) -> Self {
        Self::new(
            ErrorCode::EmailTaken,
            format!("A user with email '{email}' already exists"),
        )
    }

    pub fn stage_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::StageNotFound,
            format!("Stage not found: {reference}"),
        )
    }

    pub fn task_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {reference}"),
        )
    }

    pub fn customer_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::CustomerNotFound,
            format!("Customer not found: {reference}"),
        )
    }

    pub fn order_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::OrderNotFound,
            format!("Order not found: {reference}"),
        )
    }

    pub fn user_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::UserNotFound,
            format!("User not found: {reference}"),
        )
    }

    pub fn ambiguous_ref(reference: &str, candidates: &[String]) -> Self {
        Self::new(
            ErrorCode::AmbiguousRef,
            format!(
                "Ambiguous reference '{}'. Candidates: {}",
                reference,
                candidates.join(", ")
            ),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn invalid_transition(from: &str, action: &str) -> Self {
        Self::new(
            ErrorCode::InvalidStateTransition,
            format!("Cannot {action} an order in status {from}"),
        )
    }

    pub fn no_next_stage() -> Self {
        Self::new(
            ErrorCode::NoNextStage,
            "Order is already at its last stage. Use `order complete` instead.",
        )
    }

    pub fn no_previous_stage() -> Self {
        Self::new(
            ErrorCode::NoPreviousStage,
            "Order is at its first stage and cannot move back",
        )
    }

    pub fn stage_not_final() -> Self {
        Self::new(
            ErrorCode::StageNotFinal,
            "Order can only be completed from its last stage",
        )
    }

    pub fn already_terminal(status: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyTerminal,
            format!("Order is already {status}; no further changes are allowed"),
        )
    }

    pub fn stage_in_use(stage: &str) -> Self {
        Self::new(
            ErrorCode::StageInUse,
            format!("Stage '{stage}' is the current stage of an open order"),
        )
    }

    pub fn task_in_use(task: &str, orders: i64) -> Self {
        Self::new(
            ErrorCode::TaskInUse,
            format!("Task '{task}' is referenced by {orders} order(s)"),
        )
    }

    pub fn customer_in_use(customer: &str, orders: i64) -> Self {
        Self::new(
            ErrorCode::CustomerInUse,
            format!("Customer '{customer}' is referenced by {orders} order(s)"),
        )
    }

    pub fn cycle_detected() -> Self {
        Self::new(ErrorCode::CycleDetected, "Stage flow contains a cycle")
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl From<rusqlite::Error> for WorkpilotError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<std::io::Error> for WorkpilotError {
    fn from(e: std::io::Error) -> Self {
        Self::config(e.to_string())
    }
}

impl From<serde_json::Error> for WorkpilotError {
    fn from(e: serde_json::Error) -> Self {
        Self::config(format!("Invalid config file: {e}"))
    }
}
