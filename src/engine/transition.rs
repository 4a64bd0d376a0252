//! Order progress state machine.
//!
//! Pure functions over an order's status, its current stage and the stage
//! sequence of its task. Persistence and locking live in `engine::orders`.

use crate::error::WorkpilotError;
use crate::models::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Start,
    NextStage,
    PreviousStage,
    Complete,
    Cancel,
    Revert,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::NextStage => "next-stage",
            Self::PreviousStage => "previous-stage",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Revert => "revert",
        }
    }
}

/// Mutable part of an order: status plus current stage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub status: OrderStatus,
    pub current_stage: Option<String>,
}

impl Progress {
    pub fn created() -> Self {
        Self { status: OrderStatus::Created, current_stage: None }
    }
}

/// Index of `current` within `stages`, if set and present.
pub fn position(current: Option<&str>, stages: &[String]) -> Option<usize> {
    current.and_then(|id| stages.iter().position(|s| s == id))
}

/// True iff the order is IN_PROGRESS and not on the last stage.
pub fn has_next_stage(status: OrderStatus, pos: Option<usize>, stage_count: usize) -> bool {
    status == OrderStatus::InProgress && pos.is_some_and(|p| p + 1 < stage_count)
}

/// Compute the progress that `action` leads to, or the reason it is refused.
///
/// Terminal orders refuse every action before any other check runs.
pub fn apply(progress: &Progress, stages: &[String], action: OrderAction) -> Result<Progress, WorkpilotError> {
    if progress.status.is_terminal() {
        return Err(WorkpilotError::already_terminal(progress.status.as_str()));
    }
    let pos = position(progress.current_stage.as_deref(), stages);

    match action {
        OrderAction::Start => {
            if progress.status != OrderStatus::Created {
                return Err(WorkpilotError::invalid_transition(progress.status.as_str(), action.as_str()));
            }
            Ok(Progress {
                status: OrderStatus::InProgress,
                current_stage: stages.first().cloned(),
            })
        }
        OrderAction::NextStage => {
            require_in_progress(progress, action)?;
            match pos {
                Some(p) if p + 1 < stages.len() => Ok(Progress {
                    status: OrderStatus::InProgress,
                    current_stage: Some(stages[p + 1].clone()),
                }),
                _ => Err(WorkpilotError::no_next_stage()),
            }
        }
        OrderAction::PreviousStage => {
            require_in_progress(progress, action)?;
            match pos {
                Some(p) if p > 0 => Ok(Progress {
                    status: OrderStatus::InProgress,
                    current_stage: Some(stages[p - 1].clone()),
                }),
                _ => Err(WorkpilotError::no_previous_stage()),
            }
        }
        OrderAction::Complete => {
            require_in_progress(progress, action)?;
            let at_end = if stages.is_empty() {
                true
            } else {
                pos == Some(stages.len() - 1)
            };
            if !at_end {
                return Err(WorkpilotError::stage_not_final());
            }
            Ok(Progress {
                status: OrderStatus::Completed,
                current_stage: progress.current_stage.clone(),
            })
        }
        OrderAction::Cancel => Ok(Progress {
            status: OrderStatus::Cancelled,
            current_stage: progress.current_stage.clone(),
        }),
        OrderAction::Revert => Ok(Progress::created()),
    }
}

fn require_in_progress(progress: &Progress, action: OrderAction) -> Result<(), WorkpilotError> {
    if progress.status != OrderStatus::InProgress {
        return Err(WorkpilotError::invalid_transition(progress.status.as_str(), action.as_str()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn stages(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn run(progress: &Progress, seq: &[String], actions: &[OrderAction]) -> Result<Progress, WorkpilotError> {
        let mut current = progress.clone();
        for &action in actions {
            current = apply(&current, seq, action)?;
        }
        Ok(current)
    }

    fn next_flag(p: &Progress, seq: &[String]) -> bool {
        has_next_stage(p.status, position(p.current_stage.as_deref(), seq), seq.len())
    }

    #[test]
    fn test_onboarding_scenario() {
        let seq = stages(&["A", "B", "C"]);
        let created = Progress::created();
        assert!(!next_flag(&created, &seq));

        let started = apply(&created, &seq, OrderAction::Start).unwrap();
        assert_eq!(started.status, OrderStatus::InProgress);
        assert_eq!(started.current_stage.as_deref(), Some("A"));
        assert!(next_flag(&started, &seq));

        let at_c = run(&started, &seq, &[OrderAction::NextStage, OrderAction::NextStage]).unwrap();
        assert_eq!(at_c.current_stage.as_deref(), Some("C"));
        assert!(!next_flag(&at_c, &seq));

        let done = apply(&at_c, &seq, OrderAction::Complete).unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert!(!next_flag(&done, &seq));
    }

    #[test]
    fn test_zero_stage_task_completes_immediately() {
        let seq = stages(&[]);
        let started = apply(&Progress::created(), &seq, OrderAction::Start).unwrap();
        assert_eq!(started.status, OrderStatus::InProgress);
        assert_eq!(started.current_stage, None);
        assert!(!next_flag(&started, &seq));
        let done = apply(&started, &seq, OrderAction::Complete).unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
    }

    #[test]
    fn test_start_then_complete_only_for_zero_or_one_stage() {
        for n in 0..5 {
            let ids: Vec<String> = (0..n).map(|i| format!("s{i}")).collect();
            let result = run(&Progress::created(), &ids, &[OrderAction::Start, OrderAction::Complete]);
            assert_eq!(result.is_ok(), n <= 1, "stage count {n}");
            if n > 1 {
                assert_eq!(result.unwrap_err().code, ErrorCode::StageNotFinal);
            }
        }
    }

    #[test]
    fn test_next_then_previous_round_trips() {
        let seq = stages(&["A", "B", "C", "D"]);
        let mut p = apply(&Progress::created(), &seq, OrderAction::Start).unwrap();
        for _ in 0..3 {
            let back = run(&p, &seq, &[OrderAction::NextStage, OrderAction::PreviousStage]).unwrap();
            assert_eq!(back, p);
            p = apply(&p, &seq, OrderAction::NextStage).unwrap();
        }
    }

    #[test]
    fn test_next_at_last_stage_fails() {
        let seq = stages(&["A"]);
        let p = apply(&Progress::created(), &seq, OrderAction::Start).unwrap();
        assert_eq!(apply(&p, &seq, OrderAction::NextStage).unwrap_err().code, ErrorCode::NoNextStage);
    }

    #[test]
    fn test_previous_at_first_stage_fails() {
        let seq = stages(&["A", "B"]);
        let p = apply(&Progress::created(), &seq, OrderAction::Start).unwrap();
        assert_eq!(apply(&p, &seq, OrderAction::PreviousStage).unwrap_err().code, ErrorCode::NoPreviousStage);
    }

    #[test]
    fn test_stage_moves_require_in_progress() {
        let seq = stages(&["A", "B"]);
        for action in [OrderAction::NextStage, OrderAction::PreviousStage, OrderAction::Complete] {
            let err = apply(&Progress::created(), &seq, action).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidStateTransition, "{action:?}");
        }
    }

    #[test]
    fn test_start_twice_fails() {
        let seq = stages(&["A"]);
        let p = apply(&Progress::created(), &seq, OrderAction::Start).unwrap();
        assert_eq!(apply(&p, &seq, OrderAction::Start).unwrap_err().code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn test_cancel_from_created_never_sets_stage() {
        let seq = stages(&["A", "B"]);
        let p = apply(&Progress::created(), &seq, OrderAction::Cancel).unwrap();
        assert_eq!(p.status, OrderStatus::Cancelled);
        assert_eq!(p.current_stage, None);
    }

    #[test]
    fn test_cancel_keeps_stage_position() {
        let seq = stages(&["A", "B"]);
        let p = run(&Progress::created(), &seq, &[OrderAction::Start, OrderAction::NextStage, OrderAction::Cancel]).unwrap();
        assert_eq!(p.status, OrderStatus::Cancelled);
        assert_eq!(p.current_stage.as_deref(), Some("B"));
    }

    #[test]
    fn test_revert_resets_to_created() {
        let seq = stages(&["A", "B"]);
        let p = run(&Progress::created(), &seq, &[OrderAction::Start, OrderAction::NextStage, OrderAction::Revert]).unwrap();
        assert_eq!(p, Progress::created());
        assert!(apply(&p, &seq, OrderAction::Start).is_ok());
    }

    #[test]
    fn test_terminal_orders_refuse_everything() {
        let seq = stages(&["A"]);
        let completed = run(&Progress::created(), &seq, &[OrderAction::Start, OrderAction::Complete]).unwrap();
        let cancelled = apply(&Progress::created(), &seq, OrderAction::Cancel).unwrap();
        let all = [
            OrderAction::Start,
            OrderAction::NextStage,
            OrderAction::PreviousStage,
            OrderAction::Complete,
            OrderAction::Cancel,
            OrderAction::Revert,
        ];
        for terminal in [completed, cancelled] {
            for action in all {
                let err = apply(&terminal, &seq, action).unwrap_err();
                assert_eq!(err.code, ErrorCode::AlreadyTerminal, "{action:?}");
            }
        }
    }

    #[test]
    fn test_has_next_stage_only_in_progress() {
        assert!(has_next_stage(OrderStatus::InProgress, Some(0), 2));
        assert!(!has_next_stage(OrderStatus::InProgress, Some(1), 2));
        assert!(!has_next_stage(OrderStatus::InProgress, None, 2));
        assert!(!has_next_stage(OrderStatus::Created, None, 2));
        assert!(!has_next_stage(OrderStatus::Cancelled, Some(0), 2));
    }
}
