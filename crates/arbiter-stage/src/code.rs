//! Result codes passed between stages and up to the match controller.

use std::fmt;

/// What a leaf-stage command or a computer action reports.
///
/// `Ready` marks the acting slot ready; the engine then decides whether
/// the stage is finished. `Checkout` ends the stage right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Ok,
    Failed,
    Ready,
    Checkout,
}

/// What a composite-stage command reports. Composite commands never end
/// a stage by themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlResult {
    Ok,
    Failed,
}

/// The answer of hooks that only decide whether a stage ends
/// (timeouts, leaves, "everyone is ready").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutResult {
    Continue,
    Checkout,
}

/// The code every engine entry point returns.
///
/// `Ready` never leaves the engine: a ready action is folded into the
/// readiness mask and reported as `Ok`, `Continue` or `Checkout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCode {
    /// Handled, the stage goes on.
    Ok,
    /// Understood but refused (illegal move, wrong turn).
    Failed,
    Ready,
    /// The stage ended.
    Checkout,
    /// Everyone was ready, but the stage chose to go on.
    Continue,
    /// No command matched.
    NotFound,
}

impl StageCode {
    pub fn is_checkout(self) -> bool {
        self == Self::Checkout
    }
}

impl From<ActionResult> for StageCode {
    fn from(result: ActionResult) -> Self {
        match result {
            ActionResult::Ok => Self::Ok,
            ActionResult::Failed => Self::Failed,
            ActionResult::Ready => Self::Ready,
            ActionResult::Checkout => Self::Checkout,
        }
    }
}

impl From<ControlResult> for StageCode {
    fn from(result: ControlResult) -> Self {
        match result {
            ControlResult::Ok => Self::Ok,
            ControlResult::Failed => Self::Failed,
        }
    }
}

impl From<CheckoutResult> for StageCode {
    fn from(result: CheckoutResult) -> Self {
        match result {
            CheckoutResult::Continue => Self::Continue,
            CheckoutResult::Checkout => Self::Checkout,
        }
    }
}

impl fmt::Display for StageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Ready => "ready",
            Self::Checkout => "checkout",
            Self::Continue => "continue",
            Self::NotFound => "not found",
        };
        f.write_str(text)
    }
}

/// Why a composite stage is moving on from its current child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutReason {
    /// A request (or a computer action) finished the child.
    ByRequest,
    ByTimeout,
    ByLeave,
    /// The child was already over when it began.
    Skip,
}

impl fmt::Display for CheckoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ByRequest => "by request",
            Self::ByTimeout => "by timeout",
            Self::ByLeave => "by leave",
            Self::Skip => "skip",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_result_maps_one_to_one() {
        assert_eq!(StageCode::from(ActionResult::Ok), StageCode::Ok);
        assert_eq!(StageCode::from(ActionResult::Failed), StageCode::Failed);
        assert_eq!(StageCode::from(ActionResult::Ready), StageCode::Ready);
        assert_eq!(StageCode::from(ActionResult::Checkout), StageCode::Checkout);
    }

    #[test]
    fn test_checkout_result_maps_to_continue_or_checkout() {
        assert_eq!(StageCode::from(CheckoutResult::Continue), StageCode::Continue);
        assert!(StageCode::from(CheckoutResult::Checkout).is_checkout());
    }

    #[test]
    fn test_display() {
        assert_eq!(StageCode::NotFound.to_string(), "not found");
        assert_eq!(CheckoutReason::ByTimeout.to_string(), "by timeout");
    }
}
