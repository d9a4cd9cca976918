//! Generic staged-form wizard.
//!
//! A wizard owns a form state `S` and a fixed ordered list of steps. Each
//! step carries a pure completeness check over the state; nothing is cached,
//! so a check can never disagree with the fields it reads. Advancing is gated
//! on the current step's check, moving backwards never is, and the index can
//! not leave `0..step_count`.

use std::fmt;

/// One step of a wizard: a stable key, a display title, and the completeness
/// check that gates leaving it forward.
pub struct StepDef<S> {
    pub key: &'static str,
    pub title: &'static str,
    pub is_complete: fn(&S) -> bool,
}

impl<S> Clone for StepDef<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for StepDef<S> {}

impl<S> fmt::Debug for StepDef<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDef")
            .field("key", &self.key)
            .field("title", &self.title)
            .finish()
    }
}

/// Bounded, gated step sequencer over a form state.
#[derive(Debug)]
pub struct FormWizard<S> {
    state: S,
    steps: Vec<StepDef<S>>,
    step_index: usize,
}

impl<S> FormWizard<S> {
    pub fn new(state: S, steps: Vec<StepDef<S>>) -> Self {
        Self::with_start_step(state, steps, 0)
    }

    /// Starts on `start_step`, clamped into range. Entry points that jump
    /// straight to a later step (a map picker, a review link) use this.
    pub fn with_start_step(state: S, steps: Vec<StepDef<S>>, start_step: usize) -> Self {
        assert!(!steps.is_empty(), "a wizard needs at least one step");
        let step_index = start_step.min(steps.len() - 1);
        Self {
            state,
            steps,
            step_index,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn steps(&self) -> &[StepDef<S>] {
        &self.steps
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn current_step(&self) -> &StepDef<S> {
        &self.steps[self.step_index]
    }

    /// Whether the wizard sits on its last step.
    pub fn is_terminal_step(&self) -> bool {
        self.step_index + 1 == self.steps.len()
    }

    /// Evaluates the completeness check of the step at `index` against the
    /// current state. Out-of-range indices read as incomplete.
    pub fn step_complete(&self, index: usize) -> bool {
        self.steps
            .get(index)
            .map(|step| (step.is_complete)(&self.state))
            .unwrap_or(false)
    }

    pub fn current_step_complete(&self) -> bool {
        self.step_complete(self.step_index)
    }

    /// Moves one step forward if the current step is complete and a next step
    /// exists. Returns whether the index changed.
    pub fn advance(&mut self) -> bool {
        if !self.current_step_complete() {
            return false;
        }
        if self.step_index + 1 >= self.steps.len() {
            return false;
        }
        self.step_index += 1;
        true
    }

    /// Moves one step back unconditionally, stopping at the first step.
    /// Returns whether the index changed.
    pub fn retreat(&mut self) -> bool {
        if self.step_index == 0 {
            return false;
        }
        self.step_index -= 1;
        true
    }

    /// First gated step whose check fails, if any. The terminal step is not
    /// gated; it only hosts the submit action.
    pub fn first_incomplete_step(&self) -> Option<usize> {
        (0..self.steps.len().saturating_sub(1)).find(|&index| !self.step_complete(index))
    }
}

/// Outcome handed back to the embedder after a wizard submission succeeds.
#[derive(Debug, Clone)]
pub struct SubmitReceipt<R> {
    /// The persisted record as the backend returned it.
    pub record: R,
    /// Route the UI should move to once the success notification has been
    /// seen.
    pub redirect_to: &'static str,
}

/// Currency input keeping the raw digit string next to its grouped display
/// form. Setting it strips every non-digit, so pasted values like
/// "2,000,000 đ" land as "2000000".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountField {
    raw: String,
    display: String,
}

impl AmountField {
    pub fn from_value(value: i64) -> Self {
        let mut field = Self::default();
        field.set(&value.to_string());
        field
    }

    /// Replaces the content with the digits of `input`.
    pub fn set(&mut self, input: &str) {
        self.raw = input.chars().filter(char::is_ascii_digit).collect();
        self.display = group_thousands(&self.raw);
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.display.clear();
    }

    /// The bare digit string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The thousands-grouped form shown in the input.
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Numeric value, when the field holds one that fits an i64.
    pub fn value(&self) -> Option<i64> {
        self.raw.parse().ok()
    }
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut grouped = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*b as char);
    }
    grouped
}

/// Trims a free-text field and maps blank to absent.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
