//! Quick-action wizard: actions, steps and the step state machine

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};

/// Wizard data collected across steps.
pub type WorkflowData = Map<String, Value>;

/// Guided workflows offered by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickAction {
    /// Deploy a site and point its domain at the deployment.
    DeployDns,
    /// Upsert a single record for a site's domain.
    DnsOnly,
    /// Check propagation of a hostname.
    TestDns,
    /// Register, create the zone, deploy and point DNS.
    QuickSetup,
}

/// A step's completion condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepValidator {
    Always,
    /// Every listed data key holds a non-empty value.
    Requires(&'static [&'static str]),
}

impl StepValidator {
    /// Data keys still missing for this step.
    pub fn missing(self, data: &WorkflowData) -> Vec<&'static str> {
        match self {
            Self::Always => Vec::new(),
            Self::Requires(keys) => keys
                .iter()
                .copied()
                .filter(|key| !is_set(data.get(*key)))
                .collect(),
        }
    }

    pub fn holds(self, data: &WorkflowData) -> bool {
        self.missing(data).is_empty()
    }
}

fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStep {
    pub title: &'static str,
    pub validator: StepValidator,
}

const fn step(title: &'static str, validator: StepValidator) -> WorkflowStep {
    WorkflowStep { title, validator }
}

const DEPLOY_DNS_STEPS: &[WorkflowStep] = &[
    step("Select Domain", StepValidator::Requires(&["domainId"])),
    step("Select Target", StepValidator::Requires(&["target"])),
    step("Confirm", StepValidator::Always),
];

const DNS_ONLY_STEPS: &[WorkflowStep] = &[
    step("Select Domain", StepValidator::Requires(&["domainId"])),
    step(
        "Configure Record",
        StepValidator::Requires(&["recordType", "name", "content"]),
    ),
    step("Confirm", StepValidator::Always),
];

const TEST_DNS_STEPS: &[WorkflowStep] = &[
    step("Enter Hostname", StepValidator::Requires(&["hostname"])),
    step("Run Check", StepValidator::Always),
];

const QUICK_SETUP_STEPS: &[WorkflowStep] = &[
    step("Enter Domain", StepValidator::Requires(&["domain"])),
    step("DNS Account", StepValidator::Requires(&["dnsAccountId"])),
    step("Select Target", StepValidator::Requires(&["target"])),
    step("Confirm", StepValidator::Always),
];

impl QuickAction {
    pub const ALL: [Self; 4] = [Self::DeployDns, Self::DnsOnly, Self::TestDns, Self::QuickSetup];

    pub fn slug(self) -> &'static str {
        match self {
            Self::DeployDns => "deploy-dns",
            Self::DnsOnly => "dns-only",
            Self::TestDns => "test-dns",
            Self::QuickSetup => "quick-setup",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::DeployDns => "Deploy + DNS",
            Self::DnsOnly => "Update DNS",
            Self::TestDns => "Test DNS",
            Self::QuickSetup => "Quick Setup",
        }
    }

    pub fn steps(self) -> &'static [WorkflowStep] {
        match self {
            Self::DeployDns => DEPLOY_DNS_STEPS,
            Self::DnsOnly => DNS_ONLY_STEPS,
            Self::TestDns => TEST_DNS_STEPS,
            Self::QuickSetup => QUICK_SETUP_STEPS,
        }
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for QuickAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown action type: {s}")))
    }
}

/// Linear wizard state. `current_step` is 1-indexed.
///
/// The step only advances through [`next`](Self::next), which checks the active
/// step's validator first.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    action: QuickAction,
    current_step: usize,
    data: WorkflowData,
}

impl WorkflowState {
    pub fn new(action: QuickAction) -> Self {
        Self {
            action,
            current_step: 1,
            data: WorkflowData::new(),
        }
    }

    /// Start with pre-filled data, still at step 1.
    pub fn with_data(action: QuickAction, data: WorkflowData) -> Self {
        Self {
            action,
            current_step: 1,
            data,
        }
    }

    pub fn action(&self) -> QuickAction {
        self.action
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.action.steps().len()
    }

    pub fn step(&self) -> &'static WorkflowStep {
        &self.action.steps()[self.current_step - 1]
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.total_steps()
    }

    pub fn data(&self) -> &WorkflowData {
        &self.data
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Overwrite `data` keys with the given entries.
    pub fn merge(&mut self, entries: WorkflowData) {
        self.data.extend(entries);
    }

    fn check_current(&self) -> CoreResult<()> {
        let step = self.step();
        let missing = step.validator.missing(&self.data);
        if missing.is_empty() {
            return Ok(());
        }
        Err(CoreError::StepBlocked {
            step: self.current_step,
            title: step.title.to_string(),
            missing: missing.into_iter().map(str::to_string).collect(),
        })
    }

    /// Advance if the active step is complete. A no-op on the last step.
    pub fn next(&mut self) -> CoreResult<usize> {
        self.check_current()?;
        if !self.is_last_step() {
            self.current_step += 1;
        }
        Ok(self.current_step)
    }

    /// Step back unconditionally. A no-op on the first step.
    pub fn back(&mut self) -> usize {
        if self.current_step > 1 {
            self.current_step -= 1;
        }
        self.current_step
    }

    /// Abandon the wizard; collected data is dropped.
    pub fn cancel(self) {
        log::debug!(
            "Quick action {} cancelled at step {}",
            self.action,
            self.current_step
        );
    }

    /// Hand the collected data over for execution.
    ///
    /// Requires the last step and its validator.
    pub fn finish(self) -> CoreResult<(QuickAction, WorkflowData)> {
        if !self.is_last_step() {
            return Err(CoreError::ValidationError(format!(
                "Quick action {} is at step {} of {}",
                self.action,
                self.current_step,
                self.total_steps()
            )));
        }
        self.check_current()?;
        Ok((self.action, self.data))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blocked_at_select_domain_until_domain_id_set() {
        let mut state = WorkflowState::new(QuickAction::DeployDns);
        let err = state.next().unwrap_err();
        let CoreError::StepBlocked { step, title, missing } = err else {
            panic!("expected StepBlocked, got {err:?}");
        };
        assert_eq!((step, title.as_str()), (1, "Select Domain"));
        assert_eq!(missing, vec!["domainId"]);
        assert_eq!(state.current_step(), 1);

        state.set("domainId", "site-1");
        assert_eq!(state.next().unwrap(), 2);
        assert_eq!(state.step().title, "Select Target");
    }

    #[test]
    fn empty_string_does_not_satisfy_validator() {
        let mut state = WorkflowState::new(QuickAction::TestDns);
        state.set("hostname", "  ");
        assert!(state.next().is_err());
        state.set("hostname", "example.com");
        assert_eq!(state.next().unwrap(), 2);
    }

    #[test]
    fn back_is_unconditional_and_stops_at_first() {
        let mut state = WorkflowState::new(QuickAction::TestDns);
        assert_eq!(state.back(), 1);
        state.set("hostname", "example.com");
        state.next().unwrap();
        state.merge(json!({ "hostname": null }).as_object().cloned().unwrap());
        assert_eq!(state.back(), 1);
    }

    #[test]
    fn next_on_last_step_stays() {
        let mut state = WorkflowState::new(QuickAction::TestDns);
        state.set("hostname", "example.com");
        state.next().unwrap();
        assert!(state.is_last_step());
        assert_eq!(state.next().unwrap(), 2);
    }

    #[test]
    fn dns_only_lists_every_missing_field() {
        let mut state = WorkflowState::new(QuickAction::DnsOnly);
        state.set("domainId", "site-1");
        state.next().unwrap();
        state.set("name", "www");
        let err = state.next().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Step 2 (Configure Record) is incomplete: missing recordType, content"
        );
    }

    #[test]
    fn finish_requires_last_step() {
        let mut state = WorkflowState::new(QuickAction::QuickSetup);
        state.set("domain", "example.com");
        state.next().unwrap();
        assert!(matches!(
            state.clone().finish(),
            Err(CoreError::ValidationError(_))
        ));

        state.set("dnsAccountId", "main");
        state.next().unwrap();
        state.set("target", "cf-pages");
        state.next().unwrap();
        let (action, data) = state.finish().unwrap();
        assert_eq!(action, QuickAction::QuickSetup);
        assert_eq!(data["target"], "cf-pages");
    }

    #[test]
    fn action_slugs_parse() {
        for action in QuickAction::ALL {
            assert_eq!(action.slug().parse::<QuickAction>().unwrap(), action);
            assert!(!action.steps().is_empty());
        }
        assert!("deploy".parse::<QuickAction>().is_err());
    }
}
