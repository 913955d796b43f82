//! Mutations applied by the management layer.
//!
//! Each operation leaves the flag's [`EvalConfiguration`](super::EvalConfiguration) internally
//! consistent: the active evaluation modes always reflect which gates are configured. Operations
//! that need the current time take it as an argument.
use std::collections::HashMap;

use log::debug;

use crate::{Error, Result};

use super::{
    AccessControl, ActivationSchedule, EvaluationMode, EvaluationModeSet, FlagDefinition,
    FlagScope, SubjectKind, TargetingRule, TimeZoneWindow, Timestamp, Variations,
};

impl FlagDefinition {
    /// Create a flag that is off, with no gates and boolean variations.
    pub fn new(key: impl Into<String>, scope: FlagScope, name: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::invalid_argument("key", "flag key must not be empty"));
        }
        Ok(FlagDefinition {
            key,
            scope,
            name: name.into(),
            description: String::new(),
            tags: HashMap::new(),
            is_permanent: false,
            expiration_date: None,
            configuration: Default::default(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_permanent(mut self, is_permanent: bool) -> Self {
        self.is_permanent = is_permanent;
        self
    }

    pub fn with_expiration_date(mut self, expiration_date: Option<Timestamp>) -> Self {
        self.expiration_date = expiration_date;
        self
    }

    /// Enable for everyone. Clears schedule, window and access control; targeting rules are kept
    /// but no longer active.
    pub fn turn_on(&mut self) {
        self.reset_gates();
        self.configuration
            .active_evaluation_modes
            .add_mode(EvaluationMode::On);
        debug!(target: "propel", flag_key = self.key.as_str(); "flag turned on");
    }

    /// Disable for everyone. Clears schedule, window and access control.
    pub fn turn_off(&mut self) {
        self.reset_gates();
        self.configuration
            .active_evaluation_modes
            .add_mode(EvaluationMode::Off);
        debug!(target: "propel", flag_key = self.key.as_str(); "flag turned off");
    }

    fn reset_gates(&mut self) {
        let config = &mut self.configuration;
        config.schedule = ActivationSchedule::unscheduled();
        config.operational_window = TimeZoneWindow::none();
        config.user_access_control = AccessControl::unrestricted();
        config.tenant_access_control = AccessControl::unrestricted();
        config.active_evaluation_modes = EvaluationModeSet::new();
    }

    /// Schedule the flag to enable at `enable_on` and optionally disable at `disable_on`.
    pub fn schedule(
        &mut self,
        enable_on: Timestamp,
        disable_on: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<()> {
        let schedule = ActivationSchedule::create(enable_on, disable_on, now)?;
        let config = &mut self.configuration;
        config.schedule = schedule;
        config.active_evaluation_modes.remove_mode(EvaluationMode::On);
        config
            .active_evaluation_modes
            .add_mode(EvaluationMode::Scheduled);
        Ok(())
    }

    pub fn clear_schedule(&mut self) {
        let config = &mut self.configuration;
        config.schedule = ActivationSchedule::unscheduled();
        config
            .active_evaluation_modes
            .remove_mode(EvaluationMode::Scheduled);
    }

    /// Restrict the flag to `window`. A zero-length window clears the restriction.
    pub fn set_operational_window(&mut self, window: TimeZoneWindow) {
        if !window.has_window() {
            self.clear_operational_window();
            return;
        }
        let config = &mut self.configuration;
        config.operational_window = window;
        config.active_evaluation_modes.remove_mode(EvaluationMode::On);
        config
            .active_evaluation_modes
            .add_mode(EvaluationMode::TimeWindow);
    }

    pub fn clear_operational_window(&mut self) {
        let config = &mut self.configuration;
        config.operational_window = TimeZoneWindow::none();
        config
            .active_evaluation_modes
            .remove_mode(EvaluationMode::TimeWindow);
    }

    /// Replace the user or tenant access control.
    ///
    /// The targeted mode is active iff the allow/block lists are non-empty; the rollout mode is
    /// active iff the percentage is below 100.
    pub fn set_access_control(&mut self, kind: SubjectKind, access: AccessControl) {
        let (targeted, rollout) = match kind {
            SubjectKind::User => (
                EvaluationMode::UserTargeted,
                EvaluationMode::UserRolloutPercentage,
            ),
            SubjectKind::Tenant => (
                EvaluationMode::TenantTargeted,
                EvaluationMode::TenantRolloutPercentage,
            ),
        };
        let has_lists = access.has_subject_lists();
        let is_partial = access.rollout_percentage() < 100;

        let config = &mut self.configuration;
        match kind {
            SubjectKind::User => config.user_access_control = access,
            SubjectKind::Tenant => config.tenant_access_control = access,
        }

        let modes = &mut config.active_evaluation_modes;
        if has_lists || is_partial {
            modes.remove_mode(EvaluationMode::On);
        }
        if has_lists {
            modes.add_mode(targeted);
        } else {
            modes.remove_mode(targeted);
        }
        if is_partial {
            modes.add_mode(rollout);
        } else {
            modes.remove_mode(rollout);
        }
    }

    pub fn set_targeting_rules(&mut self, rules: Vec<TargetingRule>) {
        let config = &mut self.configuration;
        if rules.is_empty() {
            config
                .active_evaluation_modes
                .remove_mode(EvaluationMode::TargetingRules);
        } else {
            config.active_evaluation_modes.remove_mode(EvaluationMode::On);
            config
                .active_evaluation_modes
                .add_mode(EvaluationMode::TargetingRules);
        }
        config.targeting_rules = rules;
    }

    pub fn set_variations(&mut self, variations: Variations) {
        self.configuration.variations = variations;
    }

    /// Whether a non-permanent flag has passed its expiration date.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !self.is_permanent && self.expiration_date.is_some_and(|date| date <= now)
    }

    /// Fails for permanent flags, which must never be deleted.
    pub fn ensure_deletable(&self) -> Result<()> {
        if self.is_permanent {
            Err(Error::PermanentFlag(self.key.clone()))
        } else {
            Ok(())
        }
    }
}
