use log::{debug, trace, warn};

use crate::flag::{
    match_targeting_rules, AccessResult, EvalConfiguration, EvaluationMode, FlagDefinition,
    SubjectKind, WindowStatus, ON_VARIATION,
};

use super::{EvaluationContext, EvaluationResult};

const USER_MODES: [EvaluationMode; 2] = [
    EvaluationMode::UserTargeted,
    EvaluationMode::UserRolloutPercentage,
];
const TENANT_MODES: [EvaluationMode; 2] = [
    EvaluationMode::TenantTargeted,
    EvaluationMode::TenantRolloutPercentage,
];

/// Evaluate `flag` for `context`.
///
/// Modes are checked in priority order: `Off`, `On`, schedule, operational window, targeting
/// rules, user access, tenant access. The first gate that fails decides the result. Evaluation
/// never fails: bad context data resolves to a disabled result with a reason.
pub fn evaluate_flag(flag: &FlagDefinition, context: &EvaluationContext) -> EvaluationResult {
    let flag_key = flag.key();

    if flag.is_expired(context.now) {
        warn!(target: "propel", flag_key; "evaluating an expired flag");
    }

    let result = eval_gates(flag, context);

    trace!(target: "propel",
           flag_key,
           is_enabled = result.is_enabled,
           variation = result.variation.as_str(),
           reason = result.reason.as_str();
           "evaluated a flag");

    result
}

fn eval_gates(flag: &FlagDefinition, context: &EvaluationContext) -> EvaluationResult {
    let flag_key = flag.key();
    let config = flag.configuration();
    let modes = &config.active_evaluation_modes;

    if modes.contains(EvaluationMode::Off) {
        return EvaluationResult::disabled("Flag is off", config.variations.default_variation());
    }
    if modes.contains(EvaluationMode::On) {
        return EvaluationResult::enabled("Flag is on", select_variation(flag, context));
    }

    // Reason of the last gate passed.
    let mut reason = None;

    if modes.contains(EvaluationMode::Scheduled) {
        let status = config.schedule.is_active_at(context.now);
        if !status.is_active() {
            return short_circuit(flag_key, config, status.to_string());
        }
        reason = Some(status.to_string());
    }

    if modes.contains(EvaluationMode::TimeWindow) {
        let status = config
            .operational_window
            .is_active_at(context.now, context.time_zone.as_deref());
        if let WindowStatus::InvalidTimeZone(time_zone) = &status {
            warn!(target: "propel",
                  flag_key,
                  time_zone = time_zone.as_str();
                  "context time zone is not a recognized IANA or Windows identifier");
        }
        if !status.is_active() {
            return short_circuit(flag_key, config, status.to_string());
        }
        reason = Some(status.to_string());
    }

    if modes.contains(EvaluationMode::TargetingRules) {
        match match_targeting_rules(&config.targeting_rules, context) {
            Some(rule) => {
                if !config.variations.contains(&rule.variation) {
                    warn!(target: "propel",
                          flag_key,
                          variation = rule.variation.as_str();
                          "targeting rule refers to an unknown variation");
                }
                return EvaluationResult::enabled(
                    format!("Targeting rule matched: {}", rule.attribute),
                    rule.variation.as_str(),
                );
            }
            None => reason = Some("No targeting rules matched".to_owned()),
        }
    }

    let audiences = [
        (SubjectKind::User, USER_MODES),
        (SubjectKind::Tenant, TENANT_MODES),
    ];
    for (kind, kind_modes) in audiences {
        if !modes.contains_modes(&kind_modes, true) {
            continue;
        }
        let (access_control, subject_id) = match kind {
            SubjectKind::User => (&config.user_access_control, context.user_id.as_deref()),
            SubjectKind::Tenant => (&config.tenant_access_control, context.tenant_id.as_deref()),
        };
        let (access, access_reason) = access_control.evaluate_access(kind, subject_id, flag_key);
        if access == AccessResult::Denied {
            return short_circuit(flag_key, config, access_reason.to_string());
        }
        reason = Some(access_reason.to_string());
    }

    EvaluationResult::enabled(
        reason.unwrap_or_else(|| "Flag is enabled".to_owned()),
        select_variation(flag, context),
    )
}

fn short_circuit(flag_key: &str, config: &EvalConfiguration, reason: String) -> EvaluationResult {
    debug!(target: "propel", flag_key, reason = reason.as_str(); "flag gate is closed");
    EvaluationResult::disabled(reason, config.variations.default_variation())
}

fn select_variation<'a>(flag: &'a FlagDefinition, context: &EvaluationContext) -> &'a str {
    let variations = &flag.configuration().variations;
    if variations.is_boolean_toggle() {
        ON_VARIATION
    } else {
        variations.select(flag.key(), context.variation_subject())
    }
}
