use crate::eval::log_builder::EvalLogBuilder;
use crate::model::config::{
    Condition, Config, DependentFlagCondition, PercentageOption, Segment, SegmentCondition,
    Setting, SettingValue, TargetingRule, UserCondition,
};
use crate::model::enums::{DependentFlagComparator, SegmentComparator, SettingType, UserComparator};
use crate::utils::{parse_semver, sha1, sha256};
use crate::value::Value;
use crate::User;
use log::info;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Outcome of evaluating a single condition (user, segment, or dependent-flag).
pub(crate) enum ConditionResult {
    Success(bool),
    AttrMissing(UserCondition),
    AttrInvalid(String, UserCondition),
    CompValInvalid(Option<String>),
    Fatal(String),
}

impl ConditionResult {
    fn matched(&self) -> bool {
        matches!(self, ConditionResult::Success(true))
    }

    fn is_error(&self) -> bool {
        !matches!(self, ConditionResult::Success(_))
    }
}

impl Display for ConditionResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionResult::Success(_) => f.write_str(""),
            ConditionResult::AttrMissing(cond) => write!(
                f,
                "cannot evaluate, the User.{} attribute is missing",
                cond.fmt_comp_attr()
            ),
            ConditionResult::AttrInvalid(reason, cond) => write!(
                f,
                "cannot evaluate, the User.{} attribute is invalid ({})",
                cond.fmt_comp_attr(),
                reason
            ),
            ConditionResult::CompValInvalid(err) => write!(
                f,
                "cannot evaluate, ({})",
                err.as_ref()
                    .unwrap_or(&"comparison value is missing or invalid".to_owned())
            ),
            ConditionResult::Fatal(err) => write!(f, "cannot evaluate ({err})"),
        }
    }
}

/// Result of a successful flag/setting evaluation.
pub struct EvalResult {
    pub value: Value,
    pub variation_id: Option<String>,
    pub rule: Option<Arc<TargetingRule>>,
    pub option: Option<Arc<PercentageOption>>,
    pub setting_type: SettingType,
}

/// Evaluates the setting identified by `key`, applying targeting rules and percentage
/// options against `user` (when present), recursing into dependent-flag conditions as
/// needed. `default` is only used to fill in a value when the setting has none set.
pub fn eval(
    config: &Config,
    key: &str,
    user: Option<&User>,
    default: Option<&Value>,
) -> Result<EvalResult, String> {
    let setting = config
        .settings
        .get(key)
        .ok_or_else(|| format!("Setting '{key}' is not present in the config JSON."))?;
    eval_setting(config, setting, key, user, default, &HashSet::new())
}

fn eval_setting(
    config: &Config,
    setting: &Setting,
    key: &str,
    user: Option<&User>,
    default: Option<&Value>,
    visited: &HashSet<String>,
) -> Result<EvalResult, String> {
    let setting_type = setting
        .setting_type
        .clone()
        .ok_or_else(|| format!("Setting '{key}' has no declared type."))?;

    let Some(user) = user else {
        let mut log = EvalLogBuilder::default();
        log.append(format!("Evaluating get_value('{key}').").as_str());
        if setting
            .targeting_rules
            .as_ref()
            .is_some_and(|rules| !rules.is_empty())
        {
            info!(event_id = 3001; "Cannot evaluate targeting rules and % options for setting '{key}' (User Object is missing). You should pass a User Object to the evaluation methods like `get_value()` in order to make targeting work properly. Read more: https://configcat.com/docs/advanced/user-object/");
            log.new_ln(Some(
                "Skipping targeting rules and % options because the User Object is missing.",
            ));
        }
        let value = value_of(setting.value.as_ref(), &setting_type, default);
        log.new_ln(Some(format!("Returning '{value}'.").as_str()));
        emit_log(&log);
        return Ok(EvalResult {
            value,
            variation_id: setting.variation_id.clone(),
            rule: None,
            option: None,
            setting_type,
        });
    };

    let salt = config
        .preferences
        .as_ref()
        .map(|p| p.salt.as_str())
        .unwrap_or("");

    let mut log = EvalLogBuilder::default();
    log.append(format!("Evaluating get_value('{key}').").as_str());
    log.new_ln(Some(format!("User object:\n{user}").as_str()));

    let empty = Vec::new();
    let rules = setting.targeting_rules.as_ref().unwrap_or(&empty);
    for rule in rules {
        let conditions = rule.conditions.as_ref().map(Vec::as_slice).unwrap_or(&[]);
        let matched = evaluate_conditions(conditions, user, key, salt, config, visited, &mut log)?;
        if matched {
            if let Some(served) = rule.served_value.as_ref() {
                log.new_ln(Some(
                    format!("Rule matched. Returning '{}'.", served.value).as_str(),
                ));
                emit_log(&log);
                return Ok(EvalResult {
                    value: value_from_setting_value(&served.value, &setting_type),
                    variation_id: served
                        .variation_id
                        .clone()
                        .or_else(|| setting.variation_id.clone()),
                    rule: Some(Arc::new(rule.clone())),
                    option: None,
                    setting_type,
                });
            }

            if let Some(options) = rule.percentage_options.as_ref() {
                if let Some((option, value)) = pick_percentage_option(
                    options,
                    user,
                    key,
                    setting.percentage_attribute.as_deref(),
                    &setting_type,
                ) {
                    log.new_ln(Some(
                        format!("Evaluating % options. Returning '{value}'.").as_str(),
                    ));
                    emit_log(&log);
                    return Ok(EvalResult {
                        value,
                        variation_id: option
                            .variation_id
                            .clone()
                            .or_else(|| setting.variation_id.clone()),
                        rule: None,
                        option: Some(Arc::new(option)),
                        setting_type,
                    });
                }
            }
        }
    }

    let value = value_of(setting.value.as_ref(), &setting_type, default);
    log.new_ln(Some(format!("Returning '{value}'.").as_str()));
    emit_log(&log);
    Ok(EvalResult {
        value,
        variation_id: setting.variation_id.clone(),
        rule: None,
        option: None,
        setting_type,
    })
}

fn emit_log(log: &EvalLogBuilder) {
    info!(event_id = 5000; "{}", log.content());
}

fn pick_percentage_option(
    options: &[PercentageOption],
    user: &User,
    key: &str,
    percentage_attribute: Option<&str>,
    setting_type: &SettingType,
) -> Option<(PercentageOption, Value)> {
    let user_key = match percentage_attribute {
        Some(attr) => user
            .get(attr)
            .map(|v| v.as_str().0)
            .unwrap_or_else(|| user.get_identifier()),
        None => user.get_identifier(),
    };
    let hash_hex = sha1(format!("{key}{user_key}").as_str());
    let hash_val = u64::from_str_radix(&hash_hex[..7], 16).unwrap_or(0) % 100;

    let mut bucket: i64 = 0;
    for option in options {
        bucket += option.percentage;
        if (hash_val as i64) < bucket {
            return Some((
                option.clone(),
                value_from_setting_value(&option.served_value, setting_type),
            ));
        }
    }
    None
}

fn evaluate_conditions(
    conditions: &[Condition],
    user: &User,
    key: &str,
    salt: &str,
    config: &Config,
    visited: &HashSet<String>,
    log: &mut EvalLogBuilder,
) -> Result<bool, String> {
    for condition in conditions {
        let result = if let Some(user_condition) = condition.user_condition.as_ref() {
            evaluate_user_condition(user_condition, user, key, salt)
        } else if let Some(segment_condition) = condition.segment_condition.as_ref() {
            evaluate_segment_condition(segment_condition, user, key, salt, config)
        } else if let Some(dependent_condition) = condition.dependent_flag_condition.as_ref() {
            evaluate_dependent_flag_condition(dependent_condition, user, config, visited)?
        } else {
            ConditionResult::Fatal("condition has no recognizable kind".to_owned())
        };

        log.new_ln(Some(format!("{result}").as_str()));

        if !result.matched() {
            if result.is_error() {
                log.append(" => SKIP rule");
            }
            return Ok(false);
        }
    }
    Ok(true)
}

fn evaluate_dependent_flag_condition(
    condition: &DependentFlagCondition,
    user: &User,
    config: &Config,
    visited: &HashSet<String>,
) -> Result<ConditionResult, String> {
    let Some(dependency_key) = condition.flag_key.as_ref() else {
        return Ok(ConditionResult::CompValInvalid(Some(
            "dependency flag key is missing".to_owned(),
        )));
    };

    if visited.contains(dependency_key) {
        return Err(format!(
            "Circular dependency detected between the following depending flags: '{dependency_key}'."
        ));
    }

    let Some(dependency_setting) = config.settings.get(dependency_key) else {
        return Ok(ConditionResult::CompValInvalid(Some(format!(
            "dependency flag '{dependency_key}' is not present in the config JSON"
        ))));
    };

    let mut next_visited = visited.clone();
    next_visited.insert(dependency_key.clone());

    let dependency_result = eval_setting(
        config,
        dependency_setting,
        dependency_key,
        Some(user),
        None,
        &next_visited,
    )?;

    let comparison_value =
        value_from_setting_value(&condition.flag_value, &dependency_result.setting_type);

    let matched = match condition.dependency_comparator {
        DependentFlagComparator::Eq => dependency_result.value == comparison_value,
        DependentFlagComparator::NotEq => dependency_result.value != comparison_value,
    };
    Ok(ConditionResult::Success(matched))
}

fn evaluate_segment_condition(
    condition: &SegmentCondition,
    user: &User,
    context_salt: &str,
    salt: &str,
    config: &Config,
) -> ConditionResult {
    let empty: Vec<Segment> = Vec::new();
    let segments = config.segments.as_ref().unwrap_or(&empty);
    let Some(segment) = segments.get(condition.index as usize) else {
        return ConditionResult::CompValInvalid(Some(
            "segment reference is out of range".to_owned(),
        ));
    };
    let segment_name = segment.name.as_deref().unwrap_or("<segment>");
    let empty_conditions: Vec<UserCondition> = Vec::new();
    let rules = segment.conditions.as_ref().unwrap_or(&empty_conditions);

    let matched = match condition.segment_comparator {
        SegmentComparator::IsIn => rules
            .iter()
            .all(|r| evaluate_user_condition(r, user, segment_name, salt).matched()),
        SegmentComparator::IsNotIn => rules
            .iter()
            .all(|r| !evaluate_user_condition(r, user, segment_name, salt).matched()),
    };
    ConditionResult::Success(matched)
}

fn evaluate_user_condition(
    condition: &UserCondition,
    user: &User,
    context_salt: &str,
    salt: &str,
) -> ConditionResult {
    let attr_key = condition.comp_attr.as_deref().unwrap_or("");
    let Some(user_value) = user.get(attr_key) else {
        return ConditionResult::AttrMissing(condition.clone());
    };

    if condition.comparator.is_unsupported() {
        return ConditionResult::Fatal(format!(
            "comparison operator '{}' is not supported",
            condition.comparator
        ));
    }

    use UserComparator::*;
    match &condition.comparator {
        OneOf | NotOneOf => {
            let (text, _) = user_value.as_str();
            let Some(list) = condition.string_vec_val.as_ref() else {
                return ConditionResult::CompValInvalid(None);
            };
            let matched = list.iter().any(|item| item.trim() == text);
            ConditionResult::Success(matched == (condition.comparator == OneOf))
        }
        Contains | NotContains => {
            let (text, _) = user_value.as_str();
            let Some(cmp) = condition.string_val.as_ref() else {
                return ConditionResult::CompValInvalid(None);
            };
            let matched = text.contains(cmp.as_str());
            ConditionResult::Success(matched == (condition.comparator == Contains))
        }
        OneOfSemver | NotOneOfSemver => {
            let Some(version) = user_value.as_semver() else {
                return ConditionResult::AttrInvalid(
                    "not a valid semantic version".to_owned(),
                    condition.clone(),
                );
            };
            let Some(list) = condition.string_vec_val.as_ref() else {
                return ConditionResult::CompValInvalid(None);
            };
            let mut matched = false;
            for raw in list {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_semver(trimmed) {
                    Ok(parsed) => matched = matched || parsed == version,
                    Err(err) => {
                        return ConditionResult::CompValInvalid(Some(err.to_string()));
                    }
                }
            }
            ConditionResult::Success(matched == (condition.comparator == OneOfSemver))
        }
        LessSemver | LessEqSemver | GreaterSemver | GreaterEqSemver => {
            let Some(version) = user_value.as_semver() else {
                return ConditionResult::AttrInvalid(
                    "not a valid semantic version".to_owned(),
                    condition.clone(),
                );
            };
            let Some(cmp_raw) = condition.string_val.as_ref() else {
                return ConditionResult::CompValInvalid(None);
            };
            let cmp_version = match parse_semver(cmp_raw.trim()) {
                Ok(v) => v,
                Err(err) => return ConditionResult::CompValInvalid(Some(err.to_string())),
            };
            let matched = match &condition.comparator {
                LessSemver => version < cmp_version,
                LessEqSemver => version <= cmp_version,
                GreaterSemver => version > cmp_version,
                GreaterEqSemver => version >= cmp_version,
                _ => unreachable!(),
            };
            ConditionResult::Success(matched)
        }
        EqNum | NotEqNum | LessNum | LessEqNum | GreaterNum | GreaterEqNum => {
            let Some(user_num) = user_value.as_float() else {
                return ConditionResult::AttrInvalid(
                    "not a valid decimal number".to_owned(),
                    condition.clone(),
                );
            };
            let Some(cmp_num) = condition.double_val else {
                return ConditionResult::CompValInvalid(None);
            };
            let matched = match &condition.comparator {
                EqNum => user_num == cmp_num,
                NotEqNum => user_num != cmp_num,
                LessNum => user_num < cmp_num,
                LessEqNum => user_num <= cmp_num,
                GreaterNum => user_num > cmp_num,
                GreaterEqNum => user_num >= cmp_num,
                _ => unreachable!(),
            };
            ConditionResult::Success(matched)
        }
        OneOfHashed | NotOneOfHashed => {
            let (text, _) = user_value.as_str();
            let hashed = sha256(&text, salt, context_salt);
            let Some(list) = condition.string_vec_val.as_ref() else {
                return ConditionResult::CompValInvalid(None);
            };
            let matched = list.iter().any(|item| item.trim() == hashed);
            ConditionResult::Success(matched == (condition.comparator == OneOfHashed))
        }
        StartsWithHashed | EndsWithHashed => {
            let (text, _) = user_value.as_str();
            let Some(cmp) = condition.string_val.as_ref() else {
                return ConditionResult::CompValInvalid(None);
            };
            let Some((len_part, expected_hash)) = cmp.split_once('_') else {
                return ConditionResult::CompValInvalid(Some(
                    "comparison value has an unexpected format".to_owned(),
                ));
            };
            let Ok(length) = len_part.parse::<usize>() else {
                return ConditionResult::CompValInvalid(Some(
                    "comparison value has an unexpected format".to_owned(),
                ));
            };
            let chars: Vec<char> = text.chars().collect();
            if chars.len() < length {
                return ConditionResult::Success(false);
            }
            let slice: String = if condition.comparator == StartsWithHashed {
                chars[..length].iter().collect()
            } else {
                chars[chars.len() - length..].iter().collect()
            };
            let hashed = sha256(&slice, salt, context_salt);
            ConditionResult::Success(hashed == expected_hash)
        }
        BeforeDateTime | AfterDateTime => unreachable!("filtered out by is_unsupported above"),
    }
}

fn value_from_setting_value(setting_value: &SettingValue, setting_type: &SettingType) -> Value {
    match setting_type {
        SettingType::Bool => Value::Bool(setting_value.bool_val.unwrap_or_default()),
        SettingType::String => {
            Value::String(setting_value.string_val.clone().unwrap_or_default())
        }
        SettingType::Int => Value::Int(setting_value.int_val.unwrap_or_default()),
        SettingType::Double => Value::Float(setting_value.float_val.unwrap_or_default()),
    }
}

fn value_of(
    setting_value: Option<&SettingValue>,
    setting_type: &SettingType,
    default: Option<&Value>,
) -> Value {
    match setting_value {
        Some(sv) => value_from_setting_value(sv, setting_type),
        None => default
            .map(|v| match v {
                Value::Bool(b) => Value::Bool(*b),
                Value::Int(i) => Value::Int(*i),
                Value::Float(f) => Value::Float(*f),
                Value::String(s) => Value::String(s.clone()),
            })
            .unwrap_or_else(|| match setting_type {
                SettingType::Bool => Value::Bool(false),
                SettingType::String => Value::String(String::default()),
                SettingType::Int => Value::Int(0),
                SettingType::Double => Value::Float(0.0),
            }),
    }
}
