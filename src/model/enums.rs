use serde_repr::Deserialize_repr;
use std::fmt::{Display, Formatter};

/// Describes the location of your feature flag and setting data within the ConfigCat CDN.
#[derive(Clone, PartialEq, Debug)]
pub enum DataGovernance {
    /// Select this if your feature flags are published to all global CDN nodes.
    Global,
    /// Select this if your feature flags are published to CDN nodes only in the EU.
    Eu,
}

#[derive(Debug, Deserialize_repr, PartialEq, Clone)]
#[repr(u8)]
pub enum RedirectMode {
    No,
    Should,
    Force,
}

#[derive(Debug, Clone, Deserialize_repr)]
#[repr(u8)]
pub enum SettingType {
    /// The on/off type (feature flag).
    Bool = 0,
    /// The text setting type.
    String = 1,
    /// The whole number setting type.
    Int = 2,
    /// The decimal number setting type.
    Double = 3,
}

impl Display for SettingType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SettingType::Bool => "Bool",
            SettingType::String => "String",
            SettingType::Int => "Int",
            SettingType::Double => "Double",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Deserialize_repr)]
#[repr(u8)]
pub enum SegmentComparator {
    /// Checks whether the conditions of the specified segment are evaluated to true.
    IsIn = 0,
    /// Checks whether the conditions of the specified segment are evaluated to false.
    IsNotIn = 1,
}

#[derive(Debug, Clone, Deserialize_repr)]
#[repr(u8)]
pub enum DependentFlagComparator {
    /// Checks whether the evaluated value of the dependency flag is equal to the comparison value.
    Eq = 0,
    /// Checks whether the evaluated value of the dependency flag is not equal to the comparison value.
    NotEq = 1,
}

#[derive(Debug, Clone, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub enum UserComparator {
    /// Checks whether the comparison attribute is equal to any of the comparison values.
    OneOf = 0,
    /// Checks whether the comparison attribute is not equal to any of the comparison values.
    NotOneOf = 1,
    /// Checks whether the comparison attribute contains any comparison values as a substring.
    Contains = 2,
    /// Checks whether the comparison attribute does not contain any comparison values as a substring.
    NotContains = 3,
    /// Checks whether the comparison attribute interpreted as a semantic version is equal to any of the comparison values.
    OneOfSemver = 4,
    /// Checks whether the comparison attribute interpreted as a semantic version is not equal to any of the comparison values.
    NotOneOfSemver = 5,
    /// Checks whether the comparison attribute interpreted as a semantic version is less than the comparison value.
    LessSemver = 6,
    /// Checks whether the comparison attribute interpreted as a semantic version is less than or equal to the comparison value.
    LessEqSemver = 7,
    /// Checks whether the comparison attribute interpreted as a semantic version is greater than the comparison value.
    GreaterSemver = 8,
    /// Checks whether the comparison attribute interpreted as a semantic version is greater than or equal to the comparison value.
    GreaterEqSemver = 9,
    /// Checks whether the comparison attribute interpreted as a decimal number is equal to the comparison value.
    EqNum = 10,
    /// Checks whether the comparison attribute interpreted as a decimal number is not equal to the comparison value.
    NotEqNum = 11,
    /// Checks whether the comparison attribute interpreted as a decimal number is less than the comparison value.
    LessNum = 12,
    /// Checks whether the comparison attribute interpreted as a decimal number is less than or equal to the comparison value.
    LessEqNum = 13,
    /// Checks whether the comparison attribute interpreted as a decimal number is greater than the comparison value.
    GreaterNum = 14,
    /// Checks whether the comparison attribute interpreted as a decimal number is greater than or equal to the comparison value.
    GreaterEqNum = 15,
    /// Checks whether the comparison attribute is equal to any of the comparison values (where the comparison is performed using the salted SHA256 hashes of the values).
    OneOfHashed = 16,
    /// Checks whether the comparison attribute is not equal to any of the comparison values (where the comparison is performed using the salted SHA256 hashes of the values).
    NotOneOfHashed = 17,
    /// Reserved: not implemented. Declared so configs using it still deserialize; evaluating
    /// a condition of this kind logs a validation error and never matches.
    BeforeDateTime = 18,
    /// Reserved: not implemented. See [`UserComparator::BeforeDateTime`].
    AfterDateTime = 19,
    /// Checks whether the comparison attribute starts with the comparison value (where the comparison is performed using the salted SHA256 hash of the value).
    StartsWithHashed = 22,
    /// Checks whether the comparison attribute ends with the comparison value (where the comparison is performed using the salted SHA256 hash of the value).
    EndsWithHashed = 23,
}

impl UserComparator {
    /// Whether the comparison value is a salted SHA256 hash rather than plain text,
    /// so trace logging must not print the raw comparison value(s).
    pub(crate) fn is_sensitive(&self) -> bool {
        matches!(
            self,
            UserComparator::OneOfHashed
                | UserComparator::NotOneOfHashed
                | UserComparator::StartsWithHashed
                | UserComparator::EndsWithHashed
        )
    }

    /// Whether the comparison value is a Unix-epoch-seconds timestamp.
    pub(crate) fn is_date(&self) -> bool {
        matches!(
            self,
            UserComparator::BeforeDateTime | UserComparator::AfterDateTime
        )
    }

    /// Whether this comparator is declared but not evaluated (spec leaves it unspecified).
    pub(crate) fn is_unsupported(&self) -> bool {
        self.is_date()
    }

    fn text(&self) -> &'static str {
        match self {
            UserComparator::OneOf => "IS ONE OF",
            UserComparator::NotOneOf => "IS NOT ONE OF",
            UserComparator::Contains => "CONTAINS ANY OF",
            UserComparator::NotContains => "NOT CONTAINS ANY OF",
            UserComparator::OneOfSemver => "IS ONE OF",
            UserComparator::NotOneOfSemver => "IS NOT ONE OF",
            UserComparator::LessSemver => "<",
            UserComparator::LessEqSemver => "<=",
            UserComparator::GreaterSemver => ">",
            UserComparator::GreaterEqSemver => ">=",
            UserComparator::EqNum => "=",
            UserComparator::NotEqNum => "!=",
            UserComparator::LessNum => "<",
            UserComparator::LessEqNum => "<=",
            UserComparator::GreaterNum => ">",
            UserComparator::GreaterEqNum => ">=",
            UserComparator::OneOfHashed => "IS ONE OF",
            UserComparator::NotOneOfHashed => "IS NOT ONE OF",
            UserComparator::BeforeDateTime => "BEFORE (unsupported)",
            UserComparator::AfterDateTime => "AFTER (unsupported)",
            UserComparator::StartsWithHashed => "STARTS WITH",
            UserComparator::EndsWithHashed => "ENDS WITH",
        }
    }
}

impl Display for UserComparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}
