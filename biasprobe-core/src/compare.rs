//! Demographic grouping and statistical comparison of extracted features.
//!
//! Groups `ComparisonRecord`s along declared bias dimensions (including
//! intersectional combinations), then runs a two-sample test or an
//! omnibus test per feature depending on how many groups survive the
//! minimum-sample filter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cache::ResponseSource;
use crate::catalog::{Query, UserProfile};
use crate::features::{FEATURE_NAMES, FeatureVector};
use crate::stats;

/// One analysis row: a profile/query pair joined to its extracted
/// features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub profile: UserProfile,
    pub query: Query,
    pub source: ResponseSource,
    pub features: FeatureVector,
}

/// A single demographic axis derived from profile attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingDimension {
    Gender,
    Seniority,
    Cultural,
    Department,
    Age,
    Ethnicity,
}

impl GroupingDimension {
    pub fn name(&self) -> &'static str {
        match self {
            GroupingDimension::Gender => "gender",
            GroupingDimension::Seniority => "seniority",
            GroupingDimension::Cultural => "cultural",
            GroupingDimension::Department => "department",
            GroupingDimension::Age => "age",
            GroupingDimension::Ethnicity => "ethnicity",
        }
    }

    /// Derive the group key for a profile, or `None` when the profile
    /// carries no usable signal on this axis (it is then excluded from
    /// comparisons along the axis, not erroneously bucketed).
    pub fn key(&self, profile: &UserProfile) -> Option<String> {
        match self {
            GroupingDimension::Gender => gender_key(profile),
            GroupingDimension::Seniority => Some(seniority_key(profile)),
            GroupingDimension::Cultural => cultural_key(profile),
            GroupingDimension::Department => Some(profile.department.to_lowercase()),
            GroupingDimension::Age => Some(career_stage_key(profile)),
            GroupingDimension::Ethnicity => ethnicity_key(profile),
        }
    }
}

fn gender_key(profile: &UserProfile) -> Option<String> {
    match profile.pronouns.as_str() {
        "she/her" => Some("female".to_string()),
        "he/him" => Some("male".to_string()),
        "they/them" => Some("nonbinary".to_string()),
        _ => None,
    }
}

fn seniority_key(profile: &UserProfile) -> String {
    let title = profile.title.to_lowercase();
    if title.contains("intern") {
        "intern".to_string()
    } else if title.contains("junior") {
        "junior".to_string()
    } else if title.contains("vp") || title.contains("director") || title.contains("chief") {
        "executive".to_string()
    } else if title.contains("manager") {
        "management".to_string()
    } else if title.contains("senior") || title.contains("principal") || title.contains("staff") {
        "senior".to_string()
    } else {
        "mid".to_string()
    }
}

fn cultural_key(profile: &UserProfile) -> Option<String> {
    const REGIONS: &[(&str, &str)] = &[
        ("Nigeria", "africa"),
        ("Lagos", "africa"),
        ("India", "south_asia"),
        ("Mumbai", "south_asia"),
        ("USA", "north_america"),
        ("New York", "north_america"),
        ("Russia", "eastern_europe"),
        ("Moscow", "eastern_europe"),
        ("London", "western_europe"),
        ("Paris", "western_europe"),
        ("Dublin", "western_europe"),
        ("Tel Aviv", "middle_east"),
        ("Dubai", "middle_east"),
        ("Singapore", "east_asia"),
        ("Seoul", "east_asia"),
        ("Mexico", "latin_america"),
    ];
    REGIONS
        .iter()
        .find(|(marker, _)| profile.location.contains(marker))
        .map(|(_, region)| region.to_string())
}

fn career_stage_key(profile: &UserProfile) -> String {
    match profile.years_at_company {
        0..=1 => "early".to_string(),
        2..=4 => "establishing".to_string(),
        5..=7 => "established".to_string(),
        _ => "veteran".to_string(),
    }
}

/// Crude surname-pattern heuristic mirroring the probe's synthetic
/// catalog. Unknown surnames are excluded rather than misclassified.
fn ethnicity_key(profile: &UserProfile) -> Option<String> {
    const SURNAMES: &[(&str, &str)] = &[
        ("Chen", "east_asian"),
        ("Kim", "east_asian"),
        ("Sharma", "south_asian"),
        ("Adeyemi", "african"),
        ("Volkov", "eastern_european"),
        ("Al-Rashid", "middle_eastern"),
        ("Rodriguez", "hispanic"),
        ("Dubois", "western_european"),
        ("Smith", "anglo"),
        ("Williams", "anglo"),
        ("Anderson", "anglo"),
        ("Miller", "anglo"),
        ("Green", "anglo"),
        ("Watson", "anglo"),
        ("Johnson", "anglo"),
        ("Lee", "east_asian"),
    ];
    SURNAMES
        .iter()
        .find(|(surname, _)| profile.name.ends_with(surname))
        .map(|(_, group)| group.to_string())
}

/// A grouping over one or more dimensions. Multi-dimension groupings form
/// intersectional groups with composite keys (e.g. `female+senior`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grouping {
    dimensions: Vec<GroupingDimension>,
}

impl Grouping {
    pub fn single(dimension: GroupingDimension) -> Self {
        Self {
            dimensions: vec![dimension],
        }
    }

    pub fn intersection(dimensions: Vec<GroupingDimension>) -> Self {
        Self { dimensions }
    }

    /// Name of the grouping, dimensions joined with `+`.
    pub fn name(&self) -> String {
        self.dimensions
            .iter()
            .map(|d| d.name())
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Composite group key for a profile; `None` when any constituent
    /// dimension yields no signal.
    pub fn key(&self, profile: &UserProfile) -> Option<String> {
        let mut parts = Vec::with_capacity(self.dimensions.len());
        for dimension in &self.dimensions {
            parts.push(dimension.key(profile)?);
        }
        Some(parts.join("+"))
    }
}

/// The built-in groupings: every single axis plus the intersections most
/// likely to hide compounded skews.
pub fn default_groupings() -> Vec<Grouping> {
    vec![
        Grouping::single(GroupingDimension::Gender),
        Grouping::single(GroupingDimension::Seniority),
        Grouping::single(GroupingDimension::Cultural),
        Grouping::single(GroupingDimension::Department),
        Grouping::single(GroupingDimension::Age),
        Grouping::single(GroupingDimension::Ethnicity),
        Grouping::intersection(vec![GroupingDimension::Gender, GroupingDimension::Seniority]),
        Grouping::intersection(vec![GroupingDimension::Gender, GroupingDimension::Cultural]),
    ]
}

/// Outcome of one (grouping, feature) comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticalResult {
    pub dimension: String,
    pub feature: String,
    pub test_name: String,
    pub groups: Vec<String>,
    pub group_sizes: Vec<usize>,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    pub significant: bool,
    /// Set when a significant omnibus test warrants pairwise follow-up.
    pub needs_pairwise: bool,
    /// Present when the comparison was skipped instead of tested.
    pub skip_reason: Option<String>,
}

/// Runs significance tests over grouped feature values.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    significance_threshold: f64,
}

impl ComparisonEngine {
    pub fn new(significance_threshold: f64) -> Self {
        Self {
            significance_threshold,
        }
    }

    /// Collect feature values per group, dropping groups with fewer than
    /// two observations (a single response cannot support a variance
    /// estimate).
    fn group_values(
        records: &[ComparisonRecord],
        grouping: &Grouping,
        feature: &str,
    ) -> BTreeMap<String, Vec<f64>> {
        let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in records {
            let Some(key) = grouping.key(&record.profile) else {
                continue;
            };
            let Some(value) = record.features.get(feature) else {
                continue;
            };
            groups.entry(key).or_default().push(value);
        }
        groups.retain(|_, values| values.len() >= 2);
        groups
    }

    /// Compare one feature across the groups induced by `grouping`.
    ///
    /// Two surviving groups get Welch's t-test with Cohen's d; more get a
    /// one-way ANOVA with eta squared and, when significant, a pairwise
    /// follow-up flag. Fewer than two surviving groups produce a skipped
    /// result, not an error.
    pub fn compare(
        &self,
        records: &[ComparisonRecord],
        grouping: &Grouping,
        feature: &str,
    ) -> StatisticalResult {
        let groups = Self::group_values(records, grouping, feature);
        let names: Vec<String> = groups.keys().cloned().collect();
        let sizes: Vec<usize> = groups.values().map(Vec::len).collect();

        if groups.len() < 2 {
            return StatisticalResult {
                dimension: grouping.name(),
                feature: feature.to_string(),
                test_name: "none".to_string(),
                groups: names,
                group_sizes: sizes,
                statistic: None,
                p_value: None,
                effect_size: None,
                significant: false,
                needs_pairwise: false,
                skip_reason: Some("fewer than two groups with at least two observations".to_string()),
            };
        }

        let values: Vec<&[f64]> = groups.values().map(Vec::as_slice).collect();

        if groups.len() == 2 {
            let test = stats::welch_t_test(values[0], values[1]);
            let effect = stats::cohens_d(values[0], values[1]);
            let (statistic, p_value) = match test {
                Some(t) => (Some(t.statistic), Some(t.p_value)),
                None => (None, None),
            };
            let significant = p_value.is_some_and(|p| p < self.significance_threshold);
            StatisticalResult {
                dimension: grouping.name(),
                feature: feature.to_string(),
                test_name: "welch_t".to_string(),
                groups: names,
                group_sizes: sizes,
                statistic,
                p_value,
                effect_size: Some(effect),
                significant,
                needs_pairwise: false,
                skip_reason: None,
            }
        } else {
            let test = stats::one_way_anova(&values);
            let effect = stats::eta_squared(&values);
            let (statistic, p_value) = match test {
                Some(t) => (Some(t.statistic), Some(t.p_value)),
                None => (None, None),
            };
            let significant = p_value.is_some_and(|p| p < self.significance_threshold);
            StatisticalResult {
                dimension: grouping.name(),
                feature: feature.to_string(),
                test_name: "anova".to_string(),
                groups: names,
                group_sizes: sizes,
                statistic,
                p_value,
                effect_size: Some(effect),
                significant,
                needs_pairwise: significant,
                skip_reason: None,
            }
        }
    }

    /// Run every (grouping, feature) comparison. Results are ordered by
    /// dimension name, then feature name, so repeat runs over the same
    /// records produce identical output.
    pub fn compare_all(
        &self,
        records: &[ComparisonRecord],
        groupings: &[Grouping],
    ) -> Vec<StatisticalResult> {
        let mut sorted_groupings: Vec<&Grouping> = groupings.iter().collect();
        sorted_groupings.sort_by_key(|g| g.name());
        let mut features: Vec<&str> = FEATURE_NAMES.to_vec();
        features.sort_unstable();

        let mut results = Vec::with_capacity(sorted_groupings.len() * features.len());
        for grouping in sorted_groupings {
            for feature in &features {
                results.push(self.compare(records, grouping, feature));
            }
        }
        results
    }

    /// Pairwise follow-up comparisons for every pair of groups along a
    /// grouping, one Welch test per pair for the given feature.
    pub fn pairwise(
        &self,
        records: &[ComparisonRecord],
        grouping: &Grouping,
        feature: &str,
    ) -> Vec<StatisticalResult> {
        let groups = Self::group_values(records, grouping, feature);
        let names: Vec<&String> = groups.keys().collect();
        let mut results = Vec::new();

        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                let (a_name, b_name) = (names[i], names[j]);
                let (a, b) = (&groups[a_name], &groups[b_name]);
                let test = stats::welch_t_test(a, b);
                let (statistic, p_value) = match test {
                    Some(t) => (Some(t.statistic), Some(t.p_value)),
                    None => (None, None),
                };
                let significant = p_value.is_some_and(|p| p < self.significance_threshold);
                results.push(StatisticalResult {
                    dimension: grouping.name(),
                    feature: feature.to_string(),
                    test_name: "welch_t".to_string(),
                    groups: vec![a_name.clone(), b_name.clone()],
                    group_sizes: vec![a.len(), b.len()],
                    statistic,
                    p_value,
                    effect_size: Some(stats::cohens_d(a, b)),
                    significant,
                    needs_pairwise: false,
                    skip_reason: None,
                });
            }
        }
        results
    }
}
