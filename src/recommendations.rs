// 💬 Recommendation Lookup - Health advice as data
// Static (category × health profile) → text table, plus multi-profile aggregation

use anyhow::{Context as AnyhowContext, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::category::AqiCategory;
use crate::error::ParseError;

// ============================================================================
// HEALTH PROFILE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthProfile {
    General,
    Asthma,
    HeartDisease,
    Elderly,
    Children,
    Pregnancy,
}

impl HealthProfile {
    pub const ALL: [HealthProfile; 6] = [
        HealthProfile::General,
        HealthProfile::Asthma,
        HealthProfile::HeartDisease,
        HealthProfile::Elderly,
        HealthProfile::Children,
        HealthProfile::Pregnancy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HealthProfile::General => "General",
            HealthProfile::Asthma => "Asthma",
            HealthProfile::HeartDisease => "Heart Disease",
            HealthProfile::Elderly => "Elderly",
            HealthProfile::Children => "Children",
            HealthProfile::Pregnancy => "Pregnancy",
        }
    }
}

impl fmt::Display for HealthProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HealthProfile {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "general" => Ok(HealthProfile::General),
            "asthma" => Ok(HealthProfile::Asthma),
            "heartdisease" | "heart" => Ok(HealthProfile::HeartDisease),
            "elderly" => Ok(HealthProfile::Elderly),
            "children" | "child" => Ok(HealthProfile::Children),
            "pregnancy" | "pregnant" => Ok(HealthProfile::Pregnancy),
            _ => Err(ParseError::UnknownProfile(s.to_string())),
        }
    }
}

// ============================================================================
// BUILTIN TEXTS
// ============================================================================

mod texts {
    use super::HealthProfile::*;
    use crate::category::AqiCategory::*;
    use crate::category::AqiCategory;
    use super::HealthProfile;

    pub(super) const BUILTIN: [(AqiCategory, HealthProfile, &str); 36] = [
        // Good
        (Good, General, "Health: Air quality is satisfactory, and air pollution poses little or no risk.\nActions: Enjoy outdoor activities without restrictions.\nTips: Continue monitoring air quality for any unexpected changes."),
        (Good, Asthma, "Conditions are favourable. Keep your reliever inhaler with you as usual and enjoy outdoor exercise."),
        (Good, HeartDisease, "No extra precautions needed. Regular outdoor walks and light exercise are encouraged."),
        (Good, Elderly, "A good day to spend time outdoors. Stay hydrated and keep up normal activity."),
        (Good, Children, "Outdoor play and sports are safe. Let children enjoy the fresh air."),
        (Good, Pregnancy, "Air quality poses no known risk. Outdoor walks are a healthy choice today."),
        // Satisfactory
        (Satisfactory, General, "Health: Air quality is acceptable; however, some pollutants may affect sensitive individuals.\nActions: Sensitive groups (e.g., those with respiratory issues) should reduce prolonged outdoor exertion.\nTips: Use air purifiers indoors and keep windows closed during peak pollution hours."),
        (Satisfactory, Asthma, "Watch for early symptoms such as coughing or chest tightness. Keep your inhaler close and shorten intense outdoor workouts."),
        (Satisfactory, HeartDisease, "Most activity is fine, but avoid long strenuous efforts near busy roads."),
        (Satisfactory, Elderly, "Short outdoor outings are fine. Rest if you notice breathlessness."),
        (Satisfactory, Children, "Normal play is fine. Children with asthma should take breaks during long games."),
        (Satisfactory, Pregnancy, "Outdoor activity is fine; prefer parks over roadside routes."),
        // Moderate
        (Moderate, General, "Health: Members of sensitive groups may experience health effects; the general public is less likely to be affected.\nActions: Sensitive groups should avoid prolonged outdoor activities. Others should limit exertion.\nTips: Wear masks (e.g., N95) outdoors and ensure good indoor ventilation."),
        (Moderate, Asthma, "Limit outdoor exertion and take your preventer medication as prescribed. Carry your reliever inhaler at all times."),
        (Moderate, HeartDisease, "Avoid strenuous outdoor activity. Watch for palpitations, chest pain or unusual fatigue."),
        (Moderate, Elderly, "Keep outdoor time short and avoid heavy exertion. Wear an N95 mask in traffic."),
        (Moderate, Children, "Reduce long or intense outdoor play. Move sports practice indoors where possible."),
        (Moderate, Pregnancy, "Limit time outdoors, especially near traffic. Wear a well-fitting mask when outside."),
        // Poor
        (Poor, General, "Health: Everyone may begin to experience health effects; sensitive groups face more serious effects.\nActions: Avoid outdoor activities, especially strenuous ones. Stay indoors with air purifiers.\nTips: Seal windows and doors, and use HEPA filters to reduce indoor pollutants."),
        (Poor, Asthma, "Stay indoors and follow your asthma action plan. Contact your doctor if you need your reliever more often than usual."),
        (Poor, HeartDisease, "Avoid all outdoor exertion. Keep medications at hand and seek care for chest pain or shortness of breath."),
        (Poor, Elderly, "Stay indoors with a purifier running. Postpone errands that can wait."),
        (Poor, Children, "Keep children indoors. Cancel outdoor sports and school activities."),
        (Poor, Pregnancy, "Stay indoors in a filtered room. Avoid traffic-heavy areas entirely."),
        // Very Poor
        (VeryPoor, General, "Health: Health alert: everyone may experience serious health effects.\nActions: Stay indoors and avoid all outdoor activities. Use air purifiers continuously.\nTips: Monitor health symptoms and seek medical advice if respiratory issues arise."),
        (VeryPoor, Asthma, "Remain indoors with HEPA filtration. Have your emergency medication ready and a plan to reach care quickly."),
        (VeryPoor, HeartDisease, "Remain indoors and rest. Seek immediate medical help for chest pain, dizziness or irregular heartbeat."),
        (VeryPoor, Elderly, "Do not go outdoors. Ask family or neighbours to check on you and run a purifier continuously."),
        (VeryPoor, Children, "Keep children indoors in a filtered room. Watch for coughing, wheezing or breathing difficulty."),
        (VeryPoor, Pregnancy, "Stay indoors with continuous air filtration. Consult your doctor about any breathing discomfort."),
        // Severe
        (Severe, General, "Health: Emergency conditions; the entire population is likely to be affected.\nActions: Remain indoors with all windows and doors sealed. Avoid any physical activity.\nTips: Use high-quality air purifiers and consult a doctor for any breathing difficulties."),
        (Severe, Asthma, "Emergency conditions. Stay sealed indoors, keep emergency medication within reach and seek care at the first sign of an attack."),
        (Severe, HeartDisease, "Emergency conditions. Avoid all exertion and call emergency services for any cardiac symptoms."),
        (Severe, Elderly, "Emergency conditions. Stay sealed indoors and arrange for someone to check on you regularly."),
        (Severe, Children, "Emergency conditions. Keep children sealed indoors; schools and outdoor activities should be suspended."),
        (Severe, Pregnancy, "Emergency conditions. Stay sealed indoors with filtration and contact your doctor about any symptoms, however mild."),
    ];
}

use texts::BUILTIN;

static BUILTIN_TABLE: Lazy<RecommendationTable> = Lazy::new(RecommendationTable::builtin);

// ============================================================================
// TABLE
// ============================================================================

/// One row of a recommendation table file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub category: AqiCategory,
    pub profile: HealthProfile,
    pub text: String,
}

/// Immutable (category, profile) → text mapping.
#[derive(Debug, Clone)]
pub struct RecommendationTable {
    entries: HashMap<(AqiCategory, HealthProfile), String>,
}

impl RecommendationTable {
    /// The table shipped with the crate, covering every pair.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(category, profile, text)| ((*category, *profile), text.to_string()))
            .collect();
        RecommendationTable { entries }
    }

    pub fn from_entries(entries: Vec<RecommendationEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| ((e.category, e.profile), e.text))
            .collect();
        RecommendationTable { entries }
    }

    /// Load a custom table from a JSON array of entries.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read recommendations file: {:?}", path.as_ref()))?;

        let entries: Vec<RecommendationEntry> = serde_json::from_str(&content)
            .context("Failed to parse recommendations JSON")?;

        log::info!("Loaded {} recommendation entries from {:?}", entries.len(), path.as_ref());
        Ok(RecommendationTable::from_entries(entries))
    }

    /// Look up the text for one pair. A missing entry yields the fallback
    /// sentinel rather than an error.
    pub fn recommend(&self, category: AqiCategory, profile: HealthProfile) -> String {
        match self.entries.get(&(category, profile)) {
            Some(text) => text.clone(),
            None => fallback_text(category, profile),
        }
    }

    /// General block first, then one block per selected profile in the order
    /// given. `General` in the selection is not repeated, and a profile
    /// selected twice appears once.
    pub fn recommend_for_profiles(
        &self,
        category: AqiCategory,
        profiles: &[HealthProfile],
    ) -> Vec<RecommendationBlock> {
        let mut seen = vec![HealthProfile::General];
        let mut blocks = vec![self.block(category, HealthProfile::General)];

        for profile in profiles {
            if seen.contains(profile) {
                continue;
            }
            seen.push(*profile);
            blocks.push(self.block(category, *profile));
        }

        blocks
    }

    fn block(&self, category: AqiCategory, profile: HealthProfile) -> RecommendationBlock {
        RecommendationBlock {
            profile,
            text: self.recommend(category, profile),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RecommendationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Sentinel returned on a lookup miss.
pub fn fallback_text(category: AqiCategory, profile: HealthProfile) -> String {
    format!(
        "No specific recommendations for {} at {} air quality.",
        profile.label(),
        category.label()
    )
}

// ============================================================================
// AGGREGATED OUTPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBlock {
    pub profile: HealthProfile,
    pub text: String,
}

/// Join blocks into one text, each under a "<Profile>:" heading.
pub fn render_blocks(blocks: &[RecommendationBlock]) -> String {
    blocks
        .iter()
        .map(|b| format!("{}:\n{}", b.profile.label(), b.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ============================================================================
// BUILTIN SHORTCUTS
// ============================================================================

/// Look up against the builtin table.
pub fn recommend(category: AqiCategory, profile: HealthProfile) -> String {
    BUILTIN_TABLE.recommend(category, profile)
}

/// Multi-profile aggregation against the builtin table.
pub fn recommend_for_profiles(
    category: AqiCategory,
    profiles: &[HealthProfile],
) -> Vec<RecommendationBlock> {
    BUILTIN_TABLE.recommend_for_profiles(category, profiles)
}

pub fn builtin_table() -> &'static RecommendationTable {
    &BUILTIN_TABLE
}

// ============================================================================
// TESTS
// ============================================================================
