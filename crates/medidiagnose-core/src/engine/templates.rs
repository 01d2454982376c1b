//! Built-in condition table.
//!
//! Order matters: ties in score are resolved in favour of the earlier entry.

use crate::models::{ConditionTemplate, UrgencyLevel};

/// The default condition templates.
pub fn default_templates() -> Vec<ConditionTemplate> {
    vec![
        ConditionTemplate::new(
            "Common Cold",
            &["cough", "sore throat", "runny nose", "congestion", "sneezing"],
            &["Rest", "Hydration", "Over-the-counter cold medication"],
            UrgencyLevel::Low,
        ),
        ConditionTemplate::new(
            "Influenza",
            &["fever", "body aches", "fatigue", "headache", "chills"],
            &["Rest", "Antiviral medications", "Pain relievers"],
            UrgencyLevel::Medium,
        ),
        ConditionTemplate::new(
            "Allergic Reaction",
            &["rash", "itching", "hives", "swelling", "allergic"],
            &["Antihistamines", "Avoid allergens", "Topical creams"],
            UrgencyLevel::Medium,
        ),
        ConditionTemplate::new(
            "Dermatitis",
            &["skin", "rash", "itchy", "irritation", "redness", "dry skin"],
            &["Moisturizers", "Topical corticosteroids", "Avoid irritants"],
            UrgencyLevel::Low,
        ),
        ConditionTemplate::new(
            "Migraine",
            &["headache", "pain", "nausea", "light sensitivity", "sound sensitivity"],
            &["Pain relievers", "Rest in dark room", "Hydration"],
            UrgencyLevel::Medium,
        ),
        ConditionTemplate::new(
            "Gastroenteritis",
            &["nausea", "vomiting", "diarrhea", "stomach pain", "abdominal"],
            &["Hydration", "Rest", "Bland diet"],
            UrgencyLevel::Medium,
        ),
    ]
}
