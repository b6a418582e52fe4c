use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

impl ContactInfo {
    /// Non-blank profile links with their display labels, in display order.
    pub fn links(&self) -> Vec<(&'static str, &str)> {
        [
            ("LinkedIn", &self.linkedin),
            ("GitHub", &self.github),
            ("Portfolio", &self.portfolio),
            ("Instagram", &self.instagram),
            ("Other URL", &self.other),
        ]
        .into_iter()
        .filter_map(|(label, v)| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (label, s))
        })
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub qualification: String,
    pub institute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub responsibilities: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_achieved: Option<String>,
}

/// Everything a user has told us about themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// `start -- end`, tolerating either side missing.
pub(crate) fn date_range(start: Option<&str>, end: Option<&str>) -> String {
    match (start.filter(|s| !s.is_empty()), end.filter(|s| !s.is_empty())) {
        (Some(s), Some(e)) => format!("{s} -- {e}"),
        (Some(s), None) => format!("{s} -- Present"),
        (None, Some(e)) => e.to_string(),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_profile_with_missing_sections() {
        let profile: UserProfile = serde_json::from_str(
            r#"{
                "contactInfo": {"name": "Ada Lovelace", "email": "ada@example.com", "linkedin": "linkedin.com/in/ada", "github": ""},
                "experience": [{"title": "Analyst", "company": "Engines Ltd", "startDate": "1842", "responsibilities": "Wrote notes"}],
                "skills": ["Mathematics", "Rust"]
            }"#,
        )
        .unwrap();
        assert_eq!(profile.contact_info.name, "Ada Lovelace");
        assert_eq!(profile.experience[0].start_date.as_deref(), Some("1842"));
        assert!(profile.education.is_empty());
        assert!(profile.certifications.is_empty());
        assert_eq!(profile.contact_info.links(), vec![("LinkedIn", "linkedin.com/in/ada")]);
    }

    #[test]
    fn date_ranges() {
        assert_eq!(date_range(Some("2020"), Some("2022")), "2020 -- 2022");
        assert_eq!(date_range(Some("2020"), None), "2020 -- Present");
        assert_eq!(date_range(None, Some("")), "");
    }
}
