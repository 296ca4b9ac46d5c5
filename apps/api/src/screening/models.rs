use serde::{de, Deserialize, Deserializer, Serialize};

/// Structured profile extracted from a CV document.
///
/// Only `basic_info.full_name` and `skills` are guaranteed; everything else may be
/// missing from the source document and is kept as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvData {
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub social_info: Option<SocialInfo>,
    #[serde(default)]
    pub education: Option<Vec<Education>>,
    pub skills: Vec<String>,
    #[serde(default)]
    pub projects: Option<Vec<Project>>,
    #[serde(default)]
    pub experience: Option<Vec<Experience>>,
    #[serde(default)]
    pub certifications: Option<Vec<Certification>>,
    #[serde(default)]
    pub achievements: Option<Vec<Achievement>>,
    #[serde(default)]
    pub problem_solving: Option<ProblemSolving>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub personal_summary: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub top_skills: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialInfo {
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub degree: String,
    /// Institution attended.
    pub university: String,
    pub start_year: String,
    #[serde(default)]
    pub graduation_year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub links: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub title: String,
    #[serde(default)]
    pub issuing_organization: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
    #[serde(default)]
    pub credential_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSolving {
    /// Models sometimes write counts as `150.0`; integral floats are accepted.
    #[serde(default, deserialize_with = "integral_count")]
    pub number_of_problems_solved: Option<u64>,
    #[serde(default)]
    pub online_judge_profiles: Option<Vec<String>>,
    #[serde(default)]
    pub notable_achievements: Option<Vec<String>>,
}

/// Model-generated comparison of a CV against one job description.
/// Computed per request, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAnalysis {
    /// 0–100
    pub overall_match: f64,
    /// 0–100
    pub skills_match: f64,
    pub year_of_experience: f64,
    pub num_of_skills: f64,
    pub strengths: Vec<String>,
    pub lackings_area: Vec<String>,
}

fn integral_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(count) = number.as_u64() {
        return Ok(Some(count));
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        _ => Err(de::Error::custom(format!(
            "expected a non-negative integer, found {number}"
        ))),
    }
}
