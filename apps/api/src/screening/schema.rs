//! Schema validation for untrusted model output.
//!
//! The model only ever sees a prose description of the shapes it must produce,
//! so its output is checked field by field before it is deserialized into
//! `CvData` / `MatchAnalysis`. All violations are collected, not just the first.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use validator::ValidateEmail;

use crate::screening::models::{CvData, MatchAnalysis};

/// One rejected field, e.g. `education[1].degree: is required`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Error)]
#[error("{}", describe(.violations))]
pub struct SchemaError {
    pub violations: Vec<FieldViolation>,
}

#[cfg(test)]
impl SchemaError {
    pub fn has_violation_at(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.path, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates an arbitrary JSON value against the CV data shape.
pub fn validate_cv_data(value: &Value) -> Result<CvData, SchemaError> {
    let mut check = Checker::default();
    let Some(root) = check.root(value) else {
        return Err(check.into_error());
    };

    if let Some((path, basic)) = check.object(root, "", "basicInfo", true) {
        check.string(basic, &path, "fullName", true);
        check.email(basic, &path, "email");
        for key in ["personalSummary", "phone", "location"] {
            check.string(basic, &path, key, false);
        }
        check.string_list(basic, &path, "topSkills", false);
    }

    if let Some((path, social)) = check.object(root, "", "socialInfo", false) {
        for key in ["linkedin", "github", "portfolio"] {
            check.string(social, &path, key, false);
        }
    }

    check.object_list(root, "", "education", false, |check, path, item| {
        check.string(item, path, "degree", true);
        check.string(item, path, "university", true);
        check.string(item, path, "startYear", true);
        check.string(item, path, "graduationYear", false);
    });

    check.string_list(root, "", "skills", true);

    check.object_list(root, "", "projects", false, |check, path, item| {
        check.string(item, path, "title", true);
        check.string(item, path, "description", true);
        check.string_list(item, path, "technologies", true);
        check.string(item, path, "duration", false);
        check.string(item, path, "links", false);
    });

    check.object_list(root, "", "experience", false, |check, path, item| {
        check.string(item, path, "company", true);
        for key in ["role", "duration", "responsibilities"] {
            check.string(item, path, key, false);
        }
    });

    check.object_list(root, "", "certifications", false, |check, path, item| {
        check.string(item, path, "title", true);
        for key in [
            "issuingOrganization",
            "issueDate",
            "credentialId",
            "credentialUrl",
        ] {
            check.string(item, path, key, false);
        }
    });

    check.object_list(root, "", "achievements", false, |check, path, item| {
        check.string(item, path, "title", true);
        check.string(item, path, "description", false);
        check.string(item, path, "date", false);
    });

    if let Some((path, solving)) = check.object(root, "", "problemSolving", false) {
        check.count(solving, &path, "numberOfProblemsSolved");
        check.string_list(solving, &path, "onlineJudgeProfiles", false);
        check.string_list(solving, &path, "notableAchievements", false);
    }

    check.finish(value)
}

/// Validates an arbitrary JSON value against the match analysis shape.
/// Every field is required.
pub fn validate_match_analysis(value: &Value) -> Result<MatchAnalysis, SchemaError> {
    let mut check = Checker::default();
    let Some(root) = check.root(value) else {
        return Err(check.into_error());
    };

    for key in ["overallMatch", "skillsMatch", "yearOfExperience", "numOfSkills"] {
        check.number(root, "", key);
    }
    check.string_list(root, "", "strengths", true);
    check.string_list(root, "", "lackingsArea", true);

    check.finish(value)
}

// ────────────────────────────────────────────────────────────────────────────
// Field checker
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Checker {
    violations: Vec<FieldViolation>,
}

impl Checker {
    fn violation(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn mismatch(&mut self, path: &str, expected: &str, found: &Value) {
        self.violation(
            path,
            format!("expected {expected}, found {}", type_name(found)),
        );
    }

    fn root<'v>(&mut self, value: &'v Value) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.mismatch("$", "an object", other);
                None
            }
        }
    }

    /// Looks up `key`. Absent and `null` are both treated as "not provided".
    fn field<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        parent: &str,
        key: &str,
        required: bool,
    ) -> Option<(String, &'v Value)> {
        let path = join_path(parent, key);
        match obj.get(key) {
            None | Some(Value::Null) => {
                if required {
                    self.violation(&path, "is required");
                }
                None
            }
            Some(value) => Some((path, value)),
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str, required: bool) {
        if let Some((path, value)) = self.field(obj, parent, key, required) {
            if !value.is_string() {
                self.mismatch(&path, "a string", value);
            }
        }
    }

    fn email(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some((path, value)) = self.field(obj, parent, key, false) {
            match value.as_str() {
                Some(email) if email.validate_email() => {}
                Some(_) => self.violation(&path, "is not a valid email address"),
                None => self.mismatch(&path, "a string", value),
            }
        }
    }

    fn number(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some((path, value)) = self.field(obj, parent, key, true) {
            if !value.is_number() {
                self.mismatch(&path, "a number", value);
            }
        }
    }

    /// Optional non-negative integer. `150.0` counts as an integer.
    fn count(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some((path, value)) = self.field(obj, parent, key, false) {
            let integral = value.as_u64().is_some()
                || value
                    .as_f64()
                    .is_some_and(|f| f >= 0.0 && f.fract() == 0.0);
            if !integral {
                self.mismatch(&path, "a non-negative integer", value);
            }
        }
    }

    fn string_list(&mut self, obj: &Map<String, Value>, parent: &str, key: &str, required: bool) {
        let Some((path, value)) = self.field(obj, parent, key, required) else {
            return;
        };
        let Some(items) = value.as_array() else {
            self.mismatch(&path, "an array", value);
            return;
        };
        for (i, item) in items.iter().enumerate() {
            if !item.is_string() {
                self.mismatch(&format!("{path}[{i}]"), "a string", item);
            }
        }
    }

    fn object<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        parent: &str,
        key: &str,
        required: bool,
    ) -> Option<(String, &'v Map<String, Value>)> {
        let (path, value) = self.field(obj, parent, key, required)?;
        match value {
            Value::Object(map) => Some((path, map)),
            other => {
                self.mismatch(&path, "an object", other);
                None
            }
        }
    }

    fn object_list(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
        required: bool,
        each: impl Fn(&mut Checker, &str, &Map<String, Value>),
    ) {
        let Some((path, value)) = self.field(obj, parent, key, required) else {
            return;
        };
        let Some(items) = value.as_array() else {
            self.mismatch(&path, "an array", value);
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{i}]");
            match item {
                Value::Object(map) => each(self, &item_path, map),
                other => self.mismatch(&item_path, "an object", other),
            }
        }
    }

    fn into_error(self) -> SchemaError {
        SchemaError {
            violations: self.violations,
        }
    }

    /// Fails with every collected violation, or deserializes the (now shape-checked) value.
    fn finish<T: DeserializeOwned>(self, value: &Value) -> Result<T, SchemaError> {
        if !self.violations.is_empty() {
            return Err(self.into_error());
        }
        serde_json::from_value(value.clone()).map_err(|e| SchemaError {
            violations: vec![FieldViolation {
                path: "$".to_string(),
                message: e.to_string(),
            }],
        })
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_cv_json() -> Value {
        json!({
            "basicInfo": {
                "fullName": "Jane Doe",
                "email": "jane@example.com",
                "personalSummary": "Frontend engineer with a data bent.",
                "phone": "+1 555 0100",
                "location": "Lisbon",
                "topSkills": ["React", "SQL"]
            },
            "socialInfo": {
                "linkedin": "https://linkedin.com/in/janedoe",
                "github": null,
                "portfolio": "https://jane.dev"
            },
            "education": [{
                "degree": "BSc Computer Science",
                "university": "University of Porto",
                "startYear": "2015",
                "graduationYear": "2019"
            }],
            "skills": ["React", "SQL", "TypeScript"],
            "projects": [{
                "title": "Dashboards",
                "description": "Internal analytics dashboards",
                "technologies": ["React", "D3"],
                "duration": "6 months",
                "links": null
            }],
            "experience": [{
                "company": "Acme",
                "role": "Frontend Engineer",
                "duration": "2019-2023",
                "responsibilities": "Built the design system"
            }],
            "certifications": [{
                "title": "AWS Certified Developer",
                "issuingOrganization": "Amazon",
                "issueDate": "2022-05",
                "credentialId": null,
                "credentialUrl": null
            }],
            "achievements": [{
                "title": "Hackathon winner",
                "description": null,
                "date": "2021"
            }],
            "problemSolving": {
                "numberOfProblemsSolved": 420,
                "onlineJudgeProfiles": ["https://leetcode.com/jane"],
                "notableAchievements": []
            }
        })
    }

    fn analysis_json() -> Value {
        json!({
            "overallMatch": 78,
            "skillsMatch": 82.5,
            "yearOfExperience": 4,
            "numOfSkills": 3,
            "strengths": ["React"],
            "lackingsArea": ["Kubernetes"]
        })
    }

    #[test]
    fn test_minimal_cv_is_accepted_with_optional_fields_absent() {
        let cv = validate_cv_data(&json!({
            "basicInfo": {"fullName": "Jane Doe"},
            "skills": ["React", "SQL"]
        }))
        .unwrap();
        assert_eq!(cv.basic_info.full_name, "Jane Doe");
        assert_eq!(cv.skills, vec!["React", "SQL"]);
        assert!(cv.basic_info.email.is_none());
        assert!(cv.social_info.is_none());
        assert!(cv.education.is_none());
        assert!(cv.projects.is_none());
        assert!(cv.experience.is_none());
        assert!(cv.certifications.is_none());
        assert!(cv.achievements.is_none());
        assert!(cv.problem_solving.is_none());
    }

    #[test]
    fn test_full_cv_round_trips_by_value() {
        let cv = validate_cv_data(&full_cv_json()).unwrap();
        assert_eq!(cv.education.as_ref().unwrap()[0].university, "University of Porto");
        assert_eq!(
            cv.problem_solving.as_ref().unwrap().number_of_problems_solved,
            Some(420)
        );

        let reserialized = serde_json::to_value(&cv).unwrap();
        let again = validate_cv_data(&reserialized).unwrap();
        assert_eq!(cv, again);
    }

    #[test]
    fn test_explicit_nulls_are_accepted_for_optional_fields() {
        let cv = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A", "email": null, "topSkills": null},
            "socialInfo": null,
            "education": null,
            "skills": [],
            "problemSolving": null
        }))
        .unwrap();
        assert!(cv.skills.is_empty());
        assert!(cv.basic_info.top_skills.is_none());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let cv = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A", "nickname": "ace"},
            "skills": ["Go"],
            "hobbies": ["chess"]
        }))
        .unwrap();
        assert_eq!(cv.skills, vec!["Go"]);
    }

    #[test]
    fn test_missing_full_name_is_rejected() {
        let err = validate_cv_data(&json!({"basicInfo": {}, "skills": []})).unwrap_err();
        assert!(err.has_violation_at("basicInfo.fullName"));
    }

    #[test]
    fn test_null_full_name_is_rejected() {
        let err =
            validate_cv_data(&json!({"basicInfo": {"fullName": null}, "skills": []})).unwrap_err();
        assert!(err.has_violation_at("basicInfo.fullName"));
    }

    #[test]
    fn test_missing_basic_info_is_rejected() {
        let err = validate_cv_data(&json!({"skills": ["Rust"]})).unwrap_err();
        assert!(err.has_violation_at("basicInfo"));
    }

    #[test]
    fn test_missing_skills_is_rejected() {
        let err = validate_cv_data(&json!({"basicInfo": {"fullName": "A"}})).unwrap_err();
        assert!(err.has_violation_at("skills"));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let err = validate_cv_data(&json!({"basicInfo": {"fullName": 7}})).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.has_violation_at("basicInfo.fullName"));
        assert!(err.has_violation_at("skills"));
        assert!(err.to_string().contains("expected a string, found number"));
    }

    #[test]
    fn test_wrong_skill_element_type_is_rejected() {
        let err = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A"},
            "skills": ["Rust", 3]
        }))
        .unwrap_err();
        assert!(err.has_violation_at("skills[1]"));
    }

    #[test]
    fn test_malformed_nested_array_element_is_rejected() {
        let err = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A"},
            "skills": [],
            "education": [
                {"degree": "BSc", "university": "X", "startYear": "2010"},
                {"university": "Y", "startYear": 2012},
                "MSc"
            ]
        }))
        .unwrap_err();
        assert!(err.has_violation_at("education[1].degree"));
        assert!(err.has_violation_at("education[1].startYear"));
        assert!(err.has_violation_at("education[2]"));
        assert!(!err.has_violation_at("education[0].degree"));
    }

    #[test]
    fn test_project_requires_technologies() {
        let err = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A"},
            "skills": [],
            "projects": [{"title": "T", "description": "D"}]
        }))
        .unwrap_err();
        assert!(err.has_violation_at("projects[0].technologies"));
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let err = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A", "email": "jane at example dot com"},
            "skills": []
        }))
        .unwrap_err();
        assert!(err.has_violation_at("basicInfo.email"));
    }

    #[test]
    fn test_problem_count_must_be_non_negative_integer() {
        let err = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A"},
            "skills": [],
            "problemSolving": {"numberOfProblemsSolved": "lots"}
        }))
        .unwrap_err();
        assert!(err.has_violation_at("problemSolving.numberOfProblemsSolved"));
    }

    #[test]
    fn test_problem_count_accepts_integral_float() {
        let cv = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A"},
            "skills": [],
            "problemSolving": {"numberOfProblemsSolved": 150.0}
        }))
        .unwrap();
        assert_eq!(cv.problem_solving.unwrap().number_of_problems_solved, Some(150));
    }

    #[test]
    fn test_problem_count_rejects_fraction_and_negative() {
        for bad in [json!(12.5), json!(-3)] {
            let err = validate_cv_data(&json!({
                "basicInfo": {"fullName": "A"},
                "skills": [],
                "problemSolving": {"numberOfProblemsSolved": bad}
            }))
            .unwrap_err();
            assert!(err.has_violation_at("problemSolving.numberOfProblemsSolved"));
        }
    }

    #[test]
    fn test_problem_solving_without_count_is_accepted() {
        let cv = validate_cv_data(&json!({
            "basicInfo": {"fullName": "A"},
            "skills": [],
            "problemSolving": {"onlineJudgeProfiles": ["codeforces/a"]}
        }))
        .unwrap();
        assert_eq!(cv.problem_solving.unwrap().number_of_problems_solved, None);
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let err = validate_cv_data(&json!(["Jane Doe"])).unwrap_err();
        assert!(err.has_violation_at("$"));
        let err = validate_match_analysis(&json!("78")).unwrap_err();
        assert!(err.has_violation_at("$"));
    }

    #[test]
    fn test_valid_analysis_is_accepted() {
        let analysis = validate_match_analysis(&analysis_json()).unwrap();
        assert_eq!(analysis.overall_match, 78.0);
        assert_eq!(analysis.skills_match, 82.5);
        assert_eq!(analysis.lackings_area, vec!["Kubernetes"]);
    }

    #[test]
    fn test_analysis_missing_any_field_is_rejected() {
        for key in [
            "overallMatch",
            "skillsMatch",
            "yearOfExperience",
            "numOfSkills",
            "strengths",
            "lackingsArea",
        ] {
            let mut value = analysis_json();
            value.as_object_mut().unwrap().remove(key);
            let err = validate_match_analysis(&value).unwrap_err();
            assert!(err.has_violation_at(key), "expected violation for {key}");
        }
    }

    #[test]
    fn test_analysis_wrong_types_are_rejected() {
        let wrong: [(&str, Value); 6] = [
            ("overallMatch", json!("78")),
            ("skillsMatch", json!(null)),
            ("yearOfExperience", json!([4])),
            ("numOfSkills", json!({"count": 3})),
            ("strengths", json!("React")),
            ("lackingsArea", json!([1, 2])),
        ];
        for (key, bad) in wrong {
            let mut value = analysis_json();
            value[key] = bad;
            assert!(
                validate_match_analysis(&value).is_err(),
                "expected {key} to be rejected"
            );
        }
    }
}
