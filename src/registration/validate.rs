use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::RegistrationError;
use crate::models::Project;

const MAX_NAME_LEN: usize = 100;

static GITHUB_LOGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,37}[A-Za-z0-9])?$").expect("valid regex")
});

#[derive(Debug, Clone, Deserialize)]
pub struct MemberInput {
    #[serde(default, alias = "fullName")]
    pub full_name: String,
    #[serde(default, alias = "githubUsername")]
    pub github_username: String,
}

/// A trimmed, checked member.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMember {
    pub full_name: String,
    pub github_username: String,
    /// Lowercased username, used for every comparison.
    pub login: String,
}

pub fn members(project: &Project, input: &[MemberInput]) -> Result<Vec<ValidMember>, RegistrationError> {
    if input.is_empty() {
        return Err(RegistrationError::InvalidInput(
            "At least one student is required".to_string(),
        ));
    }

    let count = input.len() as i64;
    if count < i64::from(project.min_students) || count > i64::from(project.max_students) {
        return Err(RegistrationError::InvalidInput(format!(
            "A group must have between {} and {} students, got {count}",
            project.min_students, project.max_students
        )));
    }

    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(input.len());

    for (index, entry) in input.iter().enumerate() {
        let position = index + 1;
        let full_name = entry.full_name.trim();
        let github_username = entry.github_username.trim();

        if full_name.is_empty() {
            return Err(RegistrationError::InvalidInput(format!(
                "Student {position}: full name is required"
            )));
        }
        if full_name.chars().count() > MAX_NAME_LEN {
            return Err(RegistrationError::InvalidInput(format!(
                "Student {position}: full name is longer than {MAX_NAME_LEN} characters"
            )));
        }
        if github_username.is_empty() {
            return Err(RegistrationError::InvalidInput(format!(
                "Student {position}: GitHub username is required"
            )));
        }
        if !is_github_login(github_username) {
            return Err(RegistrationError::InvalidInput(format!(
                "Student {position}: '{github_username}' is not a valid GitHub username"
            )));
        }

        let login = github_username.to_lowercase();
        if !seen.insert(login.clone()) {
            return Err(RegistrationError::InvalidInput(format!(
                "'{github_username}' appears more than once in this group"
            )));
        }

        valid.push(ValidMember {
            full_name: full_name.to_string(),
            github_username: github_username.to_string(),
            login,
        });
    }

    Ok(valid)
}

fn is_github_login(s: &str) -> bool {
    GITHUB_LOGIN.is_match(s) && !s.contains("--")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) fn project(min: i32, max: i32) -> Project {
        Project {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            name: "Compilers".to_string(),
            github_org: "cs-course".to_string(),
            min_students: min,
            max_students: max,
            group_convention: "Team-XX".to_string(),
            secret_key: "s3cret-key".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input(name: &str, user: &str) -> MemberInput {
        MemberInput {
            full_name: name.to_string(),
            github_username: user.to_string(),
        }
    }

    #[test]
    fn accepts_and_trims_valid_members() {
        let out = members(
            &project(2, 4),
            &[input("  Ada Lovelace ", " Ada-L "), input("Alan Turing", "aturing")],
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].full_name, "Ada Lovelace");
        assert_eq!(out[0].github_username, "Ada-L");
        assert_eq!(out[0].login, "ada-l");
    }

    #[test]
    fn rejects_empty_list() {
        let err = members(&project(1, 4), &[]).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidInput(_)));
    }

    #[test]
    fn rejects_blank_fields() {
        let p = project(1, 4);
        assert!(matches!(
            members(&p, &[input("   ", "ada")]),
            Err(RegistrationError::InvalidInput(_))
        ));
        assert!(matches!(
            members(&p, &[input("Ada", "")]),
            Err(RegistrationError::InvalidInput(_))
        ));
    }

    #[test]
    fn enforces_group_size_bounds() {
        let p = project(2, 3);
        let one = [input("A", "a1")];
        let four = [input("A", "a1"), input("B", "b1"), input("C", "c1"), input("D", "d1")];
        assert!(matches!(members(&p, &one), Err(RegistrationError::InvalidInput(_))));
        assert!(matches!(members(&p, &four), Err(RegistrationError::InvalidInput(_))));
    }

    #[test]
    fn rejects_repeated_username_ignoring_case() {
        let err = members(&project(1, 4), &[input("A", "octocat"), input("B", "OctoCat")])
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidInput(msg) if msg.contains("OctoCat")));
    }

    #[test]
    fn github_login_syntax() {
        assert!(is_github_login("octocat"));
        assert!(is_github_login("a-b-c"));
        assert!(is_github_login("x"));
        assert!(!is_github_login("-lead"));
        assert!(!is_github_login("trail-"));
        assert!(!is_github_login("dou--ble"));
        assert!(!is_github_login("has space"));
        assert!(!is_github_login(&"a".repeat(40)));
    }
}
