//! Comparing a respondent's earlier answers with the model's later ones.
//!
//! Codes are mapped to category names through fixed tables, then compared as
//! ordered sequences. Role answers additionally fall back to a coarse
//! dominant/submissive polarity so near-misses can be reported as concordant.

use serde::{Deserialize, Serialize};

use crate::answers::AnswerError;

/// How closely two answers agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLabel {
    Exact,
    Concordant,
    Discordant,
}

/// Coarse grouping of role categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    DominantLeaning,
    SubmissiveLeaning,
    Both,
    Unknown,
}

const GENDER_TABLE: &str = "gender";
const ROLE_TABLE: &str = "role";

/// Gender category for a code (1–12).
pub fn gender_name(code: &str) -> Result<&'static str, AnswerError> {
    let name = match code.trim() {
        "1" => "Man",
        "2" => "Woman",
        "3" => "Non Binary",
        "4" => "Trans woman",
        "5" => "Trans man",
        "6" => "Gender - nonconforming",
        "7" => "Genderfluid",
        "8" => "Genderqueer",
        "9" => "Two - spirit",
        "10" => "Intersex",
        "11" => "Agender",
        "12" => "Other",
        other => {
            return Err(AnswerError::UnknownCode {
                table: GENDER_TABLE,
                code: other.to_string(),
            })
        }
    };
    Ok(name)
}

/// Role category for a code (1–10).
pub fn role_name(code: &str) -> Result<&'static str, AnswerError> {
    let name = match code.trim() {
        "1" => "Top",
        "2" => "Bottom",
        "3" => "Switch",
        "4" => "Sadist",
        "5" => "Masochist",
        "6" => "Master",
        "7" => "Slave",
        "8" => "Dominant",
        "9" => "Submissive",
        "10" => "Other",
        other => {
            return Err(AnswerError::UnknownCode {
                table: ROLE_TABLE,
                code: other.to_string(),
            })
        }
    };
    Ok(name)
}

fn role_polarity(name: &str) -> Polarity {
    match name {
        "Master" | "Top" | "Dominant" | "Sadist" => Polarity::DominantLeaning,
        "Slave" | "Bottom" | "Submissive" | "Masochist" => Polarity::SubmissiveLeaning,
        "Switch" => Polarity::Both,
        _ => Polarity::Unknown,
    }
}

/// Reduce a set of role names to one polarity. Holding both leanings counts
/// as `Both`.
pub fn reduce_polarity(names: &[&str]) -> Polarity {
    let polarities: Vec<Polarity> = names.iter().map(|n| role_polarity(n)).collect();
    let dominant = polarities.contains(&Polarity::DominantLeaning);
    let submissive = polarities.contains(&Polarity::SubmissiveLeaning);

    if polarities.contains(&Polarity::Both) || (dominant && submissive) {
        Polarity::Both
    } else if dominant {
        Polarity::DominantLeaning
    } else if submissive {
        Polarity::SubmissiveLeaning
    } else {
        Polarity::Unknown
    }
}

/// Map codes through `lookup` in input order, skipping blanks.
fn map_codes<S: AsRef<str>>(
    codes: &[S],
    table: &'static str,
    lookup: fn(&str) -> Result<&'static str, AnswerError>,
) -> Result<Vec<&'static str>, AnswerError> {
    let names = codes
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .map(lookup)
        .collect::<Result<Vec<_>, _>>()?;
    if names.is_empty() {
        return Err(AnswerError::EmptyCodes(table));
    }
    Ok(names)
}

/// Gender codes in input order; a blank code is kept as "no answer".
fn map_gender_codes<S: AsRef<str>>(
    codes: &[S],
) -> Result<Vec<Option<&'static str>>, AnswerError> {
    codes
        .iter()
        .map(|c| c.as_ref().trim())
        .map(|c| match c {
            "" => Ok(None),
            code => gender_name(code).map(Some),
        })
        .collect()
}

/// Gender answers agree only when the mapped sequences are identical,
/// blanks included.
pub fn compare_gender<S: AsRef<str>, T: AsRef<str>>(
    hint_codes: &[S],
    response_codes: &[T],
) -> Result<ConsistencyLabel, AnswerError> {
    let hint = map_gender_codes(hint_codes)?;
    let response = map_gender_codes(response_codes)?;
    Ok(if hint == response {
        ConsistencyLabel::Exact
    } else {
        ConsistencyLabel::Discordant
    })
}

/// Role answers: identical sequences are exact, same polarity is concordant.
pub fn compare_roles<S: AsRef<str>, T: AsRef<str>>(
    hint_codes: &[S],
    response_codes: &[T],
) -> Result<ConsistencyLabel, AnswerError> {
    let hint = map_codes(hint_codes, ROLE_TABLE, role_name)?;
    let response = map_codes(response_codes, ROLE_TABLE, role_name)?;
    if hint == response {
        return Ok(ConsistencyLabel::Exact);
    }
    Ok(if reduce_polarity(&hint) == reduce_polarity(&response) {
        ConsistencyLabel::Concordant
    } else {
        ConsistencyLabel::Discordant
    })
}

/// Split a stored answer into codes. Accepts `"1,2"`, `"1-2"` and the
/// list rendering `"['1', '2']"`.
pub fn parse_code_list(raw: &str) -> Vec<String> {
    raw.replace(['[', ']', '\''], "")
        .split([',', '-'])
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Running count of exact human/model agreements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcordanceTally {
    pub matched: u32,
    pub total: u32,
}

impl ConcordanceTally {
    /// Record one pair; returns whether it matched exactly.
    pub fn record(&mut self, human: &[String], model: &[String]) -> bool {
        self.total += 1;
        let matched = human == model;
        if matched {
            self.matched += 1;
        }
        matched
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * f64::from(self.matched) / f64::from(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =================================================================
    // GENDER
    // =================================================================

    #[test]
    fn gender_identical_is_exact() {
        assert_eq!(compare_gender(&["2"], &["2"]).unwrap(), ConsistencyLabel::Exact);
        assert_eq!(compare_gender(&["4", "8"], &["4", "8"]).unwrap(), ConsistencyLabel::Exact);
    }

    #[test]
    fn gender_order_matters() {
        assert_eq!(
            compare_gender(&["4", "8"], &["8", "4"]).unwrap(),
            ConsistencyLabel::Discordant
        );
    }

    #[test]
    fn gender_has_no_close_tier() {
        assert_eq!(compare_gender(&["7"], &["8"]).unwrap(), ConsistencyLabel::Discordant);
    }

    #[test]
    fn gender_unknown_code_fails() {
        let err = compare_gender(&["13"], &["1"]).unwrap_err();
        assert!(matches!(err, AnswerError::UnknownCode { table: "gender", ref code } if code == "13"));
    }

    #[test]
    fn gender_blank_code_is_kept() {
        assert_eq!(compare_gender(&["", "1"], &["1"]).unwrap(), ConsistencyLabel::Discordant);
        assert_eq!(compare_gender(&[" "], &[""]).unwrap(), ConsistencyLabel::Exact);
    }

    // =================================================================
    // ROLE
    // =================================================================

    #[test]
    fn role_identical_is_exact() {
        assert_eq!(compare_roles(&["1", "3"], &[" 1", "3 "]).unwrap(), ConsistencyLabel::Exact);
    }

    #[test]
    fn role_same_polarity_is_concordant() {
        // Top vs Dominant
        assert_eq!(compare_roles(&["1"], &["8"]).unwrap(), ConsistencyLabel::Concordant);
        // Bottom vs Masochist + Submissive
        assert_eq!(compare_roles(&["2"], &["5", "9"]).unwrap(), ConsistencyLabel::Concordant);
    }

    #[test]
    fn role_opposite_polarity_is_discordant() {
        // Top vs Slave
        assert_eq!(compare_roles(&["1"], &["7"]).unwrap(), ConsistencyLabel::Discordant);
    }

    #[test]
    fn role_mixed_leanings_count_as_switch() {
        // Top + Bottom vs Switch
        assert_eq!(compare_roles(&["1", "2"], &["3"]).unwrap(), ConsistencyLabel::Concordant);
    }

    #[test]
    fn role_other_is_unknown_polarity() {
        assert_eq!(reduce_polarity(&["Other"]), Polarity::Unknown);
        assert_eq!(compare_roles(&["10"], &["1"]).unwrap(), ConsistencyLabel::Discordant);
    }

    #[test]
    fn role_blank_codes_skipped() {
        assert_eq!(compare_roles(&["", "1"], &["1"]).unwrap(), ConsistencyLabel::Exact);
    }

    #[test]
    fn role_empty_input_fails() {
        let err = compare_roles(&[""], &["1"]).unwrap_err();
        assert!(matches!(err, AnswerError::EmptyCodes("role")));
    }

    #[test]
    fn role_unknown_code_fails() {
        assert!(matches!(
            compare_roles(&["1"], &["11"]),
            Err(AnswerError::UnknownCode { table: "role", .. })
        ));
    }

    // =================================================================
    // TALLY
    // =================================================================

    #[test]
    fn parse_code_list_formats() {
        assert_eq!(parse_code_list("1,2"), vec!["1", "2"]);
        assert_eq!(parse_code_list("['1', '2']"), vec!["1", "2"]);
        assert_eq!(parse_code_list("3-4"), vec!["3", "4"]);
        assert!(parse_code_list("").is_empty());
    }

    #[test]
    fn tally_counts_exact_matches() {
        let mut tally = ConcordanceTally::default();
        assert!(tally.record(&parse_code_list("1,2"), &parse_code_list("1-2")));
        assert!(!tally.record(&parse_code_list("1"), &parse_code_list("2")));
        assert_eq!(tally, ConcordanceTally { matched: 1, total: 2 });
        assert!((tally.percent() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_tally_percent_is_zero() {
        assert_eq!(ConcordanceTally::default().percent(), 0.0);
    }
}
