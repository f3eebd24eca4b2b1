//! Heuristic answer scoring.
//!
//! A toy assessment derived only from the answer text: points for length,
//! capped, plus a bonus per keyword group found. It has no state and does no
//! I/O; nothing in the session flow depends on it.

use serde::{Deserialize, Serialize};

const CHARS_PER_POINT: usize = 200;
const MAX_LENGTH_POINTS: usize = 6;
const SHORT_ANSWER_CHARS: usize = 400;
const MAX_SCORE: f64 = 10.0;

struct Bonus {
    needles: &'static [&'static str],
    strength: &'static str,
    weakness: &'static str,
    recommendation: &'static str,
}

const BONUSES: &[Bonus] = &[
    Bonus {
        needles: &["example"],
        strength: "Backs claims with a concrete example",
        weakness: "No concrete example",
        recommendation: "Illustrate the main point with a real example",
    },
    Bonus {
        needles: &["trade-off", "tradeoff"],
        strength: "Discusses trade-offs",
        weakness: "Trade-offs are not discussed",
        recommendation: "Name at least one alternative and what it costs",
    },
    Bonus {
        needles: &["complexity"],
        strength: "Considers complexity",
        weakness: "Complexity is not analysed",
        recommendation: "State the time or space complexity of the approach",
    },
    Bonus {
        needles: &["test"],
        strength: "Mentions testing",
        weakness: "Testing is not mentioned",
        recommendation: "Explain how the solution would be tested",
    },
];

/// Result of scoring an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Score from 0 to 10.
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Score a free-text answer.
pub fn score(answer: &str) -> Assessment {
    let text = answer.trim();
    let lowered = text.to_lowercase();

    let length_points = (text.chars().count() / CHARS_PER_POINT).min(MAX_LENGTH_POINTS);
    let mut total = length_points as f64;

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut recommendations = Vec::new();

    if text.chars().count() < SHORT_ANSWER_CHARS {
        weaknesses.push("Answer is short and lacks depth".to_owned());
        recommendations.push("Expand on the reasoning behind each step".to_owned());
    }

    for bonus in BONUSES {
        if bonus.needles.iter().any(|needle| lowered.contains(needle)) {
            total += 1.0;
            strengths.push(bonus.strength.to_owned());
        } else {
            weaknesses.push(bonus.weakness.to_owned());
            recommendations.push(bonus.recommendation.to_owned());
        }
    }

    Assessment {
        score: total.round().min(MAX_SCORE) as u8,
        strengths,
        weaknesses,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_score_empty_answer_as_zero() {
        let result = score("   ");
        assert_eq!(result.score, 0);
        assert!(result.strengths.is_empty());
        assert_eq!(result.weaknesses.len(), BONUSES.len() + 1);
        assert_eq!(result.recommendations.len(), BONUSES.len() + 1);
    }

    #[test]
    fn test_should_add_keyword_bonuses_case_insensitively() {
        let result = score("For EXAMPLE, the Trade-Off is memory.");
        assert_eq!(result.score, 2);
        assert_eq!(
            result.strengths,
            vec!["Backs claims with a concrete example", "Discusses trade-offs"]
        );
    }

    #[test]
    fn test_should_cap_length_component() {
        let long = "word ".repeat(1000);
        let result = score(&long);
        assert_eq!(result.score, 6);
        assert!(!result.weaknesses.iter().any(|w| w.contains("short")));
    }

    #[test]
    fn test_should_cap_total_at_ten() {
        let answer = format!(
            "{} example tradeoff complexity tests",
            "detail ".repeat(400)
        );
        assert_eq!(score(&answer).score, 10);
    }

    #[test]
    fn test_should_be_stateless() {
        let text = "An example with a test.";
        assert_eq!(score(text), score(text));
    }
}
