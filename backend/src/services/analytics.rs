// src/services/analytics.rs

//! Read-only summaries over recorded quiz results.
//!
//! Every function is pure: it never mutates its input and returns a
//! well-defined zero/empty value for empty input.

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};
use serde::{Serialize, Serializer};

use crate::models::result::QuizResult;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Counts results per whole percentage bucket (`round(score / total * 100)`).
/// A zero total is treated as one question.
pub fn score_distribution(results: &[QuizResult]) -> BTreeMap<u32, usize> {
    let mut buckets = BTreeMap::new();
    for result in results {
        let percentage = (result.ratio() * 100.0).round() as u32;
        *buckets.entry(percentage).or_insert(0) += 1;
    }
    buckets
}

/// `sum(score) / sum(total) * 100` to two decimals, or `None` when there is no data.
pub fn average_score(results: &[QuizResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }

    let score: u64 = results.iter().map(|r| r.score as u64).sum();
    let total: u64 = results.iter().map(|r| r.total_questions.max(1) as u64).sum();

    Some(round2(score as f64 / total as f64 * 100.0))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimeStatistics {
    pub average: f64,
    pub longest: u64,
    pub shortest: u64,
}

pub fn time_statistics(results: &[QuizResult]) -> TimeStatistics {
    if results.is_empty() {
        return TimeStatistics::default();
    }

    let times = results.iter().map(|r| r.elapsed_time);
    let total: u64 = times.clone().sum();

    TimeStatistics {
        average: round2(total as f64 / results.len() as f64),
        longest: times.clone().max().unwrap_or(0),
        shortest: times.min().unwrap_or(0),
    }
}

/// Display-ready leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformerRow {
    pub name: String,
    pub score: String,
    pub time: String,
}

/// Best `n` attempts by raw score, highest first; ties keep their input order.
///
/// Ranking is by raw score, not percentage, so 10/20 outranks 9/10.
pub fn top_performers(results: &[QuizResult], n: usize) -> Vec<PerformerRow> {
    let mut ranked: Vec<&QuizResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    ranked
        .into_iter()
        .take(n)
        .map(|r| PerformerRow {
            name: r.user.name.clone(),
            score: format!("{}/{}", r.score, r.total_questions),
            time: format!("{}s", r.elapsed_time),
        })
        .collect()
}

/// Calendar day an attempt completed on; `Unknown` for records without a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActivityDay {
    Date(NaiveDate),
    Unknown,
}

impl Serialize for ActivityDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ActivityDay::Date(date) => serializer.collect_str(date),
            ActivityDay::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// Attempts per calendar day, with days taken in the given offset.
pub fn activity_by_date(results: &[QuizResult], offset: &FixedOffset) -> BTreeMap<ActivityDay, usize> {
    let mut days = BTreeMap::new();
    for result in results {
        let day = result
            .completed_at
            .map(|at| ActivityDay::Date(at.with_timezone(offset).date_naive()))
            .unwrap_or(ActivityDay::Unknown);
        *days.entry(day).or_insert(0) += 1;
    }
    days
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassFail {
    pub pass: usize,
    pub fail: usize,
}

/// Splits attempts on `score / total >= threshold`.
pub fn pass_fail_counts(results: &[QuizResult], threshold: f64) -> PassFail {
    let pass = results.iter().filter(|r| r.ratio() >= threshold).count();
    PassFail {
        pass,
        fail: results.len() - pass,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyticsOptions {
    pub top_performers: usize,
    pub pass_threshold: f64,
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionBucket {
    pub score: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityRow {
    pub date: ActivityDay,
    pub users: usize,
}

/// Dashboard bundle for one quiz.
#[derive(Debug, Clone, Serialize)]
pub struct QuizAnalytics {
    pub attempts: usize,
    pub score_distribution: Vec<DistributionBucket>,
    /// `None` when the quiz has no results.
    pub average_score: Option<f64>,
    pub time: TimeStatistics,
    pub top_performers: Vec<PerformerRow>,
    pub activity: Vec<ActivityRow>,
    pub pass_fail: PassFail,
}

impl QuizAnalytics {
    pub fn compute(results: &[QuizResult], options: &AnalyticsOptions) -> Self {
        QuizAnalytics {
            attempts: results.len(),
            score_distribution: score_distribution(results)
                .into_iter()
                .map(|(pct, count)| DistributionBucket {
                    score: format!("{}%", pct),
                    count,
                })
                .collect(),
            average_score: average_score(results),
            time: time_statistics(results),
            top_performers: top_performers(results, options.top_performers),
            activity: activity_by_date(results, &options.offset)
                .into_iter()
                .map(|(date, users)| ActivityRow { date, users })
                .collect(),
            pass_fail: pass_fail_counts(results, options.pass_threshold),
        }
    }
}

/// Summary of one user's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserOverview {
    pub total_quizzes: usize,
    /// Mean raw score per attempt.
    pub average_score: Option<f64>,
    pub average_time: Option<f64>,
}

pub fn user_overview(results: &[QuizResult]) -> UserOverview {
    if results.is_empty() {
        return UserOverview {
            total_quizzes: 0,
            average_score: None,
            average_time: None,
        };
    }

    let n = results.len() as f64;
    let score: u64 = results.iter().map(|r| r.score as u64).sum();
    let time: u64 = results.iter().map(|r| r.elapsed_time).sum();

    UserOverview {
        total_quizzes: results.len(),
        average_score: Some(round2(score as f64 / n)),
        average_time: Some(round2(time as f64 / n)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySort {
    /// Storage order.
    #[default]
    All,
    /// Most recent first; undated records last.
    Date,
    /// Highest raw score first.
    Score,
}

/// Orders a user's history for display. Returns a new vector.
pub fn sort_history(results: &[QuizResult], sort: HistorySort) -> Vec<QuizResult> {
    let mut sorted = results.to_vec();
    match sort {
        HistorySort::All => {}
        HistorySort::Date => sorted.sort_by(|a, b| b.completed_at.cmp(&a.completed_at)),
        HistorySort::Score => sorted.sort_by(|a, b| b.score.cmp(&a.score)),
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::{QuizSnapshot, UserSnapshot};
    use chrono::{DateTime, Utc};

    fn result(name: &str, score: u32, total: u32, elapsed: u64, at: Option<&str>) -> QuizResult {
        QuizResult {
            user: UserSnapshot {
                name: name.to_string(),
                email: format!("{}@example.com", name),
            },
            quiz: QuizSnapshot {
                id: "q1".to_string(),
                name: "Quiz".to_string(),
            },
            score,
            total_questions: total,
            elapsed_time: elapsed,
            completed_at: at.map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .unwrap()
                    .with_timezone(&Utc)
            }),
            theory_answers: BTreeMap::new(),
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn distribution_buckets_by_percentage() {
        let results = vec![result("a", 8, 10, 0, None), result("b", 9, 10, 0, None)];
        let dist = score_distribution(&results);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist.get(&80), Some(&1));
        assert_eq!(dist.get(&90), Some(&1));
    }

    #[test]
    fn distribution_guards_zero_totals() {
        let dist = score_distribution(&[result("a", 0, 0, 0, None)]);
        assert_eq!(dist.get(&0), Some(&1));
    }

    #[test]
    fn average_of_empty_is_no_data() {
        assert_eq!(average_score(&[]), None);
    }

    #[test]
    fn average_is_pooled_and_rounded() {
        let results = vec![result("a", 1, 3, 0, None), result("b", 1, 3, 0, None)];
        assert_eq!(average_score(&results), Some(33.33));
    }

    #[test]
    fn time_statistics_of_empty_are_zero() {
        assert_eq!(time_statistics(&[]), TimeStatistics::default());
    }

    #[test]
    fn time_statistics_cover_extremes() {
        let results = vec![
            result("a", 0, 1, 30, None),
            result("b", 0, 1, 10, None),
            result("c", 0, 1, 21, None),
        ];
        let stats = time_statistics(&results);
        assert_eq!(stats.average, 20.33);
        assert_eq!(stats.longest, 30);
        assert_eq!(stats.shortest, 10);
    }

    #[test]
    fn top_performers_rank_by_raw_score() {
        let results = vec![
            result("nine-of-ten", 9, 10, 5, None),
            result("ten-of-twenty", 10, 20, 7, None),
            result("one", 1, 1, 1, None),
        ];
        let rows = top_performers(&results, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "ten-of-twenty");
        assert_eq!(rows[0].score, "10/20");
        assert_eq!(rows[0].time, "7s");
        assert_eq!(rows[1].name, "nine-of-ten");
    }

    #[test]
    fn top_performers_do_not_reorder_input() {
        let results = vec![result("low", 1, 5, 0, None), result("high", 5, 5, 0, None)];
        let _ = top_performers(&results, 5);
        assert_eq!(results[0].user.name, "low");
    }

    #[test]
    fn activity_groups_by_day_in_offset() {
        let results = vec![
            result("a", 1, 1, 0, Some("2024-05-01T23:30:00Z")),
            result("b", 1, 1, 0, Some("2024-05-01T08:00:00Z")),
            result("c", 1, 1, 0, None),
        ];

        let in_utc = activity_by_date(&results, &utc());
        let may_first = ActivityDay::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(in_utc.get(&may_first), Some(&2));
        assert_eq!(in_utc.get(&ActivityDay::Unknown), Some(&1));

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let shifted = activity_by_date(&results, &plus_two);
        let may_second = ActivityDay::Date(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(shifted.get(&may_first), Some(&1));
        assert_eq!(shifted.get(&may_second), Some(&1));
    }

    #[test]
    fn pass_fail_threshold_is_inclusive() {
        let results = vec![
            result("a", 3, 10, 0, None),
            result("b", 6, 10, 0, None),
            result("c", 5, 10, 0, None),
        ];
        assert_eq!(pass_fail_counts(&results, 0.5), PassFail { pass: 2, fail: 1 });
        assert_eq!(pass_fail_counts(&[], 0.5), PassFail::default());
    }

    #[test]
    fn quiz_analytics_bundle_on_empty_input() {
        let options = AnalyticsOptions {
            top_performers: 5,
            pass_threshold: 0.5,
            offset: utc(),
        };
        let analytics = QuizAnalytics::compute(&[], &options);
        assert_eq!(analytics.attempts, 0);
        assert!(analytics.score_distribution.is_empty());
        assert_eq!(analytics.average_score, None);
        assert!(analytics.top_performers.is_empty());
        assert_eq!(analytics.pass_fail, PassFail::default());
    }

    #[test]
    fn activity_day_serialises_as_string() {
        let day = ActivityDay::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(serde_json::to_value(day).unwrap(), "2024-05-01");
        assert_eq!(serde_json::to_value(ActivityDay::Unknown).unwrap(), "unknown");
    }

    #[test]
    fn overview_and_history_sorting() {
        let results = vec![
            result("a", 2, 4, 10, Some("2024-05-01T10:00:00Z")),
            result("a", 4, 4, 20, Some("2024-05-03T10:00:00Z")),
            result("a", 3, 4, 30, None),
        ];

        let overview = user_overview(&results);
        assert_eq!(overview.total_quizzes, 3);
        assert_eq!(overview.average_score, Some(3.0));
        assert_eq!(overview.average_time, Some(20.0));
        assert_eq!(user_overview(&[]).average_score, None);

        let by_date = sort_history(&results, HistorySort::Date);
        assert_eq!(by_date[0].score, 4);
        assert_eq!(by_date[2].completed_at, None);

        let by_score = sort_history(&results, HistorySort::Score);
        let scores: Vec<u32> = by_score.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![4, 3, 2]);
    }
}
