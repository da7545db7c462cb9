//! Aggregate statistics over reports.
//!
//! Serves the admin dashboard numbers: submissions per week, per
//! department, per user, and the overall totals.

use serde::Serialize;
use worklog_common::AppResult;
use worklog_db::repositories::{ReportRepository, UserRepository, WeeklyCount};

/// Per-department totals with the unset department bucketed as
/// "Unknown".
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentStats {
    pub department: String,
    pub total: i64,
    pub submitted: i64,
}

/// Per-user totals joined with the user roster, including members who
/// have never filed a report.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub user_id: String,
    pub name: String,
    pub department: String,
    pub total: i64,
    pub submitted: i64,
}

/// Overall totals and submission rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_reports: i64,
    pub submitted_or_later: i64,
    /// `submitted_or_later / total_reports` as a percentage, or `0.0`
    /// when there are no reports at all.
    pub completion_rate: f64,
}

impl OverallStats {
    #[must_use]
    pub fn from_counts(total_reports: i64, submitted_or_later: i64) -> Self {
        let completion_rate = if total_reports > 0 {
            submitted_or_later as f64 / total_reports as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_reports,
            submitted_or_later,
            completion_rate,
        }
    }
}

/// The full dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub overall: OverallStats,
    pub weekly: Vec<WeeklyCount>,
    pub departments: Vec<DepartmentStats>,
    pub team: Vec<UserStats>,
}

/// Statistics service for business logic.
#[derive(Clone)]
pub struct StatsService {
    report_repo: ReportRepository,
    user_repo: UserRepository,
}

impl StatsService {
    /// Create a new statistics service.
    #[must_use]
    pub const fn new(report_repo: ReportRepository, user_repo: UserRepository) -> Self {
        Self {
            report_repo,
            user_repo,
        }
    }

    /// Week-by-week report counts, oldest first.
    pub async fn weekly(&self) -> AppResult<Vec<WeeklyCount>> {
        self.report_repo.weekly_counts().await
    }

    /// Report counts per department, busiest first.
    pub async fn departments(&self) -> AppResult<Vec<DepartmentStats>> {
        let counts = self.report_repo.department_counts().await?;
        Ok(counts
            .into_iter()
            .map(|c| DepartmentStats {
                department: c.department.unwrap_or_else(|| "Unknown".to_string()),
                total: c.total,
                submitted: c.submitted,
            })
            .collect())
    }

    /// Overall totals plus the submission rate.
    pub async fn overall(&self) -> AppResult<OverallStats> {
        let total = self.report_repo.count_all().await?;
        let submitted = self.report_repo.count_submitted_or_later().await?;
        Ok(OverallStats::from_counts(total as i64, submitted as i64))
    }

    /// Per-user totals, optionally scoped to one department, sorted by
    /// count descending. Users without any report appear with a zero.
    pub async fn team(&self, department: Option<&str>) -> AppResult<Vec<UserStats>> {
        let users = match department {
            Some(dept) => self.user_repo.find_by_department(dept).await?,
            None => self.user_repo.find_all().await?,
        };

        let counts = if department.is_some() {
            let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
            if ids.is_empty() {
                Vec::new()
            } else {
                self.report_repo.per_user_counts(Some(&ids)).await?
            }
        } else {
            self.report_repo.per_user_counts(None).await?
        };

        let mut team: Vec<UserStats> = users
            .into_iter()
            .map(|u| {
                let count = counts.iter().find(|c| c.user_id == u.id);
                UserStats {
                    user_id: u.id,
                    name: u.name,
                    department: u.department,
                    total: count.map_or(0, |c| c.total),
                    submitted: count.map_or(0, |c| c.submitted),
                }
            })
            .collect();
        team.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

        Ok(team)
    }

    /// Everything the dashboard needs in one call.
    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        Ok(Dashboard {
            overall: self.overall().await?,
            weekly: self.weekly().await?,
            departments: self.departments().await?,
            team: self.team(None).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_stats_rate() {
        let stats = OverallStats::from_counts(10, 4);
        assert!((stats.completion_rate - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_overall_stats_empty_store_has_zero_rate() {
        let stats = OverallStats::from_counts(0, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert!(stats.completion_rate.is_finite());
    }

    #[test]
    fn test_overall_stats_all_submitted() {
        let stats = OverallStats::from_counts(3, 3);
        assert!((stats.completion_rate - 100.0).abs() < 1e-9);
    }
}
