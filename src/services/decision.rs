//! 自动提交判定
//!
//! 纯函数，不做任何远程调用。

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::assignments::entities::{AssignmentStatus, AssignmentView};

/// 已准备好、有截止日期、且距离截止不超过 `lead_time`
///
/// 已过截止的条目仍然符合条件（剩余时间为负）。
pub fn is_eligible(view: &AssignmentView, now: DateTime<Utc>, lead_time: TimeDelta) -> bool {
    if view.status != AssignmentStatus::ReadyToSubmit || view.is_unresolved() {
        return false;
    }
    match view.due_at() {
        Some(due) => due - now <= lead_time,
        None => false,
    }
}

pub fn select_eligible<'a>(
    views: &'a [AssignmentView],
    now: DateTime<Utc>,
    lead_time: TimeDelta,
) -> Vec<&'a AssignmentView> {
    views
        .iter()
        .filter(|view| is_eligible(view, now, lead_time))
        .collect()
}

/// 需要提醒的条目：还没有准备提交文件，且即将（尚未）截止
pub fn select_reminders<'a>(
    views: &'a [AssignmentView],
    now: DateTime<Utc>,
    lead_time: TimeDelta,
) -> Vec<&'a AssignmentView> {
    views
        .iter()
        .filter(|view| view.status == AssignmentStatus::NotSubmitted && !view.is_unresolved())
        .filter(|view| {
            view.due_at()
                .is_some_and(|due| due > now && due - now <= lead_time)
        })
        .collect()
}
