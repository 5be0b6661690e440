//! Stateless badge rule evaluation, run after each successful validation.
//! Rules live in an open table so new badges never touch the lifecycle
//! manager; the storage layer's set-addition keeps application idempotent
//! even when an event is replayed.

use std::sync::Arc;

use tracing::info;

use crate::{
    dao::{
        contest_store::ContestStore,
        models::{Badge, ScoreEntity, TeamEntity},
    },
    error::ServiceError,
};

/// Inputs a badge rule may inspect.
pub struct BadgeRuleContext<'a> {
    /// Team that just got a score validated.
    pub team: &'a TeamEntity,
    /// The newly validated score.
    pub score: &'a ScoreEntity,
    /// Validated-score count for the team, including this one.
    pub validated_count: u64,
}

type BadgeRule = fn(&BadgeRuleContext<'_>) -> Option<Badge>;

/// Active rule table. Append here to ship a new badge.
const RULES: &[BadgeRule] = &[first_challenge_rule];

fn first_challenge_rule(ctx: &BadgeRuleContext<'_>) -> Option<Badge> {
    (ctx.validated_count == 1).then_some(Badge::FirstChallenge)
}

/// Run every rule against the context and collect the badges to add.
pub fn evaluate(ctx: &BadgeRuleContext<'_>) -> Vec<Badge> {
    RULES.iter().filter_map(|rule| rule(ctx)).collect()
}

/// Evaluate the rule table for a freshly validated score and persist any
/// earned badges. Returns the badges the rules produced.
pub async fn apply_after_validation(
    store: &Arc<dyn ContestStore>,
    team: &TeamEntity,
    score: &ScoreEntity,
    validated_count: u64,
) -> Result<Vec<Badge>, ServiceError> {
    let ctx = BadgeRuleContext {
        team,
        score,
        validated_count,
    };
    let badges = evaluate(&ctx);

    for badge in &badges {
        let added = store.add_badge(team.id, *badge).await?;
        if added {
            info!(team_id = %team.id, badge = badge.as_str(), "badge awarded");
        }
    }

    Ok(badges)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;
    use crate::dao::models::ScoreStatus;

    fn fixture(validated_count: u64) -> (TeamEntity, ScoreEntity, u64) {
        let team = TeamEntity {
            id: Uuid::new_v4(),
            name: "alpha".into(),
            logo: String::new(),
            leader_id: Uuid::new_v4(),
            members: vec![],
            score: 500,
            badges: vec![],
            created_at: SystemTime::now(),
        };
        let score = ScoreEntity {
            id: Uuid::new_v4(),
            team_id: team.id,
            challenge_id: Uuid::new_v4(),
            points_earned: 500,
            submitted_by: Uuid::new_v4(),
            validated_by: Some(Uuid::new_v4()),
            status: ScoreStatus::Validated,
            submission_note: String::new(),
            validation_note: String::new(),
            submitted_at: SystemTime::now(),
            validated_at: Some(SystemTime::now()),
        };
        (team, score, validated_count)
    }

    #[test]
    fn first_validation_awards_first_challenge() {
        let (team, score, count) = fixture(1);
        let badges = evaluate(&BadgeRuleContext {
            team: &team,
            score: &score,
            validated_count: count,
        });
        assert_eq!(badges, vec![Badge::FirstChallenge]);
    }

    #[test]
    fn later_validations_award_nothing() {
        let (team, score, count) = fixture(2);
        let badges = evaluate(&BadgeRuleContext {
            team: &team,
            score: &score,
            validated_count: count,
        });
        assert!(badges.is_empty());
    }
}
