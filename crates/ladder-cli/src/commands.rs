//! Subcommand handlers

use std::path::Path;

use ladder_engine::{
    most_improved, Award, BracketDecision, BracketMove, BracketTransitionMonitor,
    ChallengeLifecycle, Climber, DemotionResolution, Eligibility, EligibilityContext,
    EligibilityEvaluator, LadderConfig, MatchResolver, PrizeDistribution, PrizePoolAllocator,
};
use serde::Serialize;
use tracing::info;

use crate::input::{
    instant, print_json, read_input, BracketRequest, CompleteRequest, DeclineRequest,
    EvaluateRequest, PrizesRequest, ResolveRequest,
};

pub fn evaluate(config: &LadderConfig, path: &Path) -> anyhow::Result<()> {
    let request: EvaluateRequest = read_input(path)?;
    let context = EligibilityContext::new(&request.roster)
        .with_pending(&request.pending)
        .with_history(&request.history);

    let verdict: Eligibility = EligibilityEvaluator::new(config.ranges.clone()).evaluate(
        request.challenge_type,
        &request.challenger,
        &request.defender,
        &context,
        instant(request.now),
    );
    print_json(&verdict)
}

pub fn resolve(path: &Path) -> anyhow::Result<()> {
    let request: ResolveRequest = read_input(path)?;
    let roster = MatchResolver::resolve(&request.roster, &request.challenge, &request.outcome)?;
    print_json(&roster)
}

pub fn complete(config: &LadderConfig, path: &Path) -> anyhow::Result<()> {
    let request: CompleteRequest = read_input(path)?;
    let outcome = ChallengeLifecycle::new(config.clone()).complete(
        &request.challenge,
        &request.roster,
        &request.challenger,
        &request.defender,
        &request.outcome,
        request.score,
        instant(request.now),
    )?;
    print_json(&outcome)
}

pub fn decline(config: &LadderConfig, path: &Path) -> anyhow::Result<()> {
    let request: DeclineRequest = read_input(path)?;
    let outcome = ChallengeLifecycle::new(config.clone()).decline(
        &request.challenge,
        &request.defender,
        &request.roster,
        instant(request.now),
    )?;
    print_json(&outcome)
}

#[derive(Debug, Serialize)]
struct BracketReport {
    decision: BracketDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    moved: Option<BracketMove>,
}

pub fn bracket(config: &LadderConfig, path: &Path) -> anyhow::Result<()> {
    let request: BracketRequest = read_input(path)?;
    let now = instant(request.now);
    let monitor = BracketTransitionMonitor::new(config);
    let decision = monitor.evaluate(&request.player, request.grace.as_ref(), &request.brackets, now)?;

    let rosters = request.source.as_ref().zip(request.destination.as_ref());
    let moved = match (&decision, rosters, request.choice) {
        (BracketDecision::Promote { .. }, Some((source, destination)), _) => {
            Some(monitor.promote(&request.player, source, destination, &request.brackets)?)
        }
        (BracketDecision::DemotionOffered { .. }, Some((source, destination)), Some(choice)) => {
            match monitor.resolve_demotion(
                choice,
                &request.player,
                source,
                destination,
                &request.brackets,
                now,
            )? {
                DemotionResolution::Moved(moved) => Some(moved),
                DemotionResolution::Stayed => None,
            }
        }
        _ => None,
    };

    print_json(&BracketReport { decision, moved })
}

#[derive(Debug, Serialize)]
struct PrizeReport {
    distribution: PrizeDistribution,
    climber: Option<Climber>,
    awards: Vec<Award>,
}

pub fn prizes(config: &LadderConfig, path: &Path) -> anyhow::Result<()> {
    let request: PrizesRequest = read_input(path)?;
    let allocator = PrizePoolAllocator::new(config.prizes.clone());
    let distribution = allocator.distribute(&request.funding);

    let climber = match (&request.opening, &request.closing) {
        (Some(opening), Some(closing)) => most_improved(opening, closing),
        _ => None,
    };
    if let Some(climber) = &climber {
        info!(
            "Climber {} gained {} places, bonus {}",
            climber.player_id,
            climber.places_gained(),
            distribution.pool.climber_bonus
        );
    }

    let awards = request
        .closing
        .as_ref()
        .map(|standings| PrizePoolAllocator::assign(&distribution, standings))
        .unwrap_or_default();

    print_json(&PrizeReport {
        distribution,
        climber,
        awards,
    })
}
