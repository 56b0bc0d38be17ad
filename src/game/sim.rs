//! Fixed-step match simulation

use rand::Rng;

use super::geometry::Vec2;
use super::physics::{
    goal_band, PhysicsSystem, BOOST_GRANT_CHANCE, FIELD_WIDTH, GOAL_DEPTH,
};
use super::state::{MatchState, Side};

/// Pending movement direction per side, indexed by `Side::index`
pub type SideInputs = [Option<Vec2>; 2];

/// What happened during a tick that the caller may want to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub goal: Option<Side>,
}

/// Advance the match by one tick. Does nothing until the match has started.
pub fn step<R: Rng + ?Sized>(
    state: &mut MatchState,
    inputs: &SideInputs,
    rng: &mut R,
) -> TickOutcome {
    if !state.started {
        return TickOutcome::default();
    }

    update_boosts(state, rng);

    for side in Side::BOTH {
        for athlete in state.team_mut(side) {
            athlete.velocity = Vec2::ZERO;
        }
        if let Some(direction) = inputs[side.index()] {
            apply_movement(state, side, direction);
        }
    }

    let carried = Side::BOTH
        .into_iter()
        .any(|side| state.controlled(side).is_some_and(|a| a.has_ball));
    if !carried {
        PhysicsSystem::update_free_ball(&mut state.ball);
    }

    resolve_possession(state);
    state.refresh_controlled();

    let goal = detect_goal(state);
    if let Some(scorer) = goal {
        state.award_goal(scorer);
        state.reset_formation();
        state.refresh_controlled();
    }

    TickOutcome { goal }
}

/// Count down active boosts and roll for new ones
fn update_boosts<R: Rng + ?Sized>(state: &mut MatchState, rng: &mut R) {
    for athlete in state.athletes_mut() {
        if athlete.boost_active && athlete.boost_timer > 0 {
            athlete.boost_timer -= 1;
            if athlete.boost_timer == 0 {
                athlete.boost_active = false;
                athlete.boost_available = false;
            }
        }
        if !athlete.boost_available
            && !athlete.boost_active
            && rng.gen_bool(BOOST_GRANT_CHANCE)
        {
            athlete.boost_available = true;
        }
    }
}

/// Move the side's controlled athlete and drag the ball along if it is being carried
fn apply_movement(state: &mut MatchState, side: Side, direction: Vec2) {
    let Some(athlete) = state.controlled_mut(side) else {
        return;
    };
    let Some(step) = PhysicsSystem::move_athlete(athlete, direction) else {
        return;
    };

    if athlete.has_ball {
        let carrier = athlete.position;
        PhysicsSystem::dribble(&mut state.ball, carrier, step);
    }
}

/// Hand the ball to the single nearest athlete in capture range, if it is slow enough
fn resolve_possession(state: &mut MatchState) {
    let ball = state.ball.clone();
    let capturable = PhysicsSystem::capturable_speed(&ball);

    let mut winner: Option<(usize, f32)> = None;
    if capturable {
        for (idx, athlete) in state.athletes().enumerate() {
            if !PhysicsSystem::within_capture(athlete, &ball) {
                continue;
            }
            let dist = athlete.position.distance(ball.position);
            if winner.map_or(true, |(_, best)| dist < best) {
                winner = Some((idx, dist));
            }
        }
    }

    let winner = winner.map(|(idx, _)| idx);
    for (idx, athlete) in state.athletes_mut().enumerate() {
        athlete.has_ball = Some(idx) == winner;
    }
}

/// Side credited with a goal, if the ball is inside either goal mouth
fn detect_goal(state: &MatchState) -> Option<Side> {
    let (low, high) = goal_band();
    let pos = state.ball.position;
    if pos.y <= low || pos.y >= high {
        return None;
    }

    if pos.x < GOAL_DEPTH {
        Some(Side::B)
    } else if pos.x > FIELD_WIDTH - GOAL_DEPTH {
        Some(Side::A)
    } else {
        None
    }
}
