//! Discrete player actions: pass, shoot, steal, speed boost
//!
//! Actions resolve immediately against the current state when the message arrives,
//! rather than waiting for the next tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Vec2;
use super::physics::{PhysicsSystem, ATHLETE_RADIUS, BALL_RADIUS, BOOST_DURATION};
use super::state::{nearest_index, Athlete, MatchState, Side};

pub const PASS_SPEED: f32 = 4.0;
pub const SHOT_SPEED: f32 = 6.0;
pub const STEAL_RANGE: f32 = 30.0;
pub const STEAL_SPEED: f32 = 4.0;
/// Total width of the random angular error applied to shots (radians)
pub const SHOT_JITTER: f32 = 0.3;
/// Distance from the kicker at which a passed or shot ball is placed
pub const KICK_OFFSET: f32 = ATHLETE_RADIUS + BALL_RADIUS + 15.0;
/// Distance from the robbed opponent at which a stolen ball is placed
pub const STEAL_OFFSET: f32 = ATHLETE_RADIUS + BALL_RADIUS + 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Pass,
    Shoot,
    Steal,
    Speedup,
}

/// Successful action result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionOutcome {
    /// Ball released towards a teammate, or straight ahead when there is none
    Passed { target: Option<usize> },
    Shot { angle: f32 },
    /// Ball knocked loose from the opponent at this roster index
    Stole { from: usize },
    Boosted,
}

/// Why an action had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionRejected {
    #[error("no controlled athlete")]
    NoController,
    #[error("athlete does not have the ball")]
    NotInPossession,
    #[error("athlete already has the ball")]
    AlreadyInPossession,
    #[error("no opponent with the ball in range")]
    NoStealTarget,
    #[error("speed boost not available")]
    BoostUnavailable,
}

impl ActionRejected {
    /// Short machine-readable reason sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoController => "no_controller",
            Self::NotInPossession => "not_in_possession",
            Self::AlreadyInPossession => "already_in_possession",
            Self::NoStealTarget => "no_steal_target",
            Self::BoostUnavailable => "boost_unavailable",
        }
    }
}

/// Action system for resolving player commands
pub struct ActionSystem;

impl ActionSystem {
    /// Resolve `action` for `side`'s controlled athlete
    pub fn resolve<R: Rng + ?Sized>(
        state: &mut MatchState,
        side: Side,
        action: Action,
        rng: &mut R,
    ) -> Result<ActionOutcome, ActionRejected> {
        let idx = state
            .controlled_index(side)
            .filter(|&i| i < state.team(side).len())
            .ok_or(ActionRejected::NoController)?;

        match action {
            Action::Pass => Self::pass(state, side, idx),
            Action::Shoot => Self::shoot(state, side, idx, rng),
            Action::Steal => Self::steal(state, side, idx),
            Action::Speedup => Self::speedup(&mut state.team_mut(side)[idx]),
        }
    }

    /// Whether `athlete` is holding the ball, by flag or by proximity
    fn possesses(athlete: &Athlete, state: &MatchState) -> bool {
        athlete.has_ball || PhysicsSystem::within_capture(athlete, &state.ball)
    }

    fn pass(state: &mut MatchState, side: Side, idx: usize) -> Result<ActionOutcome, ActionRejected> {
        let passer = &state.team(side)[idx];
        if !Self::possesses(passer, state) {
            return Err(ActionRejected::NotInPossession);
        }

        let origin = passer.position;
        let target = nearest_index(state.team(side), origin, Some(idx));
        let bearing = match target {
            Some(t) => origin.bearing_to(state.team(side)[t].position),
            None => Vec2::new(side.attack_direction(), 0.0).angle(),
        };

        Self::kick(state, side, idx, bearing, PASS_SPEED);
        Ok(ActionOutcome::Passed { target })
    }

    fn shoot<R: Rng + ?Sized>(
        state: &mut MatchState,
        side: Side,
        idx: usize,
        rng: &mut R,
    ) -> Result<ActionOutcome, ActionRejected> {
        let shooter = &state.team(side)[idx];
        if !Self::possesses(shooter, state) {
            return Err(ActionRejected::NotInPossession);
        }

        let aim = shooter.position.bearing_to(side.target_goal());
        let jitter = (rng.gen::<f32>() - 0.5) * SHOT_JITTER;
        let angle = aim + jitter;

        Self::kick(state, side, idx, angle, SHOT_SPEED);
        Ok(ActionOutcome::Shot { angle })
    }

    fn steal(state: &mut MatchState, side: Side, idx: usize) -> Result<ActionOutcome, ActionRejected> {
        let stealer = &state.team(side)[idx];
        if Self::possesses(stealer, state) {
            return Err(ActionRejected::AlreadyInPossession);
        }
        let from = stealer.position;

        let mut victim: Option<(usize, f32)> = None;
        for (i, opponent) in state.team(side.opponent()).iter().enumerate() {
            if !Self::possesses(opponent, state) {
                continue;
            }
            let dist = from.distance(opponent.position);
            if dist < STEAL_RANGE && victim.map_or(true, |(_, best)| dist < best) {
                victim = Some((i, dist));
            }
        }
        let (victim, _) = victim.ok_or(ActionRejected::NoStealTarget)?;

        let opponent = &mut state.team_mut(side.opponent())[victim];
        let bearing = opponent.position.bearing_to(from);
        let dir = Vec2::from_angle(bearing);
        let origin = opponent.position;
        opponent.has_ball = false;

        state.ball.position = origin.add(dir.scale(STEAL_OFFSET));
        state.ball.velocity = dir.scale(STEAL_SPEED);

        Ok(ActionOutcome::Stole { from: victim })
    }

    fn speedup(athlete: &mut Athlete) -> Result<ActionOutcome, ActionRejected> {
        if !athlete.boost_available || athlete.boost_active {
            return Err(ActionRejected::BoostUnavailable);
        }
        athlete.boost_active = true;
        athlete.boost_available = false;
        athlete.boost_timer = BOOST_DURATION;
        Ok(ActionOutcome::Boosted)
    }

    /// Place the ball just clear of the kicker and launch it along `angle`
    fn kick(state: &mut MatchState, side: Side, idx: usize, angle: f32, speed: f32) {
        let kicker = &mut state.team_mut(side)[idx];
        let dir = Vec2::from_angle(angle);
        let origin = kicker.position;
        kicker.has_ball = false;

        state.ball.position = origin.add(dir.scale(KICK_OFFSET));
        state.ball.velocity = dir.scale(speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::ROSTER_SIZE;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fresh() -> (MatchState, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut state = MatchState::new(&mut rng);
        state.started = true;
        (state, rng)
    }

    /// Park every athlete except the listed ones far away in a corner
    fn clear_pitch(state: &mut MatchState, keep: &[(Side, usize)]) {
        for side in Side::BOTH {
            for i in 0..ROSTER_SIZE {
                if !keep.contains(&(side, i)) {
                    let a = &mut state.team_mut(side)[i];
                    a.position = Vec2::new(20.0 + i as f32 * 30.0, 580.0);
                    a.has_ball = false;
                }
            }
        }
    }

    fn give_ball(state: &mut MatchState, side: Side, idx: usize, at: Vec2) {
        let a = &mut state.team_mut(side)[idx];
        a.position = at;
        a.has_ball = true;
        state.ball.position = at;
        state.ball.velocity = Vec2::ZERO;
        state.set_controlled(side, Some(idx));
    }

    #[test]
    fn test_pass_goes_to_nearest_teammate() {
        let (mut state, mut rng) = fresh();
        clear_pitch(&mut state, &[(Side::A, 0), (Side::A, 1)]);
        give_ball(&mut state, Side::A, 0, Vec2::new(300.0, 300.0));
        state.team_mut(Side::A)[1].position = Vec2::new(330.0, 340.0);

        let outcome = ActionSystem::resolve(&mut state, Side::A, Action::Pass, &mut rng);
        assert_eq!(outcome, Ok(ActionOutcome::Passed { target: Some(1) }));

        let v = state.ball.velocity;
        assert!((v.length() - PASS_SPEED).abs() < 1e-4);
        // collinear with (30, 40): cross product vanishes, same direction
        assert!((v.x * 40.0 - v.y * 30.0).abs() < 1e-3);
        assert!(v.x > 0.0 && v.y > 0.0);
        assert!((state.ball.position.distance(Vec2::new(300.0, 300.0)) - KICK_OFFSET).abs() < 1e-3);
        assert!(!state.team(Side::A)[0].has_ball);
    }

    #[test]
    fn test_pass_requires_ball() {
        let (mut state, mut rng) = fresh();
        clear_pitch(&mut state, &[(Side::A, 0)]);
        state.team_mut(Side::A)[0].position = Vec2::new(300.0, 300.0);
        state.set_controlled(Side::A, Some(0));
        state.ball.position = Vec2::new(500.0, 300.0);

        let before = state.ball.clone();
        let outcome = ActionSystem::resolve(&mut state, Side::A, Action::Pass, &mut rng);
        assert_eq!(outcome, Err(ActionRejected::NotInPossession));
        assert_eq!(state.ball, before);
    }

    #[test]
    fn test_no_controller_rejected() {
        let (mut state, mut rng) = fresh();
        state.set_controlled(Side::B, None);
        let outcome = ActionSystem::resolve(&mut state, Side::B, Action::Shoot, &mut rng);
        assert_eq!(outcome, Err(ActionRejected::NoController));
    }

    #[test]
    fn test_shot_heads_for_goal() {
        let (mut state, _) = fresh();
        clear_pitch(&mut state, &[(Side::B, 2)]);
        give_ball(&mut state, Side::B, 2, Vec2::new(200.0, 300.0));
        // mock source yields 0.5 for every f32 draw, i.e. zero jitter
        let mut rng = StepRng::new(1 << 31, 0);

        let outcome = ActionSystem::resolve(&mut state, Side::B, Action::Shoot, &mut rng);
        assert!(matches!(outcome, Ok(ActionOutcome::Shot { .. })));

        let v = state.ball.velocity;
        assert!((v.length() - SHOT_SPEED).abs() < 1e-4);
        assert!(v.x < 0.0);
        assert!(v.y.abs() < 1e-3);
    }

    #[test]
    fn test_shot_jitter_is_bounded() {
        let (mut state, mut rng) = fresh();
        for _ in 0..50 {
            clear_pitch(&mut state, &[(Side::A, 1)]);
            give_ball(&mut state, Side::A, 1, Vec2::new(400.0, 300.0));
            let Ok(ActionOutcome::Shot { angle }) =
                ActionSystem::resolve(&mut state, Side::A, Action::Shoot, &mut rng)
            else {
                panic!("shot rejected");
            };
            assert!(angle.abs() <= SHOT_JITTER / 2.0 + 1e-6);
        }
    }

    #[test]
    fn test_steal_knocks_ball_loose() {
        let (mut state, mut rng) = fresh();
        clear_pitch(&mut state, &[(Side::A, 3), (Side::B, 0)]);
        give_ball(&mut state, Side::B, 0, Vec2::new(400.0, 300.0));
        state.team_mut(Side::A)[3].position = Vec2::new(380.0, 300.0);
        // stealer is 20 away but the ball is at the opponent's feet, so outside capture
        state.ball.position = Vec2::new(410.0, 300.0);
        state.set_controlled(Side::A, Some(3));

        let outcome = ActionSystem::resolve(&mut state, Side::A, Action::Steal, &mut rng);
        assert_eq!(outcome, Ok(ActionOutcome::Stole { from: 0 }));
        assert!(!state.team(Side::B)[0].has_ball);
        assert!(!state.team(Side::A)[3].has_ball);
        assert!((state.ball.velocity.x + STEAL_SPEED).abs() < 1e-4);
        assert!(state.ball.velocity.y.abs() < 1e-4);
        assert!((state.ball.position.x - (400.0 - STEAL_OFFSET)).abs() < 1e-3);
    }

    #[test]
    fn test_steal_out_of_range() {
        let (mut state, mut rng) = fresh();
        clear_pitch(&mut state, &[(Side::A, 3), (Side::B, 0)]);
        give_ball(&mut state, Side::B, 0, Vec2::new(400.0, 300.0));
        state.team_mut(Side::A)[3].position = Vec2::new(340.0, 300.0);
        state.set_controlled(Side::A, Some(3));

        let outcome = ActionSystem::resolve(&mut state, Side::A, Action::Steal, &mut rng);
        assert_eq!(outcome, Err(ActionRejected::NoStealTarget));
        assert!(state.team(Side::B)[0].has_ball);
    }

    #[test]
    fn test_steal_while_holding_rejected() {
        let (mut state, mut rng) = fresh();
        clear_pitch(&mut state, &[(Side::A, 0)]);
        give_ball(&mut state, Side::A, 0, Vec2::new(400.0, 300.0));
        let outcome = ActionSystem::resolve(&mut state, Side::A, Action::Steal, &mut rng);
        assert_eq!(outcome, Err(ActionRejected::AlreadyInPossession));
    }

    #[test]
    fn test_speedup_consumes_availability() {
        let (mut state, mut rng) = fresh();
        state.set_controlled(Side::A, Some(2));

        let outcome = ActionSystem::resolve(&mut state, Side::A, Action::Speedup, &mut rng);
        assert_eq!(outcome, Err(ActionRejected::BoostUnavailable));

        state.team_mut(Side::A)[2].boost_available = true;
        let outcome = ActionSystem::resolve(&mut state, Side::A, Action::Speedup, &mut rng);
        assert_eq!(outcome, Ok(ActionOutcome::Boosted));

        let a = &state.team(Side::A)[2];
        assert!(a.boost_active);
        assert!(!a.boost_available);
        assert_eq!(a.boost_timer, BOOST_DURATION);

        let again = ActionSystem::resolve(&mut state, Side::A, Action::Speedup, &mut rng);
        assert_eq!(again, Err(ActionRejected::BoostUnavailable));
    }
}
