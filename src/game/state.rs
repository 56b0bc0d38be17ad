//! Authoritative per-match state: rosters, ball, scores and lifecycle flag

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Vec2;
use super::physics::{kickoff_spot, FIELD_HEIGHT, FIELD_WIDTH};

/// Number of athletes on each roster
pub const ROSTER_SIZE: usize = 5;

/// Athlete role, only affects base speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Striker,
    Midfielder,
    Defender,
}

/// One of the two teams. Side A attacks the right-hand goal, side B the left-hand one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Unit x-direction this side attacks towards
    pub fn attack_direction(self) -> f32 {
        match self {
            Side::A => 1.0,
            Side::B => -1.0,
        }
    }

    /// Center of the goal this side shoots at
    pub fn target_goal(self) -> Vec2 {
        let x = match self {
            Side::A => FIELD_WIDTH,
            Side::B => 0.0,
        };
        Vec2::new(x, FIELD_HEIGHT / 2.0)
    }
}

/// Kick-off formation for side A as (role, x fraction, y fraction); side B mirrors x
const FORMATION: [(Role, f32, f32); ROSTER_SIZE] = [
    (Role::Striker, 0.2, 0.3),
    (Role::Midfielder, 0.2, 0.5),
    (Role::Striker, 0.2, 0.7),
    (Role::Defender, 0.15, 0.4),
    (Role::Defender, 0.15, 0.6),
];

/// Kick-off position of roster slot `slot` on `side`
pub fn formation_position(side: Side, slot: usize) -> Vec2 {
    let (_, fx, fy) = FORMATION[slot % ROSTER_SIZE];
    let fx = match side {
        Side::A => fx,
        Side::B => 1.0 - fx,
    };
    Vec2::new(FIELD_WIDTH * fx, FIELD_HEIGHT * fy)
}

/// A single player-controlled body on the pitch
#[derive(Debug, Clone, PartialEq)]
pub struct Athlete {
    pub position: Vec2,
    pub velocity: Vec2,
    pub role: Role,
    pub has_ball: bool,
    pub speed: f32,
    pub boost_available: bool,
    pub boost_active: bool,
    /// Ticks of boost remaining
    pub boost_timer: u32,
}

impl Athlete {
    pub fn new(role: Role, position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            role,
            has_ball: false,
            speed: role.base_speed(),
            boost_available: false,
            boost_active: false,
            boost_timer: 0,
        }
    }

    /// Speed after applying an active boost
    pub fn effective_speed(&self) -> f32 {
        if self.boost_active {
            self.speed * super::physics::BOOST_MULTIPLIER
        } else {
            self.speed
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Ball {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }
}

/// Match state (owned by a room, mutated under the room lock)
#[derive(Debug, Clone)]
pub struct MatchState {
    scores: [u32; 2],
    pub ball: Ball,
    teams: [Vec<Athlete>; 2],
    /// Roster index of the athlete each side's movement input is routed to
    controlled: [Option<usize>; 2],
    pub started: bool,
}

impl MatchState {
    /// Fresh match: both rosters in formation and the ball handed to a random side-A athlete
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let teams = [Self::line_up(Side::A), Self::line_up(Side::B)];
        let mut state = Self {
            scores: [0, 0],
            ball: Ball::at(kickoff_spot()),
            teams,
            controlled: [None, None],
            started: false,
        };

        let holder = rng.gen_range(0..ROSTER_SIZE);
        state.ball.position = state.teams[Side::A.index()][holder].position;
        state.controlled[Side::A.index()] = state.nearest_to_ball(Side::A);

        state
    }

    fn line_up(side: Side) -> Vec<Athlete> {
        FORMATION
            .iter()
            .enumerate()
            .map(|(slot, (role, _, _))| Athlete::new(*role, formation_position(side, slot)))
            .collect()
    }

    pub fn score(&self, side: Side) -> u32 {
        self.scores[side.index()]
    }

    pub fn team(&self, side: Side) -> &[Athlete] {
        &self.teams[side.index()]
    }

    pub fn team_mut(&mut self, side: Side) -> &mut [Athlete] {
        &mut self.teams[side.index()]
    }

    pub fn athletes(&self) -> impl Iterator<Item = &Athlete> {
        self.teams.iter().flatten()
    }

    pub fn athletes_mut(&mut self) -> impl Iterator<Item = &mut Athlete> {
        self.teams.iter_mut().flatten()
    }

    pub fn controlled_index(&self, side: Side) -> Option<usize> {
        self.controlled[side.index()]
    }

    pub fn controlled(&self, side: Side) -> Option<&Athlete> {
        self.controlled_index(side)
            .and_then(|i| self.teams[side.index()].get(i))
    }

    pub fn controlled_mut(&mut self, side: Side) -> Option<&mut Athlete> {
        let idx = self.controlled_index(side)?;
        self.teams[side.index()].get_mut(idx)
    }

    /// Nearest athlete on `side` to the ball, first in roster order on ties
    pub fn nearest_to_ball(&self, side: Side) -> Option<usize> {
        nearest_index(self.team(side), self.ball.position, None)
    }

    /// Re-point both sides' input routing at their athlete nearest the ball
    pub fn refresh_controlled(&mut self) {
        for side in Side::BOTH {
            self.controlled[side.index()] = self.nearest_to_ball(side);
        }
    }

    pub fn award_goal(&mut self, side: Side) {
        self.scores[side.index()] += 1;
    }

    /// Recenter the ball and walk every athlete back to the kick-off formation
    pub fn reset_formation(&mut self) {
        self.ball = Ball::at(kickoff_spot());
        for side in Side::BOTH {
            for (slot, athlete) in self.teams[side.index()].iter_mut().enumerate() {
                athlete.position = formation_position(side, slot);
                athlete.velocity = Vec2::ZERO;
                athlete.has_ball = false;
            }
        }
    }

    /// Locate the athlete currently flagged as holding the ball
    pub fn possessor(&self) -> Option<(Side, usize)> {
        Side::BOTH.into_iter().find_map(|side| {
            self.team(side)
                .iter()
                .position(|a| a.has_ball)
                .map(|idx| (side, idx))
        })
    }

    #[cfg(test)]
    pub fn set_controlled(&mut self, side: Side, index: Option<usize>) {
        self.controlled[side.index()] = index;
    }
}

/// Index of the athlete in `team` nearest `point`, skipping `exclude`.
/// Ties keep the earliest roster slot.
pub fn nearest_index(team: &[Athlete], point: Vec2, exclude: Option<usize>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, athlete) in team.iter().enumerate() {
        if Some(idx) == exclude {
            continue;
        }
        let dist = athlete.position.distance(point);
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((idx, dist));
        }
    }
    best.map(|(idx, _)| idx)
}
