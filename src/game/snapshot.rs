//! Wire view of a match, broadcast to both seats every tick

use serde::{Deserialize, Serialize};

use super::state::{Athlete, Ball, MatchState, Role, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl From<&Ball> for BallSnapshot {
    fn from(ball: &Ball) -> Self {
        Self {
            x: ball.position.x,
            y: ball.position.y,
            vx: ball.velocity.x,
            vy: ball.velocity.y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub has_ball: bool,
    pub role: Role,
    pub speed: f32,
    pub speed_up_available: bool,
    pub speed_up_active: bool,
    /// Ticks of boost remaining
    pub speed_up_timer: u32,
}

impl From<&Athlete> for AthleteSnapshot {
    fn from(a: &Athlete) -> Self {
        Self {
            x: a.position.x,
            y: a.position.y,
            vx: a.velocity.x,
            vy: a.velocity.y,
            has_ball: a.has_ball,
            role: a.role,
            speed: a.speed,
            speed_up_available: a.boost_available,
            speed_up_active: a.boost_active,
            speed_up_timer: a.boost_timer,
        }
    }
}

/// Full match state as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateSnapshot {
    pub player1_score: u32,
    pub player2_score: u32,
    pub ball: BallSnapshot,
    pub player1_team: Vec<AthleteSnapshot>,
    pub player2_team: Vec<AthleteSnapshot>,
    pub player1_controlled: Option<AthleteSnapshot>,
    pub player2_controlled: Option<AthleteSnapshot>,
    pub game_started: bool,
}

impl From<&MatchState> for GameStateSnapshot {
    fn from(state: &MatchState) -> Self {
        let team = |side: Side| -> Vec<AthleteSnapshot> {
            state.team(side).iter().map(AthleteSnapshot::from).collect()
        };
        let controlled = |side: Side| state.controlled(side).map(AthleteSnapshot::from);

        Self {
            player1_score: state.score(Side::A),
            player2_score: state.score(Side::B),
            ball: BallSnapshot::from(&state.ball),
            player1_team: team(Side::A),
            player2_team: team(Side::B),
            player1_controlled: controlled(Side::A),
            player2_controlled: controlled(Side::B),
            game_started: state.started,
        }
    }
}
