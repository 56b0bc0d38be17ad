//! Pitch constants and per-tick movement physics for athletes and the ball

use super::geometry::{reflect_in_bounds, Vec2};
use super::state::{Athlete, Ball, Role};

/// Pitch width in world units
pub const FIELD_WIDTH: f32 = 800.0;
/// Pitch height in world units
pub const FIELD_HEIGHT: f32 = 600.0;
/// Vertical size of the goal mouth, centered on the half-height line
pub const GOAL_WIDTH: f32 = 80.0;
/// How far in from each end line the ball must travel to count as a goal
pub const GOAL_DEPTH: f32 = 20.0;

pub const ATHLETE_RADIUS: f32 = 12.0;
pub const BALL_RADIUS: f32 = 8.0;

/// Base per-tick speed of an athlete
pub const BASE_SPEED: f32 = 2.0;
/// Strikers run faster than the rest of the roster
pub const STRIKER_SPEED_FACTOR: f32 = 1.15;

/// Velocity retained by a free ball each tick
pub const FRICTION: f32 = 0.98;
/// Velocity retained (and inverted) after a wall bounce
pub const WALL_RESTITUTION: f32 = 0.8;

/// Ball-to-athlete distance below which the ball can be captured
pub const CAPTURE_RADIUS: f32 = ATHLETE_RADIUS + BALL_RADIUS + 8.0;
/// Balls moving at or above this speed cannot be captured
pub const MAX_CAPTURE_SPEED: f32 = 2.0;

/// The dribble target sits this many ticks of motion ahead of the carrier
pub const DRIBBLE_LEAD_TICKS: f32 = 8.0;
/// Fraction of the remaining gap to the dribble target closed per tick
pub const DRIBBLE_PULL: f32 = 0.3;
/// Carried ball farther than this from the athlete gets pulled back in
pub const CARRY_LIMIT: f32 = ATHLETE_RADIUS + BALL_RADIUS + 5.0;
/// Distance the ball is pulled back to once it exceeds the carry limit
pub const CARRY_RADIUS: f32 = ATHLETE_RADIUS + BALL_RADIUS + 3.0;

pub const BOOST_MULTIPLIER: f32 = 2.0;
/// Boost duration in ticks
pub const BOOST_DURATION: u32 = 45;
/// Per-tick chance that an athlete without a boost is granted one
pub const BOOST_GRANT_CHANCE: f64 = 0.001;

/// Goal mouth vertical band (exclusive bounds)
pub fn goal_band() -> (f32, f32) {
    (
        (FIELD_HEIGHT - GOAL_WIDTH) / 2.0,
        (FIELD_HEIGHT + GOAL_WIDTH) / 2.0,
    )
}

/// Center of the pitch, where the ball is placed after a goal
pub fn kickoff_spot() -> Vec2 {
    Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0)
}

impl Role {
    /// Base running speed for this role
    pub fn base_speed(self) -> f32 {
        match self {
            Role::Striker => BASE_SPEED * STRIKER_SPEED_FACTOR,
            Role::Midfielder | Role::Defender => BASE_SPEED,
        }
    }
}

/// Physics system for moving athletes and the ball
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Move an athlete one tick along `direction` (any non-zero length).
    ///
    /// Returns the displacement that was applied before clamping, or `None` when the
    /// direction has zero length and the athlete stays put.
    pub fn move_athlete(athlete: &mut Athlete, direction: Vec2) -> Option<Vec2> {
        let step = direction.normalized()?.scale(athlete.effective_speed());

        athlete.position = athlete
            .position
            .add(step)
            .clamp_to_field(FIELD_WIDTH, FIELD_HEIGHT, ATHLETE_RADIUS);
        athlete.velocity = step;

        Some(step)
    }

    /// Drag the ball along with a moving carrier.
    ///
    /// The ball closes `DRIBBLE_PULL` of the gap to a lead point ahead of the athlete,
    /// and is pulled back onto `CARRY_RADIUS` if it strays past `CARRY_LIMIT`. A dribbled
    /// ball has no velocity of its own.
    pub fn dribble(ball: &mut Ball, carrier: Vec2, step: Vec2) {
        let lead = carrier.add(step.scale(DRIBBLE_LEAD_TICKS));
        let gap = lead.sub(ball.position);
        ball.position = ball.position.add(gap.scale(DRIBBLE_PULL));

        if ball.position.distance(carrier) > CARRY_LIMIT {
            let bearing = carrier.bearing_to(ball.position);
            ball.position = carrier.add(Vec2::from_angle(bearing).scale(CARRY_RADIUS));
        }

        ball.position = ball
            .position
            .clamp_to_field(FIELD_WIDTH, FIELD_HEIGHT, BALL_RADIUS);
        ball.velocity = Vec2::ZERO;
    }

    /// Advance a free ball: integrate, apply friction, bounce off the walls
    pub fn update_free_ball(ball: &mut Ball) {
        let moved = ball.position.add(ball.velocity);
        let slowed = ball.velocity.scale(FRICTION);

        let reflection = reflect_in_bounds(
            moved,
            slowed,
            FIELD_WIDTH,
            FIELD_HEIGHT,
            BALL_RADIUS,
            WALL_RESTITUTION,
        );

        ball.position = reflection.position;
        ball.velocity = reflection.velocity;
    }

    /// Whether the athlete is close enough to the ball to play it
    pub fn within_capture(athlete: &Athlete, ball: &Ball) -> bool {
        athlete.position.distance_sq(ball.position) < CAPTURE_RADIUS * CAPTURE_RADIUS
    }

    /// Whether the ball is slow enough to be captured
    pub fn capturable_speed(ball: &Ball) -> bool {
        ball.velocity.length_sq() < MAX_CAPTURE_SPEED * MAX_CAPTURE_SPEED
    }
}
