//! Routes decoded client messages to the room registry and action resolver

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::actions::Action;
use crate::game::geometry::Vec2;
use crate::game::{LeaveOutcome, RoomError, RoomRegistry, SeatHandle, SeatId};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, Frame, InputType, ServerMsg};

/// Per-connection dispatcher state
pub struct ClientConnection {
    pub id: Uuid,
    handle: SeatHandle,
    registry: Arc<RoomRegistry>,
    limiter: ConnectionRateLimiter,
    /// Room code and seat held by this connection, once created or joined
    seat: Option<(String, SeatId)>,
}

impl ClientConnection {
    pub fn new(registry: Arc<RoomRegistry>, tx: mpsc::Sender<Frame>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            handle: SeatHandle::new(id, tx),
            registry,
            limiter: ConnectionRateLimiter::new(),
            seat: None,
        }
    }

    pub fn seat(&self) -> Option<(&str, SeatId)> {
        self.seat.as_ref().map(|(code, seat)| (code.as_str(), *seat))
    }

    /// Decode and dispatch one text frame. Malformed frames are logged and dropped.
    /// Frames over the inbound rate are dropped too, except `stopMove` and `action` inputs.
    pub fn handle_text(&mut self, text: &str) {
        let msg = match serde_json::from_str::<ClientMsg>(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(conn_id = %self.id, error = %e, "Failed to parse client message");
                return;
            }
        };

        if !self.limiter.check_inbound() && !msg.is_control_input() {
            warn!(conn_id = %self.id, kind = msg.kind(), "Rate limited inbound message");
            return;
        }

        self.handle_msg(msg);
    }

    pub fn handle_msg(&mut self, msg: ClientMsg) {
        match msg {
            ClientMsg::Create { room_code } => self.handle_create(&room_code),
            ClientMsg::Join { room_code } => self.handle_join(&room_code),
            ClientMsg::Input {
                player_id,
                input_type,
                x,
                y,
                action,
            } => self.handle_input(&player_id, input_type, x.zip(y), action),
        }
    }

    fn reply_error(&self, message: impl Into<String>) {
        self.handle.send(&ServerMsg::error(message));
    }

    fn handle_create(&mut self, raw_code: &str) {
        if self.seat.is_some() {
            self.reply_error("Already in a room");
            return;
        }

        match self.registry.create(raw_code, self.handle.clone()) {
            Ok((code, _room)) => self.seat = Some((code, SeatId::Player1)),
            Err(e) => self.reject(raw_code, e),
        }
    }

    fn handle_join(&mut self, raw_code: &str) {
        if self.seat.is_some() {
            self.reply_error("Already in a room");
            return;
        }

        match self.registry.join(raw_code, self.handle.clone()) {
            Ok((code, _room)) => self.seat = Some((code, SeatId::Player2)),
            Err(e) => self.reject(raw_code, e),
        }
    }

    fn reject(&self, raw_code: &str, err: RoomError) {
        info!(conn_id = %self.id, room_code = %raw_code, error = %err, "Room request rejected");
        self.reply_error(err.to_string());
    }

    fn handle_input(
        &self,
        player_id: &str,
        input_type: InputType,
        direction: Option<(f32, f32)>,
        action: Option<Action>,
    ) {
        let Some((code, _)) = self.seat.as_ref() else {
            debug!(conn_id = %self.id, "Input before joining a room, ignoring");
            return;
        };
        let Some(shared) = self.registry.get(code) else {
            return;
        };
        let mut room = shared.lock();

        if !room.state.started {
            return;
        }
        let Some(seat) = SeatId::from_player_id(player_id).filter(|s| room.is_occupied(*s)) else {
            debug!(conn_id = %self.id, player_id, "Input for unknown player, ignoring");
            return;
        };

        match input_type {
            InputType::Move => match direction.map(|(x, y)| Vec2::new(x, y)) {
                Some(dir) if dir.is_finite() => room.set_input(seat, Some(dir)),
                Some(dir) => {
                    debug!(conn_id = %self.id, x = dir.x, y = dir.y, "Non-finite move input, ignoring")
                }
                None => debug!(conn_id = %self.id, "Move input without coordinates, ignoring"),
            },
            InputType::StopMove => room.set_input(seat, None),
            InputType::Action => {
                let Some(action) = action else {
                    room.set_input(seat, None);
                    return;
                };
                match room.apply_action(seat, action) {
                    Ok(outcome) => debug!(
                        room_code = %room.code(),
                        seat = %seat,
                        outcome = ?outcome,
                        holder = ?room.state.possessor(),
                        "Action resolved"
                    ),
                    Err(reason) => {
                        debug!(
                            room_code = %room.code(),
                            seat = %seat,
                            action = ?action,
                            reason = %reason,
                            "Action rejected"
                        );
                        room.send_to(
                            seat,
                            &ServerMsg::ActionRejected {
                                action,
                                reason: reason.code().to_string(),
                            },
                        );
                    }
                }
            }
        }
    }

    /// Release the seat held by this connection, pausing or closing its room
    pub fn disconnect(&mut self) {
        let Some((code, seat)) = self.seat.take() else {
            return;
        };

        match self.registry.leave(&code, seat, self.id) {
            LeaveOutcome::Closed => {
                debug!(conn_id = %self.id, room_code = %code, "Last seat left");
            }
            LeaveOutcome::Vacated { paused } => {
                debug!(conn_id = %self.id, room_code = %code, paused, "Seat vacated");
            }
            LeaveOutcome::NotSeated => {
                warn!(conn_id = %self.id, room_code = %code, "Seat already released");
            }
        }
    }
}
