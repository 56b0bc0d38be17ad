//! Rooms (two-seat sessions keyed by a human-readable code) and the registry that owns them

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ws::protocol::{encode, Frame, ServerMsg};

use super::actions::{Action, ActionOutcome, ActionRejected, ActionSystem};
use super::geometry::Vec2;
use super::sim::{self, SideInputs, TickOutcome};
use super::state::{MatchState, Side};

/// Room lookup / membership errors. Display strings are sent to clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Invalid room code format. Must be two words separated by hyphen (e.g., happy-cat)")]
    InvalidCode,
    #[error("Room not found")]
    NotFound,
    #[error("Room is full")]
    Full,
    #[error("Room already exists")]
    AlreadyExists,
}

/// Normalize a room code (trim + lowercase) and check it is `word-word` in `a-z`
pub fn normalize_room_code(raw: &str) -> Result<String, RoomError> {
    let code = raw.trim().to_lowercase();
    let is_word = |w: &str| !w.is_empty() && w.bytes().all(|b| b.is_ascii_lowercase());

    match code.split_once('-') {
        Some((first, second)) if is_word(first) && is_word(second) => Ok(code),
        _ => Err(RoomError::InvalidCode),
    }
}

/// Seat identifier, also used as the client-facing player id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatId {
    Player1,
    Player2,
}

impl SeatId {
    pub const BOTH: [SeatId; 2] = [SeatId::Player1, SeatId::Player2];

    /// The team this seat controls
    pub fn side(self) -> Side {
        match self {
            SeatId::Player1 => Side::A,
            SeatId::Player2 => Side::B,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeatId::Player1 => "player1",
            SeatId::Player2 => "player2",
        }
    }

    pub fn from_player_id(player_id: &str) -> Option<Self> {
        SeatId::BOTH.into_iter().find(|s| s.as_str() == player_id)
    }

    fn index(self) -> usize {
        self.side().index()
    }
}

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound handle to one connected client
#[derive(Debug, Clone)]
pub struct SeatHandle {
    pub conn_id: Uuid,
    tx: mpsc::Sender<Frame>,
}

impl SeatHandle {
    pub fn new(conn_id: Uuid, tx: mpsc::Sender<Frame>) -> Self {
        Self { conn_id, tx }
    }

    pub fn send(&self, msg: &ServerMsg) {
        if let Some(frame) = encode(msg) {
            self.send_frame(frame);
        }
    }

    /// Queue a pre-encoded frame without waiting. A full queue drops the frame.
    pub fn send_frame(&self, frame: Frame) {
        match self.tx.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.conn_id, "Outbound queue full, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(conn_id = %self.conn_id, "Outbound queue closed");
            }
        }
    }
}

/// One two-seat match
#[derive(Debug)]
pub struct Room {
    code: String,
    seats: [Option<SeatHandle>; 2],
    pending: SideInputs,
    pub state: MatchState,
    rng: ChaCha8Rng,
}

impl Room {
    /// New room with `host` in seat 1 and a freshly initialized match
    pub fn new(code: String, host: SeatHandle, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let state = MatchState::new(&mut rng);
        Self {
            code,
            seats: [Some(host), None],
            pending: [None, None],
            state,
            rng,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn seat(&self, seat: SeatId) -> Option<&SeatHandle> {
        self.seats[seat.index()].as_ref()
    }

    pub fn is_occupied(&self, seat: SeatId) -> bool {
        self.seats[seat.index()].is_some()
    }

    pub fn occupied_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied_count() == 0
    }

    pub fn pending_input(&self, seat: SeatId) -> Option<Vec2> {
        self.pending[seat.index()]
    }

    /// Overwrite (or clear) the seat's pending movement direction
    pub fn set_input(&mut self, seat: SeatId, direction: Option<Vec2>) {
        self.pending[seat.index()] = direction;
    }

    /// Resolve an action for the seat's controlled athlete, then drop its pending movement
    pub fn apply_action(
        &mut self,
        seat: SeatId,
        action: Action,
    ) -> Result<ActionOutcome, ActionRejected> {
        let result = ActionSystem::resolve(&mut self.state, seat.side(), action, &mut self.rng);
        self.pending[seat.index()] = None;
        result
    }

    /// Run one simulation step with the current pending inputs
    pub fn tick(&mut self) -> TickOutcome {
        sim::step(&mut self.state, &self.pending, &mut self.rng)
    }

    pub fn send_to(&self, seat: SeatId, msg: &ServerMsg) {
        if let Some(handle) = self.seat(seat) {
            handle.send(msg);
        }
    }

    /// Encode once and send to every occupied seat
    pub fn broadcast(&self, msg: &ServerMsg) {
        if let Some(frame) = encode(msg) {
            for handle in self.seats.iter().flatten() {
                handle.send_frame(frame.clone());
            }
        }
    }

    /// Empty a seat held by `conn_id`. Returns false if the connection does not hold it.
    fn vacate(&mut self, seat: SeatId, conn_id: Uuid) -> bool {
        let idx = seat.index();
        if self.seats[idx].as_ref().map(|h| h.conn_id) != Some(conn_id) {
            return false;
        }
        self.seats[idx] = None;
        self.pending[idx] = None;
        true
    }
}

pub type SharedRoom = Arc<Mutex<Room>>;

/// Result of a seat leaving its room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The room or the seat was already gone
    NotSeated,
    /// Seat vacated; `paused` is set when the match was stopped as a result
    Vacated { paused: bool },
    /// Last seat left and the room was discarded
    Closed,
}

/// Registry of all live rooms
pub struct RoomRegistry {
    rooms: DashMap<String, SharedRoom>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Create a room under `raw_code` with `host` in seat 1.
    /// `roomCreated` is queued to the host before the room becomes visible to joiners.
    pub fn create(&self, raw_code: &str, host: SeatHandle) -> Result<(String, SharedRoom), RoomError> {
        let code = normalize_room_code(raw_code)?;

        match self.rooms.entry(code.clone()) {
            Entry::Occupied(_) => Err(RoomError::AlreadyExists),
            Entry::Vacant(slot) => {
                let conn_id = host.conn_id;
                host.send(&ServerMsg::RoomCreated {
                    room_code: code.clone(),
                    player_id: SeatId::Player1,
                });
                let room = Arc::new(Mutex::new(Room::new(code.clone(), host, rand::random())));
                slot.insert(room.clone());
                info!(room_code = %code, conn_id = %conn_id, "Room created");
                Ok((code, room))
            }
        }
    }

    /// Seat `guest` in seat 2 of an existing room and start the match.
    /// `roomJoined` and `gameStart` are queued under the room lock, ahead of any `gameState`.
    pub fn join(&self, raw_code: &str, guest: SeatHandle) -> Result<(String, SharedRoom), RoomError> {
        let code = normalize_room_code(raw_code)?;
        let room = self.get(&code).ok_or(RoomError::NotFound)?;

        {
            let mut guard = room.lock();
            // a room emptied by a concurrent leave is about to be removed
            if guard.is_empty() {
                return Err(RoomError::NotFound);
            }
            if guard.is_occupied(SeatId::Player2) {
                return Err(RoomError::Full);
            }
            let conn_id = guest.conn_id;
            guard.seats[SeatId::Player2.index()] = Some(guest);
            guard.send_to(
                SeatId::Player2,
                &ServerMsg::RoomJoined {
                    player_id: SeatId::Player2,
                },
            );
            guard.broadcast(&ServerMsg::GameStart);
            guard.state.started = true;
            info!(room_code = %code, conn_id = %conn_id, "Player joined room, match started");
        }

        Ok((code, room))
    }

    /// Remove `conn_id` from `seat`. Seat 2 leaving pauses the match; an empty room is dropped.
    pub fn leave(&self, code: &str, seat: SeatId, conn_id: Uuid) -> LeaveOutcome {
        let Some(room) = self.get(code) else {
            return LeaveOutcome::NotSeated;
        };

        let (paused, empty) = {
            let mut guard = room.lock();
            if !guard.vacate(seat, conn_id) {
                return LeaveOutcome::NotSeated;
            }
            let paused = seat == SeatId::Player2 && guard.state.started;
            if seat == SeatId::Player2 {
                guard.state.started = false;
            }
            (paused, guard.is_empty())
        };

        info!(room_code = %code, seat = %seat, conn_id = %conn_id, paused, "Player left room");

        if empty {
            self.rooms.remove_if(code, |_, r| Arc::ptr_eq(r, &room));
            info!(room_code = %code, "Room closed");
            LeaveOutcome::Closed
        } else {
            LeaveOutcome::Vacated { paused }
        }
    }

    pub fn get(&self, code: &str) -> Option<SharedRoom> {
        self.rooms.get(code).map(|r| r.value().clone())
    }

    /// Snapshot of every live room, so callers never hold map guards while locking a room
    pub fn rooms(&self) -> Vec<SharedRoom> {
        self.rooms.iter().map(|r| r.value().clone()).collect()
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn connected_players(&self) -> usize {
        self.rooms()
            .iter()
            .map(|room| room.lock().occupied_count())
            .sum()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
